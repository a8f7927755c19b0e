// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregations over the quota ledger and key-pop counters.

use chrono::{DateTime, Utc};
use raidledger_core::{RaidledgerError, format_window_bound};
use rusqlite::params;

use crate::database::Database;
use crate::models::{DungeonBreakdown, LeaderboardEntry, UserQuotaStats};

/// All-time totals and per-dungeon breakdown for one user.
pub async fn user_totals(
    db: &Database,
    guild_id: &str,
    user_id: &str,
) -> Result<UserQuotaStats, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let (total_points, total_quota_points, total_runs_organized, total_verifications) =
                conn.query_row(
                    "SELECT COALESCE(SUM(points), 0),
                            COALESCE(SUM(quota_points), 0),
                            COUNT(CASE WHEN action_type = 'run_completed'
                                        AND quota_points > 0 THEN 1 END),
                            COUNT(CASE WHEN action_type = 'verify_member' THEN 1 END)
                     FROM quota_event
                     WHERE guild_id = ?1 AND actor_user_id = ?2",
                    params![guild_id, user_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                )?;

            let total_keys_popped: i64 = conn.query_row(
                "SELECT COALESCE(SUM(count), 0) FROM key_pop
                 WHERE guild_id = ?1 AND user_id = ?2",
                params![guild_id, user_id],
                |row| row.get(0),
            )?;

            // Full outer join of ledger and key-pop rows on dungeon key.
            let mut stmt = conn.prepare(
                "WITH ledger AS (
                    SELECT dungeon_key,
                           SUM(CASE WHEN action_type = 'run_completed'
                                     AND points > 0 THEN 1 ELSE 0 END) AS completed,
                           SUM(CASE WHEN action_type = 'run_completed'
                                     AND quota_points > 0 THEN 1 ELSE 0 END) AS organized
                    FROM quota_event
                    WHERE guild_id = ?1 AND actor_user_id = ?2 AND dungeon_key IS NOT NULL
                    GROUP BY dungeon_key
                 ),
                 pops AS (
                    SELECT dungeon_key, SUM(count) AS keys_popped
                    FROM key_pop
                    WHERE guild_id = ?1 AND user_id = ?2
                    GROUP BY dungeon_key
                 ),
                 dungeons AS (
                    SELECT dungeon_key FROM ledger
                    UNION
                    SELECT dungeon_key FROM pops
                 ),
                 merged AS (
                    SELECT d.dungeon_key,
                           COALESCE(l.completed, 0) AS completed,
                           COALESCE(l.organized, 0) AS organized,
                           COALESCE(p.keys_popped, 0) AS keys_popped
                    FROM dungeons d
                    LEFT JOIN ledger l ON l.dungeon_key = d.dungeon_key
                    LEFT JOIN pops p ON p.dungeon_key = d.dungeon_key
                 )
                 SELECT dungeon_key, completed, organized, keys_popped
                 FROM merged
                 WHERE completed + organized + keys_popped > 0
                 ORDER BY completed + organized + keys_popped DESC, dungeon_key ASC",
            )?;
            let dungeons = stmt
                .query_map(params![guild_id, user_id], |row| {
                    Ok(DungeonBreakdown {
                        dungeon_key: row.get(0)?,
                        completed: row.get(1)?,
                        organized: row.get(2)?,
                        keys_popped: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(UserQuotaStats {
                total_points,
                total_quota_points,
                total_runs_organized,
                total_verifications,
                total_keys_popped,
                dungeons,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Per-member `SUM(quota_points)` and `run_completed` count in `[start, end)`.
///
/// Only members with at least one row in the window are returned, ordered by
/// points, then runs, then user id. `limit = None` returns every row.
pub async fn window_totals(
    db: &Database,
    guild_id: &str,
    member_ids: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: Option<u32>,
) -> Result<Vec<LeaderboardEntry>, RaidledgerError> {
    if member_ids.is_empty() {
        return Ok(Vec::new());
    }
    let guild_id = guild_id.to_string();
    let members = serde_json::to_string(member_ids)
        .map_err(|e| RaidledgerError::Internal(format!("encode member list: {e}")))?;
    let start = format_window_bound(&start);
    let end = format_window_bound(&end);
    let limit = limit.map_or(-1, i64::from);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT actor_user_id,
                        COALESCE(SUM(quota_points), 0) AS window_points,
                        COUNT(CASE WHEN action_type = 'run_completed' THEN 1 END) AS window_runs
                 FROM quota_event
                 WHERE guild_id = ?1
                   AND created_at >= ?2 AND created_at < ?3
                   AND actor_user_id IN (SELECT value FROM json_each(?4))
                 GROUP BY actor_user_id
                 ORDER BY window_points DESC, window_runs DESC, actor_user_id ASC
                 LIMIT ?5",
            )?;
            let rows = stmt.query_map(params![guild_id, start, end, members, limit], |row| {
                Ok(LeaderboardEntry {
                    user_id: row.get(0)?,
                    points: row.get(1)?,
                    runs: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of ledger rows the members have ever produced in the guild.
pub async fn all_time_event_count(
    db: &Database,
    guild_id: &str,
    member_ids: &[String],
) -> Result<i64, RaidledgerError> {
    if member_ids.is_empty() {
        return Ok(0);
    }
    let guild_id = guild_id.to_string();
    let members = serde_json::to_string(member_ids)
        .map_err(|e| RaidledgerError::Internal(format!("encode member list: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM quota_event
                 WHERE guild_id = ?1
                   AND actor_user_id IN (SELECT value FROM json_each(?2))",
                params![guild_id, members],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewQuotaEvent, QuotaActionType};
    use crate::queries::events::{insert_event, list_user_events};
    use crate::queries::key_pops::record_key_pop;
    use chrono::{Duration, TimeZone};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn log(
        db: &Database,
        actor: &str,
        action_type: QuotaActionType,
        dungeon: Option<&str>,
        points: i64,
        quota_points: i64,
    ) {
        insert_event(
            db,
            &NewQuotaEvent {
                guild_id: "1".into(),
                actor_user_id: actor.into(),
                action_type,
                subject_id: None,
                dungeon_key: dungeon.map(str::to_string),
                points,
                quota_points,
            },
        )
        .await
        .unwrap()
        .unwrap();
    }

    fn key_pop(actor: &str, dungeon: &str) -> NewQuotaEvent {
        NewQuotaEvent {
            guild_id: "1".into(),
            actor_user_id: actor.into(),
            action_type: QuotaActionType::KeyPop,
            subject_id: None,
            dungeon_key: Some(dungeon.into()),
            points: 0,
            quota_points: 0,
        }
    }

    fn members(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn totals_for_idle_user_are_zero() {
        let (db, _dir) = setup_db().await;
        let stats = user_totals(&db, "1", "100").await.unwrap();
        assert_eq!(stats, UserQuotaStats::default());
    }

    #[tokio::test]
    async fn breakdown_merges_ledger_and_key_pops() {
        let (db, _dir) = setup_db().await;
        log(&db, "100", QuotaActionType::RunCompleted, Some("fungal"), 0, 3).await;
        log(&db, "100", QuotaActionType::RunCompleted, Some("fungal"), 1, 0).await;
        log(&db, "100", QuotaActionType::RunCompleted, Some("nest"), 1, 0).await;
        log(&db, "100", QuotaActionType::VerifyMember, None, 0, 1).await;
        // Zero-valued row contributes to no metric.
        log(&db, "100", QuotaActionType::RunCompleted, Some("lab"), 0, 0).await;
        for dungeon in ["shatters", "shatters", "nest"] {
            record_key_pop(&db, &key_pop("100", dungeon)).await.unwrap();
        }

        let stats = user_totals(&db, "1", "100").await.unwrap();
        assert_eq!(stats.total_points, 2);
        assert_eq!(stats.total_quota_points, 4);
        assert_eq!(stats.total_runs_organized, 1);
        assert_eq!(stats.total_verifications, 1);
        assert_eq!(stats.total_keys_popped, 3);

        let keys: Vec<(&str, i64)> = stats
            .dungeons
            .iter()
            .map(|d| (d.dungeon_key.as_str(), d.total_activity()))
            .collect();
        assert_eq!(keys, vec![("fungal", 2), ("nest", 2), ("shatters", 2)]);

        let shatters = &stats.dungeons[2];
        assert_eq!(shatters.completed, 0);
        assert_eq!(shatters.organized, 0);
        assert_eq!(shatters.keys_popped, 2);
    }

    #[tokio::test]
    async fn window_is_half_open_and_member_scoped() {
        let (db, _dir) = setup_db().await;
        log(&db, "100", QuotaActionType::RunCompleted, Some("fungal"), 0, 2).await;
        log(&db, "200", QuotaActionType::RunCompleted, Some("fungal"), 0, 9).await;

        let now = Utc::now();
        let start = now - Duration::hours(1);
        let end = now + Duration::hours(1);

        let rows = window_totals(&db, "1", &members(&["100"]), start, end, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "100");
        assert_eq!(rows[0].points, 2);

        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let empty = window_totals(&db, "1", &members(&["100"]), past, start, None)
            .await
            .unwrap();
        assert!(empty.is_empty());

        assert_eq!(
            all_time_event_count(&db, "1", &members(&["100", "200"]))
                .await
                .unwrap(),
            2
        );
        assert_eq!(all_time_event_count(&db, "1", &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sub_millisecond_bounds_keep_rows_inside_window() {
        let (db, _dir) = setup_db().await;
        log(&db, "100", QuotaActionType::RunCompleted, Some("fungal"), 0, 2).await;
        let created_at = list_user_events(&db, "1", "100", 1).await.unwrap()[0].created_at;
        let ids = members(&["100"]);

        let end = created_at + Duration::microseconds(500);
        let rows = window_totals(&db, "1", &ids, created_at - Duration::hours(1), end, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        // The row is earlier than a start half a millisecond after it.
        let rows = window_totals(&db, "1", &ids, end, end + Duration::hours(1), None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn window_ordering_and_limit() {
        let (db, _dir) = setup_db().await;
        for _ in 0..2 {
            log(&db, "100", QuotaActionType::RunCompleted, Some("fungal"), 0, 5).await;
        }
        for _ in 0..5 {
            log(&db, "200", QuotaActionType::RunCompleted, Some("fungal"), 0, 2).await;
        }
        log(&db, "300", QuotaActionType::VerifyMember, None, 0, 10).await;

        let now = Utc::now();
        let ids = members(&["100", "200", "300"]);
        let rows = window_totals(
            &db,
            "1",
            &ids,
            now - Duration::hours(1),
            now + Duration::hours(1),
            None,
        )
        .await
        .unwrap();
        let order: Vec<(&str, i64, i64)> = rows
            .iter()
            .map(|r| (r.user_id.as_str(), r.points, r.runs))
            .collect();
        assert_eq!(
            order,
            vec![("200", 10, 5), ("100", 10, 2), ("300", 10, 0)]
        );

        let capped = window_totals(
            &db,
            "1",
            &ids,
            now - Duration::hours(1),
            now + Duration::hours(1),
            Some(1),
        )
        .await
        .unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].user_id, "200");
    }
}
