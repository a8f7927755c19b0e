// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-role dungeon point overrides for organizer credit.

use raidledger_core::{DungeonOverrides, RaidledgerError};
use rusqlite::params;

use crate::database::Database;

/// All overrides configured for one role, keyed by dungeon.
pub async fn list_overrides(
    db: &Database,
    guild_id: &str,
    role_id: &str,
) -> Result<DungeonOverrides, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let role_id = role_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT dungeon_key, points FROM quota_dungeon_override
                 WHERE guild_id = ?1 AND role_id = ?2",
            )?;
            let rows = stmt.query_map(params![guild_id, role_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create or replace an override.
pub async fn set_override(
    db: &Database,
    guild_id: &str,
    role_id: &str,
    dungeon_key: &str,
    points: i64,
) -> Result<(), RaidledgerError> {
    let guild_id = guild_id.to_string();
    let role_id = role_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO quota_dungeon_override (guild_id, role_id, dungeon_key, points)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (guild_id, role_id, dungeon_key) DO UPDATE SET
                    points = excluded.points,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![guild_id, role_id, dungeon_key, points],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove an override. Returns whether a row existed.
pub async fn delete_override(
    db: &Database,
    guild_id: &str,
    role_id: &str,
    dungeon_key: &str,
) -> Result<bool, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let role_id = role_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "DELETE FROM quota_dungeon_override
                 WHERE guild_id = ?1 AND role_id = ?2 AND dungeon_key = ?3",
                params![guild_id, role_id, dungeon_key],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Highest override for a dungeon across every role in the guild.
pub async fn max_override_any_role(
    db: &Database,
    guild_id: &str,
    dungeon_key: &str,
) -> Result<Option<i64>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT MAX(points) FROM quota_dungeon_override
                 WHERE guild_id = ?1 AND dungeon_key = ?2",
                params![guild_id, dungeon_key],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Highest override for a dungeon among the given roles.
///
/// An empty role list matches nothing.
pub async fn max_override_for_roles(
    db: &Database,
    guild_id: &str,
    dungeon_key: &str,
    role_ids: &[String],
) -> Result<Option<i64>, RaidledgerError> {
    if role_ids.is_empty() {
        return Ok(None);
    }
    let guild_id = guild_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    let roles = serde_json::to_string(role_ids)
        .map_err(|e| RaidledgerError::Internal(format!("encode role list: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT MAX(points) FROM quota_dungeon_override
                 WHERE guild_id = ?1 AND dungeon_key = ?2
                   AND role_id IN (SELECT value FROM json_each(?3))",
                params![guild_id, dungeon_key, roles],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn set_replaces_existing_value() {
        let (db, _dir) = setup_db().await;
        set_override(&db, "1", "10", "fungal", 3).await.unwrap();
        set_override(&db, "1", "10", "fungal", 4).await.unwrap();
        set_override(&db, "1", "10", "shatters", 2).await.unwrap();

        let overrides = list_overrides(&db, "1", "10").await.unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides["fungal"], 4);
        assert_eq!(overrides["shatters"], 2);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let (db, _dir) = setup_db().await;
        set_override(&db, "1", "10", "fungal", 3).await.unwrap();
        assert!(delete_override(&db, "1", "10", "fungal").await.unwrap());
        assert!(!delete_override(&db, "1", "10", "fungal").await.unwrap());
        assert!(list_overrides(&db, "1", "10").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn max_over_all_roles_and_subset() {
        let (db, _dir) = setup_db().await;
        set_override(&db, "1", "10", "fungal", 3).await.unwrap();
        set_override(&db, "1", "20", "fungal", 5).await.unwrap();
        set_override(&db, "1", "30", "fungal", 8).await.unwrap();
        set_override(&db, "2", "40", "fungal", 99).await.unwrap();

        assert_eq!(
            max_override_any_role(&db, "1", "fungal").await.unwrap(),
            Some(8)
        );
        let roles = vec!["10".to_string(), "20".to_string()];
        assert_eq!(
            max_override_for_roles(&db, "1", "fungal", &roles).await.unwrap(),
            Some(5)
        );
        let unrelated = vec!["77".to_string()];
        assert_eq!(
            max_override_for_roles(&db, "1", "fungal", &unrelated)
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            max_override_any_role(&db, "1", "shatters").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn negative_points_violate_check() {
        let (db, _dir) = setup_db().await;
        let err = set_override(&db, "1", "10", "fungal", -1).await.unwrap_err();
        assert!(matches!(err, RaidledgerError::Storage { .. }));
    }
}
