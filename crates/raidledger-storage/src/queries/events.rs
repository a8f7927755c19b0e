// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only quota ledger.
//!
//! Rows are never updated or deleted. At most one `run_completed` row exists
//! per (guild, subject), enforced by the partial unique index
//! `uq_quota_event_run_subject`.

use raidledger_core::RaidledgerError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{LoggedQuotaEvent, NewQuotaEvent, QuotaActionType, QuotaEvent, enum_column, ts_column};

/// Insert a ledger row, ignoring a conflict on the run subject index.
///
/// Returns `None` when a `run_completed` row with the same subject already
/// exists in the guild.
pub async fn insert_event(
    db: &Database,
    event: &NewQuotaEvent,
) -> Result<Option<LoggedQuotaEvent>, RaidledgerError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "INSERT INTO quota_event
                    (guild_id, actor_user_id, action_type, subject_id, dungeon_key,
                     points, quota_points)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (guild_id, subject_id)
                    WHERE action_type = 'run_completed' AND subject_id IS NOT NULL
                 DO NOTHING
                 RETURNING id, points, quota_points",
                params![
                    event.guild_id,
                    event.actor_user_id,
                    event.action_type.to_string(),
                    event.subject_id,
                    event.dungeon_key,
                    event.points,
                    event.quota_points,
                ],
                |row| {
                    Ok(LoggedQuotaEvent {
                        id: row.get(0)?,
                        points: row.get(1)?,
                        quota_points: row.get(2)?,
                    })
                },
            );
            match result {
                Ok(logged) => Ok(Some(logged)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Whether a `run_completed` row exists for the subject.
pub async fn subject_logged(
    db: &Database,
    guild_id: &str,
    subject_id: &str,
) -> Result<bool, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let subject_id = subject_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM quota_event
                    WHERE guild_id = ?1 AND subject_id = ?2 AND action_type = ?3
                 )",
                params![
                    guild_id,
                    subject_id,
                    QuotaActionType::RunCompleted.to_string()
                ],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recent ledger rows for one user, newest first.
pub async fn list_user_events(
    db: &Database,
    guild_id: &str,
    user_id: &str,
    limit: u32,
) -> Result<Vec<QuotaEvent>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, guild_id, actor_user_id, action_type, subject_id, dungeon_key,
                        points, quota_points, created_at
                 FROM quota_event
                 WHERE guild_id = ?1 AND actor_user_id = ?2
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![guild_id, user_id, limit], |row| {
                Ok(QuotaEvent {
                    id: row.get(0)?,
                    guild_id: row.get(1)?,
                    actor_user_id: row.get(2)?,
                    action_type: enum_column(row, 3)?,
                    subject_id: row.get(4)?,
                    dungeon_key: row.get(5)?,
                    points: row.get(6)?,
                    quota_points: row.get(7)?,
                    created_at: ts_column(row, 8)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
