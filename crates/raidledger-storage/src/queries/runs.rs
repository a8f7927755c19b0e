// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raid runs and raider reactions.

use raidledger_core::RaidledgerError;
use rusqlite::{Row, params};

use crate::database::Database;
use crate::models::{ReactionState, Run, enum_column, opt_ts_column, ts_column};

const COLUMNS: &str = "id, guild_id, organizer_id, dungeon_key, status, created_at, ended_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Run> {
    Ok(Run {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        organizer_id: row.get(2)?,
        dungeon_key: row.get(3)?,
        status: enum_column(row, 4)?,
        created_at: ts_column(row, 5)?,
        ended_at: opt_ts_column(row, 6)?,
    })
}

/// Open a new run.
pub async fn create_run(
    db: &Database,
    guild_id: &str,
    organizer_id: &str,
    dungeon_key: &str,
) -> Result<Run, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let organizer_id = organizer_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO run (guild_id, organizer_id, dungeon_key)
                     VALUES (?1, ?2, ?3)
                     RETURNING {COLUMNS}"
                ),
                params![guild_id, organizer_id, dungeon_key],
                from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a run by id within a guild.
pub async fn get_run(
    db: &Database,
    guild_id: &str,
    run_id: i64,
) -> Result<Option<Run>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM run WHERE id = ?1 AND guild_id = ?2"),
                params![run_id, guild_id],
                from_row,
            );
            match result {
                Ok(run) => Ok(Some(run)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a run ended. An already-ended run keeps its original `ended_at`.
pub async fn end_run(
    db: &Database,
    guild_id: &str,
    run_id: i64,
) -> Result<Option<Run>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE run SET status = 'ended',
                    ended_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND guild_id = ?2 AND status = 'open'",
                params![run_id, guild_id],
            )?;
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM run WHERE id = ?1 AND guild_id = ?2"),
                params![run_id, guild_id],
                from_row,
            );
            match result {
                Ok(run) => Ok(Some(run)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a user's reaction on a run, replacing any previous one.
///
/// `reacted_at` keeps the time of the first reaction so raider order is
/// stable across bench/join toggles. Returns `false` when the run does not
/// exist in the guild.
pub async fn set_reaction(
    db: &Database,
    guild_id: &str,
    run_id: i64,
    user_id: &str,
    state: ReactionState,
    class: Option<&str>,
) -> Result<bool, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let user_id = user_id.to_string();
    let class = class.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "INSERT INTO run_reaction (run_id, user_id, state, class)
                 SELECT id, ?3, ?4, ?5 FROM run WHERE id = ?1 AND guild_id = ?2
                 ON CONFLICT (run_id, user_id) DO UPDATE SET
                    state = excluded.state,
                    class = COALESCE(excluded.class, class),
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![run_id, guild_id, user_id, state.to_string(), class],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Users currently in the `join` state, in order of first reaction.
pub async fn joined_raiders(
    db: &Database,
    guild_id: &str,
    run_id: i64,
) -> Result<Vec<String>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT rr.user_id
                 FROM run_reaction rr
                 JOIN run r ON r.id = rr.run_id
                 WHERE rr.run_id = ?1 AND r.guild_id = ?2 AND rr.state = 'join'
                 ORDER BY rr.reacted_at ASC, rr.rowid ASC",
            )?;
            let rows = stmt.query_map(params![run_id, guild_id], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
