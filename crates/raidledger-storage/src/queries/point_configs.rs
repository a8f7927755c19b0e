// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role-independent raider and key-pop point values per dungeon.

use raidledger_core::RaidledgerError;
use rusqlite::params;

use crate::database::Database;

/// Which per-dungeon point table to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTable {
    /// Points each joined raider earns when a run completes.
    Raider,
    /// Points a raider earns for popping a key.
    KeyPop,
}

impl PointTable {
    fn table(self) -> &'static str {
        match self {
            PointTable::Raider => "raider_points_config",
            PointTable::KeyPop => "key_pop_points_config",
        }
    }
}

/// Configured value for a dungeon, `None` when unset.
pub async fn get_points(
    db: &Database,
    table: PointTable,
    guild_id: &str,
    dungeon_key: &str,
) -> Result<Option<i64>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT points FROM {} WHERE guild_id = ?1 AND dungeon_key = ?2",
                    table.table()
                ),
                params![guild_id, dungeon_key],
                |row| row.get(0),
            );
            match result {
                Ok(points) => Ok(Some(points)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create or replace the value for a dungeon.
pub async fn set_points(
    db: &Database,
    table: PointTable,
    guild_id: &str,
    dungeon_key: &str,
    points: i64,
) -> Result<(), RaidledgerError> {
    let guild_id = guild_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (guild_id, dungeon_key, points) VALUES (?1, ?2, ?3)
                     ON CONFLICT (guild_id, dungeon_key) DO UPDATE SET
                        points = excluded.points,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                    table.table()
                ),
                params![guild_id, dungeon_key, points],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove the value for a dungeon. Returns whether a row existed.
pub async fn delete_points(
    db: &Database,
    table: PointTable,
    guild_id: &str,
    dungeon_key: &str,
) -> Result<bool, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let dungeon_key = dungeon_key.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                &format!(
                    "DELETE FROM {} WHERE guild_id = ?1 AND dungeon_key = ?2",
                    table.table()
                ),
                params![guild_id, dungeon_key],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
