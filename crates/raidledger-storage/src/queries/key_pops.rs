// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-pop counters.

use raidledger_core::{KeyPopRecord, RaidledgerError};
use rusqlite::params;

use crate::database::Database;
use crate::models::NewQuotaEvent;

/// Bump the key-pop counter and append the matching ledger row.
///
/// Both writes happen in one transaction. `event` must carry a dungeon key;
/// its actor is the user whose counter is incremented.
pub async fn record_key_pop(
    db: &Database,
    event: &NewQuotaEvent,
) -> Result<KeyPopRecord, RaidledgerError> {
    let Some(dungeon_key) = event.dungeon_key.clone() else {
        return Err(RaidledgerError::InvalidInput(
            "key pop requires a dungeon key".to_string(),
        ));
    };
    let event = event.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let count: i64 = tx.query_row(
                "INSERT INTO key_pop (guild_id, user_id, dungeon_key, count)
                 VALUES (?1, ?2, ?3, 1)
                 ON CONFLICT (guild_id, user_id, dungeon_key) DO UPDATE SET
                    count = count + 1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 RETURNING count",
                params![event.guild_id, event.actor_user_id, dungeon_key],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO quota_event
                    (guild_id, actor_user_id, action_type, subject_id, dungeon_key,
                     points, quota_points)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.guild_id,
                    event.actor_user_id,
                    event.action_type.to_string(),
                    event.subject_id,
                    dungeon_key,
                    event.points,
                    event.quota_points,
                ],
            )?;
            tx.commit()?;

            Ok(KeyPopRecord {
                user_id: event.actor_user_id,
                dungeon_key,
                count,
                points: event.points,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}
