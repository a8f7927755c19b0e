// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-(guild, role) quota configuration.

use chrono::{DateTime, Utc};
use raidledger_core::types::QuotaRoleConfigPatch;
use raidledger_core::{RaidledgerError, format_timestamp};
use rusqlite::{Row, params};

use crate::database::Database;
use crate::models::{QuotaRoleConfig, ts_column};

const COLUMNS: &str = "guild_id, role_id, required_points, reset_at, created_at, panel_message_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<QuotaRoleConfig> {
    Ok(QuotaRoleConfig {
        guild_id: row.get(0)?,
        role_id: row.get(1)?,
        required_points: row.get(2)?,
        reset_at: ts_column(row, 3)?,
        created_at: ts_column(row, 4)?,
        panel_message_id: row.get(5)?,
    })
}

/// Get the config for a role, if one was ever written.
pub async fn get_role_config(
    db: &Database,
    guild_id: &str,
    role_id: &str,
) -> Result<Option<QuotaRoleConfig>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let role_id = role_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM quota_role_config WHERE guild_id = ?1 AND role_id = ?2"
                ),
                params![guild_id, role_id],
                from_row,
            );
            match result {
                Ok(config) => Ok(Some(config)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List every role config in a guild, ordered by role id.
pub async fn list_role_configs(
    db: &Database,
    guild_id: &str,
) -> Result<Vec<QuotaRoleConfig>, RaidledgerError> {
    let guild_id = guild_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM quota_role_config WHERE guild_id = ?1 ORDER BY role_id"
            ))?;
            let rows = stmt.query_map(params![guild_id], from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or partially update a role config and return the stored row.
///
/// Only the `Some` fields of `patch` are written on update. On first insert,
/// missing fields fall back to `required_points = 0`, `created_at = now`, and
/// `reset_at = default_reset_at`.
pub async fn upsert_role_config(
    db: &Database,
    guild_id: &str,
    role_id: &str,
    patch: &QuotaRoleConfigPatch,
    default_reset_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<QuotaRoleConfig, RaidledgerError> {
    let guild_id = guild_id.to_string();
    let role_id = role_id.to_string();
    let required_points = patch.required_points;
    let reset_at = patch.reset_at.as_ref().map(format_timestamp);
    let created_at = patch.created_at.as_ref().map(format_timestamp);
    let panel_message_id = patch.panel_message_id.clone();
    let default_reset_at = format_timestamp(&default_reset_at);
    let now = format_timestamp(&now);

    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO quota_role_config
                        (guild_id, role_id, required_points, reset_at, created_at,
                         panel_message_id, updated_at)
                     VALUES (?1, ?2, COALESCE(?3, 0), COALESCE(?4, ?7), COALESCE(?5, ?8), ?6, ?8)
                     ON CONFLICT (guild_id, role_id) DO UPDATE SET
                        required_points = COALESCE(?3, required_points),
                        reset_at = COALESCE(?4, reset_at),
                        created_at = COALESCE(?5, created_at),
                        panel_message_id = COALESCE(?6, panel_message_id),
                        updated_at = ?8
                     RETURNING {COLUMNS}"
                ),
                params![
                    guild_id,
                    role_id,
                    required_points,
                    reset_at,
                    created_at,
                    panel_message_id,
                    default_reset_at,
                    now,
                ],
                from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
