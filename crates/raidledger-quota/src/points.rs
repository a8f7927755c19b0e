// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Point resolution and per-dungeon point configuration.
//!
//! Missing configuration is never an error. Organizer credit falls back to
//! `default_run_points`, raider credit to `default_raider_points`, and key
//! pops to `default_key_pop_points`.

use tracing::{debug, info};

use raidledger_core::DungeonOverrides;
use raidledger_core::types::validate_snowflake;
use raidledger_storage::PointTable;
use raidledger_storage::queries::{overrides, point_configs};

use crate::QuotaError;
use crate::service::{QuotaService, ensure_non_negative, validate_dungeon};

impl QuotaService {
    /// Overrides configured for one role.
    pub async fn dungeon_overrides(
        &self,
        guild_id: &str,
        role_id: &str,
    ) -> Result<DungeonOverrides, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("role_id", role_id)?;
        overrides::list_overrides(&self.db, guild_id, role_id).await
    }

    /// Set the organizer points for a dungeon when run by a member of `role_id`.
    pub async fn set_dungeon_override(
        &self,
        guild_id: &str,
        role_id: &str,
        dungeon_key: &str,
        points: i64,
    ) -> Result<(), QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("role_id", role_id)?;
        validate_dungeon(dungeon_key)?;
        ensure_non_negative("points", points)?;
        overrides::set_override(&self.db, guild_id, role_id, dungeon_key, points).await?;
        info!(guild_id, role_id, dungeon_key, points, "dungeon override set");
        Ok(())
    }

    /// Remove an override so the default applies again.
    ///
    /// Returns whether an override existed.
    pub async fn delete_dungeon_override(
        &self,
        guild_id: &str,
        role_id: &str,
        dungeon_key: &str,
    ) -> Result<bool, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("role_id", role_id)?;
        validate_dungeon(dungeon_key)?;
        let removed = overrides::delete_override(&self.db, guild_id, role_id, dungeon_key).await?;
        info!(guild_id, role_id, dungeon_key, removed, "dungeon override deleted");
        Ok(removed)
    }

    /// Organizer points for completing a run of `dungeon_key`.
    ///
    /// With roles, the highest override among those roles wins. Without
    /// roles (or with an empty list) the highest override for the dungeon
    /// across every role in the guild wins.
    pub async fn points_for_dungeon(
        &self,
        guild_id: &str,
        dungeon_key: &str,
        role_ids: Option<&[String]>,
    ) -> Result<i64, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_dungeon(dungeon_key)?;

        let best = match role_ids {
            Some(roles) if !roles.is_empty() => {
                roles
                    .iter()
                    .try_for_each(|role| validate_snowflake("role_id", role))?;
                overrides::max_override_for_roles(&self.db, guild_id, dungeon_key, roles).await?
            }
            _ => overrides::max_override_any_role(&self.db, guild_id, dungeon_key).await?,
        };
        let points = best.unwrap_or(self.config.default_run_points);
        debug!(guild_id, dungeon_key, points, overridden = best.is_some(), "resolved run points");
        Ok(points)
    }

    /// Points each joined raider earns when a run of `dungeon_key` completes.
    ///
    /// `0` is a valid configured value meaning raider credit is disabled.
    pub async fn raider_points_for_dungeon(
        &self,
        guild_id: &str,
        dungeon_key: &str,
    ) -> Result<i64, QuotaError> {
        self.table_points(PointTable::Raider, guild_id, dungeon_key, self.config.default_raider_points)
            .await
    }

    /// Points a raider earns for popping a key for `dungeon_key`.
    pub async fn key_pop_points_for_dungeon(
        &self,
        guild_id: &str,
        dungeon_key: &str,
    ) -> Result<i64, QuotaError> {
        self.table_points(PointTable::KeyPop, guild_id, dungeon_key, self.config.default_key_pop_points)
            .await
    }

    pub async fn set_raider_points(
        &self,
        guild_id: &str,
        dungeon_key: &str,
        points: i64,
    ) -> Result<(), QuotaError> {
        self.set_table_points(PointTable::Raider, guild_id, dungeon_key, points)
            .await
    }

    pub async fn delete_raider_points(
        &self,
        guild_id: &str,
        dungeon_key: &str,
    ) -> Result<bool, QuotaError> {
        self.delete_table_points(PointTable::Raider, guild_id, dungeon_key)
            .await
    }

    pub async fn set_key_pop_points(
        &self,
        guild_id: &str,
        dungeon_key: &str,
        points: i64,
    ) -> Result<(), QuotaError> {
        self.set_table_points(PointTable::KeyPop, guild_id, dungeon_key, points)
            .await
    }

    pub async fn delete_key_pop_points(
        &self,
        guild_id: &str,
        dungeon_key: &str,
    ) -> Result<bool, QuotaError> {
        self.delete_table_points(PointTable::KeyPop, guild_id, dungeon_key)
            .await
    }

    async fn table_points(
        &self,
        table: PointTable,
        guild_id: &str,
        dungeon_key: &str,
        default: i64,
    ) -> Result<i64, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_dungeon(dungeon_key)?;
        Ok(point_configs::get_points(&self.db, table, guild_id, dungeon_key)
            .await?
            .unwrap_or(default))
    }

    async fn set_table_points(
        &self,
        table: PointTable,
        guild_id: &str,
        dungeon_key: &str,
        points: i64,
    ) -> Result<(), QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_dungeon(dungeon_key)?;
        ensure_non_negative("points", points)?;
        point_configs::set_points(&self.db, table, guild_id, dungeon_key, points).await?;
        info!(guild_id, dungeon_key, points, ?table, "dungeon points set");
        Ok(())
    }

    async fn delete_table_points(
        &self,
        table: PointTable,
        guild_id: &str,
        dungeon_key: &str,
    ) -> Result<bool, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_dungeon(dungeon_key)?;
        let removed = point_configs::delete_points(&self.db, table, guild_id, dungeon_key).await?;
        info!(guild_id, dungeon_key, removed, ?table, "dungeon points cleared");
        Ok(removed)
    }
}
