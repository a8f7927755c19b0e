// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `QuotaService` facade and role configuration.
//!
//! Operations are spread over several modules as `impl QuotaService` blocks:
//! points resolution in [`crate::points`], ledger writes in [`crate::ledger`],
//! aggregation in [`crate::report`], and run bookkeeping in [`crate::runs`].
//! The service holds no state besides the database handle and the quota
//! defaults; every read goes to the store.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use raidledger_config::model::QuotaConfig;
use raidledger_core::types::{validate_dungeon_key, validate_snowflake};
use raidledger_core::{QuotaRoleConfig, QuotaRoleConfigPatch};
use raidledger_storage::Database;
use raidledger_storage::queries::quota_roles;

use crate::QuotaError;
use crate::period::{self, QuotaPeriod};

/// Entry point for every quota operation.
#[derive(Debug, Clone)]
pub struct QuotaService {
    pub(crate) db: Database,
    pub(crate) config: QuotaConfig,
}

impl QuotaService {
    /// Build a service over an opened database.
    pub fn new(db: Database, config: QuotaConfig) -> Self {
        Self { db, config }
    }

    /// The database this service writes to.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Configured defaults.
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Config for a role, `None` if it was never configured.
    pub async fn quota_role_config(
        &self,
        guild_id: &str,
        role_id: &str,
    ) -> Result<Option<QuotaRoleConfig>, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("role_id", role_id)?;
        quota_roles::get_role_config(&self.db, guild_id, role_id).await
    }

    /// Every configured role in a guild.
    pub async fn quota_role_configs(
        &self,
        guild_id: &str,
    ) -> Result<Vec<QuotaRoleConfig>, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        quota_roles::list_role_configs(&self.db, guild_id).await
    }

    /// Create or partially update a role config.
    ///
    /// A first write without `reset_at` schedules the reset
    /// `default_period_days` after its `created_at`.
    pub async fn upsert_quota_role_config(
        &self,
        guild_id: &str,
        role_id: &str,
        patch: QuotaRoleConfigPatch,
    ) -> Result<QuotaRoleConfig, QuotaError> {
        self.upsert_quota_role_config_at(guild_id, role_id, patch, Utc::now())
            .await
    }

    pub(crate) async fn upsert_quota_role_config_at(
        &self,
        guild_id: &str,
        role_id: &str,
        patch: QuotaRoleConfigPatch,
        now: DateTime<Utc>,
    ) -> Result<QuotaRoleConfig, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("role_id", role_id)?;
        if let Some(points) = patch.required_points {
            ensure_non_negative("required_points", points)?;
        }
        if let Some(message_id) = patch.panel_message_id.as_deref() {
            validate_snowflake("panel_message_id", message_id)?;
        }

        let base = patch.created_at.unwrap_or(now);
        let default_reset_at = base + Duration::days(i64::from(self.config.default_period_days));
        let config =
            quota_roles::upsert_role_config(&self.db, guild_id, role_id, &patch, default_reset_at, now)
                .await?;
        info!(
            guild_id,
            role_id,
            required_points = config.required_points,
            reset_at = %config.reset_at,
            "quota role config saved"
        );
        Ok(config)
    }

    /// Current accounting period for a role, `None` if unconfigured.
    pub async fn quota_period(
        &self,
        guild_id: &str,
        role_id: &str,
    ) -> Result<Option<QuotaPeriod>, QuotaError> {
        Ok(self
            .quota_role_config(guild_id, role_id)
            .await?
            .map(|config| period::current_period_now(&config)))
    }
}

pub(crate) fn ensure_non_negative(field: &str, value: i64) -> Result<(), QuotaError> {
    if value < 0 {
        return Err(QuotaError::InvalidInput(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_dungeon(dungeon_key: &str) -> Result<(), QuotaError> {
    validate_dungeon_key(dungeon_key)
}

pub(crate) fn validate_members(member_ids: &[String]) -> Result<(), QuotaError> {
    member_ids
        .iter()
        .try_for_each(|id| validate_snowflake("member id", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    async fn service() -> (QuotaService, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("quota.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (QuotaService::new(db, QuotaConfig::default()), dir)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn first_write_schedules_default_reset() {
        let (svc, _dir) = service().await;
        let config = svc
            .upsert_quota_role_config_at(
                "1",
                "2",
                QuotaRoleConfigPatch {
                    required_points: Some(12),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();
        assert_eq!(config.created_at, t0());
        assert_eq!(config.reset_at, t0() + Duration::days(7));
        assert_eq!(config.required_points, 12);
    }

    #[tokio::test]
    async fn explicit_created_at_anchors_default_reset() {
        let (svc, _dir) = service().await;
        let created = t0() - Duration::days(3);
        let config = svc
            .upsert_quota_role_config_at(
                "1",
                "2",
                QuotaRoleConfigPatch {
                    created_at: Some(created),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();
        assert_eq!(config.reset_at, created + Duration::days(7));
    }

    #[tokio::test]
    async fn negative_requirement_is_rejected() {
        let (svc, _dir) = service().await;
        let err = svc
            .upsert_quota_role_config(
                "1",
                "2",
                QuotaRoleConfigPatch {
                    required_points: Some(-5),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QuotaError::InvalidInput(_)));
        assert!(svc.quota_role_config("1", "2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let (svc, _dir) = service().await;
        assert!(matches!(
            svc.quota_role_config("guild", "2").await.unwrap_err(),
            QuotaError::InvalidInput(_)
        ));
        assert!(matches!(
            svc.quota_role_configs("").await.unwrap_err(),
            QuotaError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn period_of_unconfigured_role_is_none() {
        let (svc, _dir) = service().await;
        assert!(svc.quota_period("1", "2").await.unwrap().is_none());

        svc.upsert_quota_role_config("1", "2", QuotaRoleConfigPatch::default())
            .await
            .unwrap();
        let period = svc.quota_period("1", "2").await.unwrap().unwrap();
        assert!(period.start < period.end);
    }
}
