// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Isolated quota environment backed by a temp SQLite file.

use std::sync::Arc;

use raidledger_config::model::{QuotaConfig, StorageConfig};
use raidledger_core::{
    LoggedQuotaEvent, QuotaActionType, RaidledgerError, ReactionState, Run, StorageAdapter,
};
use raidledger_quota::{QuotaEventInput, QuotaService};
use raidledger_storage::SqliteStorage;
use tracing::debug;

/// Guild every harness helper writes to.
pub const GUILD_ID: &str = "100000000000000001";

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    quota: QuotaConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            quota: QuotaConfig::default(),
        }
    }

    /// Replace the quota defaults wholesale.
    pub fn with_quota_config(mut self, quota: QuotaConfig) -> Self {
        self.quota = quota;
        self
    }

    /// Cap leaderboards at `limit` rows.
    pub fn with_leaderboard_limit(mut self, limit: u32) -> Self {
        self.quota.leaderboard_limit = limit;
        self
    }

    /// Create the temp database, run migrations, and build the service.
    pub async fn build(self) -> Result<TestHarness, RaidledgerError> {
        let temp_dir = tempfile::TempDir::new().map_err(RaidledgerError::storage)?;
        let db_path = temp_dir.path().join("test.db").to_string_lossy().into_owned();

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.clone(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let quota = QuotaService::new(storage.database()?.clone(), self.quota);
        debug!(path = %db_path, "test harness ready");

        Ok(TestHarness {
            storage: Arc::new(storage),
            quota,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A temp database plus a quota service over it. Dropping it deletes the file.
pub struct TestHarness {
    /// Storage adapter (initialized).
    pub storage: Arc<SqliteStorage>,
    /// Quota service sharing the storage connection.
    pub quota: QuotaService,
    /// Path of the temp database file.
    pub db_path: String,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Open a run in [`GUILD_ID`] and join each raider to it, in order.
    pub async fn seed_run(
        &self,
        organizer_id: &str,
        dungeon_key: &str,
        raiders: &[&str],
    ) -> Result<Run, RaidledgerError> {
        let run = self.quota.create_run(GUILD_ID, organizer_id, dungeon_key).await?;
        for raider in raiders {
            self.quota
                .set_reaction(GUILD_ID, run.id, raider, ReactionState::Join, None)
                .await?;
        }
        Ok(run)
    }

    /// Log a `run_completed` organizer credit in [`GUILD_ID`].
    pub async fn seed_completion(
        &self,
        actor_user_id: &str,
        subject_id: &str,
        dungeon_key: &str,
        quota_points: i64,
    ) -> Result<Option<LoggedQuotaEvent>, RaidledgerError> {
        self.quota
            .log_quota_event(
                GUILD_ID,
                QuotaEventInput {
                    actor_user_id: actor_user_id.to_string(),
                    action_type: QuotaActionType::RunCompleted,
                    subject_id: Some(subject_id.to_string()),
                    dungeon_key: Some(dungeon_key.to_string()),
                    quota_points: Some(quota_points),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidledger_core::{HealthStatus, PluginAdapter};

    #[tokio::test]
    async fn builder_creates_working_environment() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert_eq!(
            harness.storage.health_check().await.unwrap(),
            HealthStatus::Healthy
        );
        assert!(std::path::Path::new(&harness.db_path).exists());
    }

    #[tokio::test]
    async fn leaderboard_limit_reaches_service() {
        let harness = TestHarness::builder()
            .with_leaderboard_limit(3)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.quota.config().leaderboard_limit, 3);
    }

    #[tokio::test]
    async fn seed_run_joins_raiders_in_order() {
        let harness = TestHarness::builder().build().await.unwrap();
        let run = harness
            .seed_run("200", "fungal", &["301", "302"])
            .await
            .unwrap();
        let raiders = harness.quota.joined_raiders(GUILD_ID, run.id).await.unwrap();
        assert_eq!(raiders, vec!["301", "302"]);
    }

    #[tokio::test]
    async fn seed_completion_is_idempotent() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert!(
            harness
                .seed_completion("200", "run:1", "fungal", 2)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            harness
                .seed_completion("200", "run:1", "fungal", 2)
                .await
                .unwrap()
                .is_none()
        );
    }
}
