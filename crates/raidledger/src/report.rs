// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: `migrate`, `stats`, `leaderboard`, `period`.
//!
//! Each opens storage, prints a JSON document on stdout, and closes storage.

use chrono::{DateTime, Utc};
use serde::Serialize;

use raidledger_config::RaidledgerConfig;
use raidledger_core::{HealthStatus, LeaderboardEntry, PluginAdapter, RaidledgerError, StorageAdapter};

/// Output of `raidledger migrate`.
#[derive(Debug, Serialize)]
struct MigrateReport {
    database_path: String,
    status: String,
}

/// Output of `raidledger leaderboard`.
#[derive(Debug, Serialize)]
struct LeaderboardReport {
    guild_id: String,
    role_id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    entries: Vec<LeaderboardEntry>,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RaidledgerError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| RaidledgerError::Internal(format!("failed to encode output: {e}")))?;
    println!("{out}");
    Ok(())
}

fn role_not_configured(role_id: &str) -> RaidledgerError {
    RaidledgerError::NotFound {
        kind: "quota role",
        id: role_id.to_string(),
    }
}

/// Runs the `raidledger migrate` command.
pub async fn run_migrate(config: &RaidledgerConfig) -> Result<(), RaidledgerError> {
    let (storage, _quota) = crate::open_service(config).await?;
    let status = match storage.health_check().await? {
        HealthStatus::Healthy => "ok".to_string(),
        HealthStatus::Degraded(reason) => format!("degraded: {reason}"),
        HealthStatus::Unhealthy(reason) => format!("unhealthy: {reason}"),
    };
    storage.close().await?;
    print_json(&MigrateReport {
        database_path: config.storage.database_path.clone(),
        status,
    })
}

/// Runs the `raidledger stats` command.
pub async fn run_stats(
    config: &RaidledgerConfig,
    guild_id: &str,
    user_id: &str,
) -> Result<(), RaidledgerError> {
    let (storage, quota) = crate::open_service(config).await?;
    let stats = quota.user_quota_stats(guild_id, user_id).await;
    storage.close().await?;
    print_json(&stats?)
}

/// Runs the `raidledger leaderboard` command over the role's current period.
pub async fn run_leaderboard(
    config: &RaidledgerConfig,
    guild_id: &str,
    role_id: &str,
    member_ids: &[String],
) -> Result<(), RaidledgerError> {
    let (storage, quota) = crate::open_service(config).await?;
    let result = async {
        let period = quota
            .quota_period(guild_id, role_id)
            .await?
            .ok_or_else(|| role_not_configured(role_id))?;
        let entries = quota
            .quota_leaderboard(guild_id, role_id, member_ids, period.start, period.end)
            .await?;
        Ok::<_, RaidledgerError>(LeaderboardReport {
            guild_id: guild_id.to_string(),
            role_id: role_id.to_string(),
            start: period.start,
            end: period.end,
            entries,
        })
    }
    .await;
    storage.close().await?;
    print_json(&result?)
}

/// Runs the `raidledger period` command.
pub async fn run_period(
    config: &RaidledgerConfig,
    guild_id: &str,
    role_id: &str,
) -> Result<(), RaidledgerError> {
    let (storage, quota) = crate::open_service(config).await?;
    let period = quota.quota_period(guild_id, role_id).await;
    storage.close().await?;
    print_json(&period?.ok_or_else(|| role_not_configured(role_id))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidledger_config::model::StorageConfig;

    fn config_in(dir: &tempfile::TempDir) -> RaidledgerConfig {
        RaidledgerConfig {
            storage: StorageConfig {
                database_path: dir.path().join("cli.db").to_string_lossy().into_owned(),
                wal_mode: true,
            },
            ..RaidledgerConfig::default()
        }
    }

    #[tokio::test]
    async fn migrate_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        run_migrate(&config).await.unwrap();
        assert!(dir.path().join("cli.db").exists());
    }

    #[tokio::test]
    async fn period_of_unconfigured_role_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let err = run_period(&config, "1", "50").await.unwrap_err();
        assert!(matches!(err, RaidledgerError::NotFound { kind: "quota role", .. }));
        let err = run_leaderboard(&config, "1", "50", &["100".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RaidledgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn stats_reject_bad_ids() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        assert!(matches!(
            run_stats(&config, "1", "bob").await.unwrap_err(),
            RaidledgerError::InvalidInput(_)
        ));
        run_stats(&config, "1", "100").await.unwrap();
    }
}
