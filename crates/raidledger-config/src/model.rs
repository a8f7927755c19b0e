// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a mistyped key fails
//! at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level raidledger configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RaidledgerConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Point defaults and reporting limits.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// HTTP API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name reported in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "raidledger".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "raidledger.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Point values used when a guild has not configured anything, plus reporting limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Organizer quota points for a completed run with no dungeon override.
    #[serde(default = "default_one")]
    pub default_run_points: i64,

    /// Quota points for a member verification.
    #[serde(default = "default_one")]
    pub default_verify_points: i64,

    /// Raider points for a completed run with no raider config row.
    #[serde(default = "default_one")]
    pub default_raider_points: i64,

    /// Raider points for a key pop with no key-pop config row.
    #[serde(default = "default_key_pop_points")]
    pub default_key_pop_points: i64,

    /// Length of the first period when a role config is created without `reset_at`.
    #[serde(default = "default_period_days")]
    pub default_period_days: u32,

    /// Maximum rows returned by the leaderboard.
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_run_points: default_one(),
            default_verify_points: default_one(),
            default_raider_points: default_one(),
            default_key_pop_points: default_key_pop_points(),
            default_period_days: default_period_days(),
            leaderboard_limit: default_leaderboard_limit(),
        }
    }
}

fn default_one() -> i64 {
    1
}

fn default_key_pop_points() -> i64 {
    5
}

fn default_period_days() -> u32 {
    7
}

fn default_leaderboard_limit() -> u32 {
    50
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Whether `serve` starts the HTTP API.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on every `/v1` route.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    false
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_defaults_match_documented_values() {
        let quota = QuotaConfig::default();
        assert_eq!(quota.default_run_points, 1);
        assert_eq!(quota.default_verify_points, 1);
        assert_eq!(quota.default_raider_points, 1);
        assert_eq!(quota.default_key_pop_points, 5);
        assert_eq!(quota.default_period_days, 7);
        assert_eq!(quota.leaderboard_limit, 50);
    }

    #[test]
    fn partial_quota_section_keeps_other_defaults() {
        let config: RaidledgerConfig = toml::from_str(
            r#"
[quota]
default_key_pop_points = 3
"#,
        )
        .unwrap();
        assert_eq!(config.quota.default_key_pop_points, 3);
        assert_eq!(config.quota.default_run_points, 1);
    }

    #[test]
    fn gateway_disabled_by_default() {
        let gateway = GatewayConfig::default();
        assert!(!gateway.enabled);
        assert!(gateway.bearer_token.is_none());
    }
}
