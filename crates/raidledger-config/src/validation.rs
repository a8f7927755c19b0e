// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::RaidledgerConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration, collecting every failure.
pub fn validate_config(config: &RaidledgerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.service.log_level
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let quota = &config.quota;
    for (key, value) in [
        ("default_run_points", quota.default_run_points),
        ("default_verify_points", quota.default_verify_points),
        ("default_raider_points", quota.default_raider_points),
        ("default_key_pop_points", quota.default_key_pop_points),
    ] {
        if value < 0 {
            fail(format!("quota.{key} must be non-negative, got {value}"));
        }
    }

    if quota.default_period_days == 0 {
        fail("quota.default_period_days must be at least 1".to_string());
    }

    if !(1..=500).contains(&quota.leaderboard_limit) {
        fail(format!(
            "quota.leaderboard_limit must be between 1 and 500, got {}",
            quota.leaderboard_limit
        ));
    }

    let host = config.gateway.host.trim();
    let host_ok = host.parse::<std::net::IpAddr>().is_ok()
        || (!host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'));
    if !host_ok {
        fail(format!(
            "gateway.host `{host}` is not a valid IP address or hostname"
        ));
    }

    if config.gateway.enabled
        && config
            .gateway
            .bearer_token
            .as_deref()
            .is_none_or(|t| t.trim().is_empty())
    {
        fail("gateway.bearer_token is required when gateway.enabled = true".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&RaidledgerConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails() {
        let mut config = RaidledgerConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn negative_defaults_fail() {
        let mut config = RaidledgerConfig::default();
        config.quota.default_key_pop_points = -1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "default_key_pop_points"));
    }

    #[test]
    fn zero_raider_default_is_allowed() {
        let mut config = RaidledgerConfig::default();
        config.quota.default_raider_points = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn leaderboard_limit_bounds() {
        let mut config = RaidledgerConfig::default();
        config.quota.leaderboard_limit = 0;
        assert!(has_message(
            &validate_config(&config).unwrap_err(),
            "leaderboard_limit"
        ));
        config.quota.leaderboard_limit = 501;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn enabled_gateway_requires_token() {
        let mut config = RaidledgerConfig::default();
        config.gateway.enabled = true;
        assert!(has_message(
            &validate_config(&config).unwrap_err(),
            "bearer_token"
        ));
        config.gateway.bearer_token = Some("s3cret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = RaidledgerConfig::default();
        config.service.log_level = "loud".to_string();
        config.quota.default_period_days = 0;
        config.gateway.host = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
