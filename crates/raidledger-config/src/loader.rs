// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Lookup order: `./raidledger.toml` > `~/.config/raidledger/raidledger.toml`
//! > `/etc/raidledger/raidledger.toml`, with `RAIDLEDGER_*` environment
//! variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RaidledgerConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/raidledger/raidledger.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "raidledger.toml";

/// Per-user config file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("raidledger").join("raidledger.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/raidledger/raidledger.toml`
/// 3. `~/.config/raidledger/raidledger.toml`
/// 4. `./raidledger.toml`
/// 5. `RAIDLEDGER_*` environment variables
pub fn load_config() -> Result<RaidledgerConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string, without files or env vars.
pub fn load_config_from_str(toml_content: &str) -> Result<RaidledgerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RaidledgerConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RaidledgerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RaidledgerConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full hierarchy before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RaidledgerConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Env provider mapping `RAIDLEDGER_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `default_key_pop_points` contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("RAIDLEDGER_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("quota_", "quota.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
