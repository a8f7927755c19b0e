// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across storage, quota logic, and the gateway.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::RaidledgerError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Kind of point-earning action recorded in the quota ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuotaActionType {
    /// A run finished. Organizer rows carry `quota_points`, raider rows carry `points`.
    RunCompleted,
    /// A staff member verified a new guild member.
    VerifyMember,
    /// A raider popped a key for a run.
    KeyPop,
}

/// Lifecycle state of a raid run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Open,
    Ended,
}

/// A raider's current reaction on a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReactionState {
    Join,
    Bench,
    Leave,
}

/// Per-(guild, role) quota configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRoleConfig {
    pub guild_id: String,
    pub role_id: String,
    /// Points a role member must earn within the period.
    pub required_points: i64,
    /// End of the current period while in the future; start of the open period once passed.
    pub reset_at: DateTime<Utc>,
    /// When the current configuration took effect.
    pub created_at: DateTime<Utc>,
    /// Discord message hosting the quota panel, if any.
    pub panel_message_id: Option<String>,
}

/// Partial update for [`QuotaRoleConfig`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaRoleConfigPatch {
    #[serde(default)]
    pub required_points: Option<i64>,
    #[serde(default)]
    pub reset_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub panel_message_id: Option<String>,
}

/// A stored row of the append-only quota ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaEvent {
    pub id: i64,
    pub guild_id: String,
    pub actor_user_id: String,
    pub action_type: QuotaActionType,
    pub subject_id: Option<String>,
    pub dungeon_key: Option<String>,
    /// Raider points.
    pub points: i64,
    /// Organizer / verifier points.
    pub quota_points: i64,
    pub created_at: DateTime<Utc>,
}

/// A ledger row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuotaEvent {
    pub guild_id: String,
    pub actor_user_id: String,
    pub action_type: QuotaActionType,
    pub subject_id: Option<String>,
    pub dungeon_key: Option<String>,
    pub points: i64,
    pub quota_points: i64,
}

/// What the ledger writer hands back after a fresh insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedQuotaEvent {
    pub id: i64,
    pub points: i64,
    pub quota_points: i64,
}

/// A raid run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: i64,
    pub guild_id: String,
    pub organizer_id: String,
    pub dungeon_key: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Per-dungeon activity row inside [`UserQuotaStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonBreakdown {
    pub dungeon_key: String,
    pub completed: i64,
    pub organized: i64,
    pub keys_popped: i64,
}

impl DungeonBreakdown {
    /// Sum of the three metrics, used for ordering.
    pub fn total_activity(&self) -> i64 {
        self.completed + self.organized + self.keys_popped
    }
}

/// All-time statistics for one user in one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuotaStats {
    pub total_points: i64,
    pub total_quota_points: i64,
    pub total_runs_organized: i64,
    pub total_verifications: i64,
    pub total_keys_popped: i64,
    pub dungeons: Vec<DungeonBreakdown>,
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub points: i64,
    pub runs: i64,
}

/// Windowed totals for one role member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMemberStats {
    pub points: i64,
    pub runs: i64,
}

/// Result of recording a key pop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPopRecord {
    pub user_id: String,
    pub dungeon_key: String,
    /// Keys this user has popped for the dungeon, including this one.
    pub count: i64,
    /// Raider points credited for this pop.
    pub points: i64,
}

/// Dungeon key to override points, ordered by key.
pub type DungeonOverrides = BTreeMap<String, i64>;

/// Reject identifiers that are not Discord-style decimal snowflakes.
pub fn validate_snowflake(kind: &str, value: &str) -> Result<(), RaidledgerError> {
    if value.is_empty() || value.len() > 20 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RaidledgerError::InvalidInput(format!(
            "{kind} must be a decimal id, got `{value}`"
        )));
    }
    if value.parse::<u64>().is_err() {
        return Err(RaidledgerError::InvalidInput(format!(
            "{kind} `{value}` does not fit in 64 bits"
        )));
    }
    Ok(())
}

/// Reject empty or overlong dungeon keys.
pub fn validate_dungeon_key(value: &str) -> Result<(), RaidledgerError> {
    if value.trim().is_empty() || value.len() > 64 {
        return Err(RaidledgerError::InvalidInput(format!(
            "dungeon key must be 1-64 characters, got `{value}`"
        )));
    }
    Ok(())
}
