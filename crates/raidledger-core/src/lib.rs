// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for raidledger.
//!
//! Holds the error type, the domain types passed between storage, quota
//! logic, and the HTTP gateway, and the adapter traits storage backends
//! implement.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

pub use error::RaidledgerError;
pub use time::{format_timestamp, format_window_bound, parse_timestamp};
pub use traits::{PluginAdapter, StorageAdapter};
pub use types::{
    DungeonBreakdown, DungeonOverrides, HealthStatus, KeyPopRecord, LeaderboardEntry,
    LoggedQuotaEvent, NewQuotaEvent, QuotaActionType, QuotaEvent, QuotaRoleConfig,
    QuotaRoleConfigPatch, ReactionState, RoleMemberStats, Run, RunStatus, UserQuotaStats,
};
