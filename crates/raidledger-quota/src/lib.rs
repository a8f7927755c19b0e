// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota points for raid organizers and raiders.
//!
//! This crate provides:
//! - **Points resolution**: per-role dungeon overrides with "most generous wins"
//!   and configurable defaults
//! - **Ledger writes**: idempotent organizer and raider credit keyed by subject id
//! - **Periods**: accounting windows derived from a role's `reset_at`
//! - **Reporting**: per-user stats, leaderboards, and role summaries

pub mod ledger;
pub mod period;
pub mod points;
pub mod report;
pub mod runs;
pub mod service;

pub use ledger::{QuotaEventInput, RunCompletionCredit};
pub use period::QuotaPeriod;
pub use service::QuotaService;

/// Errors returned by quota operations.
pub type QuotaError = raidledger_core::RaidledgerError;
