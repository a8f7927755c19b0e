// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accounting period boundaries for a role's quota.
//!
//! `reset_at` has two meanings depending on where it sits relative to now:
//! while in the future it is the END of the current period (which started at
//! `created_at`); once it has passed it becomes the START of an open period
//! that runs until now, and stays that way until a new `reset_at` is set.

use chrono::{DateTime, Utc};
use serde::Serialize;

use raidledger_core::QuotaRoleConfig;

/// Half-open window `[start, end)` used for leaderboard queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Start of the period in effect at `now`.
pub fn period_start(config: &QuotaRoleConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    if config.reset_at > now {
        config.created_at
    } else {
        config.reset_at
    }
}

/// End of the period in effect at `now`.
pub fn period_end(config: &QuotaRoleConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    if config.reset_at > now {
        config.reset_at
    } else {
        now
    }
}

/// Both boundaries at `now`.
pub fn current_period(config: &QuotaRoleConfig, now: DateTime<Utc>) -> QuotaPeriod {
    QuotaPeriod {
        start: period_start(config, now),
        end: period_end(config, now),
    }
}

/// Both boundaries at the current wall-clock time.
pub fn current_period_now(config: &QuotaRoleConfig) -> QuotaPeriod {
    current_period(config, Utc::now())
}
