// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user stats, leaderboards, and role summaries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use raidledger_core::types::validate_snowflake;
use raidledger_core::{LeaderboardEntry, QuotaEvent, RoleMemberStats, UserQuotaStats};
use raidledger_storage::queries::{events, reports};

use crate::QuotaError;
use crate::service::{QuotaService, validate_members};

impl QuotaService {
    /// All-time totals and per-dungeon breakdown for a user.
    pub async fn user_quota_stats(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<UserQuotaStats, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("user_id", user_id)?;
        reports::user_totals(&self.db, guild_id, user_id).await
    }

    /// Ranked members of a role for the window `[start, end)`.
    ///
    /// Ordered by quota points, then run count, then user id, and capped at
    /// `leaderboard_limit`. `role_id` only labels diagnostics.
    pub async fn quota_leaderboard(
        &self,
        guild_id: &str,
        role_id: &str,
        member_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("role_id", role_id)?;
        validate_members(member_ids)?;

        let entries = reports::window_totals(
            &self.db,
            guild_id,
            member_ids,
            start,
            end,
            Some(self.config.leaderboard_limit),
        )
        .await?;

        if entries.is_empty() && !member_ids.is_empty() {
            let all_time = reports::all_time_event_count(&self.db, guild_id, member_ids).await?;
            info!(
                guild_id,
                role_id,
                members = member_ids.len(),
                %start,
                %end,
                all_time_events = all_time,
                "leaderboard window is empty"
            );
        } else {
            debug!(guild_id, role_id, rows = entries.len(), "leaderboard built");
        }
        Ok(entries)
    }

    /// Points and run counts in `[start, end)` for every supplied member.
    ///
    /// Members without activity are present with zeros.
    pub async fn quota_stats_for_role(
        &self,
        guild_id: &str,
        member_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HashMap<String, RoleMemberStats>, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_members(member_ids)?;

        let mut stats: HashMap<String, RoleMemberStats> = member_ids
            .iter()
            .map(|id| (id.clone(), RoleMemberStats::default()))
            .collect();
        for entry in reports::window_totals(&self.db, guild_id, member_ids, start, end, None).await? {
            stats.insert(
                entry.user_id,
                RoleMemberStats {
                    points: entry.points,
                    runs: entry.runs,
                },
            );
        }
        Ok(stats)
    }

    /// Most recent ledger rows for a user.
    pub async fn user_events(
        &self,
        guild_id: &str,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<QuotaEvent>, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("user_id", user_id)?;
        events::list_user_events(&self.db, guild_id, user_id, limit).await
    }
}
