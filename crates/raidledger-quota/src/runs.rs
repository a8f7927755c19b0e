// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs and reactions: the "who joined" data raider credit is computed from.

use tracing::{debug, info};

use raidledger_core::types::validate_snowflake;
use raidledger_core::{ReactionState, Run};
use raidledger_storage::queries::runs;

use crate::QuotaError;
use crate::service::{QuotaService, validate_dungeon};

fn run_not_found(run_id: i64) -> QuotaError {
    QuotaError::NotFound {
        kind: "run",
        id: run_id.to_string(),
    }
}

impl QuotaService {
    /// Open a run for `organizer_id`.
    pub async fn create_run(
        &self,
        guild_id: &str,
        organizer_id: &str,
        dungeon_key: &str,
    ) -> Result<Run, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("organizer_id", organizer_id)?;
        validate_dungeon(dungeon_key)?;
        let run = runs::create_run(&self.db, guild_id, organizer_id, dungeon_key).await?;
        info!(guild_id, run_id = run.id, organizer_id, dungeon_key, "run created");
        Ok(run)
    }

    /// Look up a run, `NotFound` if it does not exist in the guild.
    pub async fn run(&self, guild_id: &str, run_id: i64) -> Result<Run, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        runs::get_run(&self.db, guild_id, run_id)
            .await?
            .ok_or_else(|| run_not_found(run_id))
    }

    /// Mark a run ended. Ending an ended run returns it unchanged.
    pub async fn end_run(&self, guild_id: &str, run_id: i64) -> Result<Run, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        let run = runs::end_run(&self.db, guild_id, run_id)
            .await?
            .ok_or_else(|| run_not_found(run_id))?;
        debug!(guild_id, run_id, ended_at = ?run.ended_at, "run ended");
        Ok(run)
    }

    /// Record a user's latest reaction on a run.
    pub async fn set_reaction(
        &self,
        guild_id: &str,
        run_id: i64,
        user_id: &str,
        state: ReactionState,
        class: Option<&str>,
    ) -> Result<(), QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("user_id", user_id)?;
        if !runs::set_reaction(&self.db, guild_id, run_id, user_id, state, class).await? {
            return Err(run_not_found(run_id));
        }
        debug!(guild_id, run_id, user_id, %state, "reaction recorded");
        Ok(())
    }

    /// Raiders currently joined, in order of first reaction.
    pub async fn joined_raiders(
        &self,
        guild_id: &str,
        run_id: i64,
    ) -> Result<Vec<String>, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        runs::joined_raiders(&self.db, guild_id, run_id).await
    }
}
