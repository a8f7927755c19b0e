// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger writes: organizer credit, raider bulk award, verifications, and
//! key pops.
//!
//! Double crediting is prevented by the store, not by this process: every
//! `run_completed` row carries a subject id and the partial unique index on
//! `(guild_id, subject_id)` turns a repeated insert into a no-op that
//! surfaces here as `Ok(None)`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use raidledger_core::types::validate_snowflake;
use raidledger_core::{KeyPopRecord, LoggedQuotaEvent, NewQuotaEvent, QuotaActionType, Run};
use raidledger_storage::queries::{events, key_pops, runs};

use crate::QuotaError;
use crate::service::{QuotaService, validate_dungeon};

/// Subject id of the organizer credit for a run.
pub fn run_subject(run_id: i64) -> String {
    format!("run:{run_id}")
}

/// Subject id of one raider's credit for a run.
pub fn raider_subject(run_id: i64, user_id: &str) -> String {
    format!("raider:{run_id}:{user_id}")
}

/// Subject id of a key pop tied to a run.
pub fn key_pop_subject(run_id: i64, user_id: &str) -> String {
    format!("keypop:{run_id}:{user_id}")
}

/// Subject id of a member verification.
pub fn verify_subject(user_id: &str) -> String {
    format!("verify:{user_id}")
}

/// A ledger write request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaEventInput {
    pub actor_user_id: String,
    pub action_type: QuotaActionType,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub dungeon_key: Option<String>,
    /// Overrides the per-action default when set.
    #[serde(default)]
    pub quota_points: Option<i64>,
}

/// Outcome of crediting a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCompletionCredit {
    pub run: Run,
    /// Organizer credit, `None` when the run was already credited.
    pub organizer: Option<LoggedQuotaEvent>,
    pub raiders_credited: u32,
}

impl QuotaService {
    /// Append one ledger row with `points = 0`.
    ///
    /// Returns `Ok(None)` when a `run_completed` row with the same subject
    /// already exists in the guild.
    pub async fn log_quota_event(
        &self,
        guild_id: &str,
        input: QuotaEventInput,
    ) -> Result<Option<LoggedQuotaEvent>, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        validate_snowflake("actor_user_id", &input.actor_user_id)?;
        if let Some(dungeon_key) = input.dungeon_key.as_deref() {
            validate_dungeon(dungeon_key)?;
        }
        if input.action_type == QuotaActionType::KeyPop {
            return Err(QuotaError::InvalidInput(
                "key pops are recorded through record_key_pop".to_string(),
            ));
        }

        let quota_points = input
            .quota_points
            .unwrap_or_else(|| self.default_quota_points(input.action_type));
        let event = NewQuotaEvent {
            guild_id: guild_id.to_string(),
            actor_user_id: input.actor_user_id,
            action_type: input.action_type,
            subject_id: input.subject_id,
            dungeon_key: input.dungeon_key,
            points: 0,
            quota_points,
        };

        let logged = events::insert_event(&self.db, &event).await?;
        match &logged {
            Some(row) => info!(
                guild_id,
                actor = %event.actor_user_id,
                action = %event.action_type,
                subject = ?event.subject_id,
                quota_points = row.quota_points,
                event_id = row.id,
                "quota event logged"
            ),
            None => debug!(
                guild_id,
                subject = ?event.subject_id,
                "quota event already logged, skipping"
            ),
        }
        Ok(logged)
    }

    /// Credit every raider currently joined to a run.
    ///
    /// Raiders are processed one at a time; a failure for one raider is
    /// logged and does not stop the rest. Returns how many raiders were newly
    /// credited, so a return of 0 does not distinguish "nobody joined" from
    /// "every insert failed" or "already credited".
    pub async fn award_raider_points(
        &self,
        guild_id: &str,
        run_id: i64,
        dungeon_key: &str,
    ) -> Result<u32, QuotaError> {
        let points = self.raider_points_for_dungeon(guild_id, dungeon_key).await?;
        if points == 0 {
            debug!(guild_id, run_id, dungeon_key, "raider points disabled for dungeon");
            return Ok(0);
        }

        let raiders = runs::joined_raiders(&self.db, guild_id, run_id).await?;
        let mut credited = 0u32;
        for user_id in &raiders {
            let event = NewQuotaEvent {
                guild_id: guild_id.to_string(),
                actor_user_id: user_id.clone(),
                action_type: QuotaActionType::RunCompleted,
                subject_id: Some(raider_subject(run_id, user_id)),
                dungeon_key: Some(dungeon_key.to_string()),
                points,
                quota_points: 0,
            };
            match events::insert_event(&self.db, &event).await {
                Ok(Some(_)) => credited += 1,
                Ok(None) => {
                    debug!(guild_id, run_id, user_id = %user_id, "raider already credited")
                }
                Err(e) => warn!(
                    guild_id,
                    run_id,
                    user_id = %user_id,
                    error = %e,
                    "failed to credit raider, continuing"
                ),
            }
        }

        info!(
            guild_id,
            run_id,
            dungeon_key,
            points,
            joined = raiders.len(),
            credited,
            "raider points awarded"
        );
        Ok(credited)
    }

    /// Whether the organizer credit for a run has been written.
    pub async fn is_run_already_logged(
        &self,
        guild_id: &str,
        run_id: i64,
    ) -> Result<bool, QuotaError> {
        validate_snowflake("guild_id", guild_id)?;
        events::subject_logged(&self.db, guild_id, &run_subject(run_id)).await
    }

    /// End a run and credit its organizer and raiders.
    ///
    /// Safe to repeat: later calls find the existing rows and credit nobody.
    /// `organizer_role_ids` selects the applicable overrides; an empty slice
    /// means the organizer's roles are unknown.
    pub async fn credit_run_completion(
        &self,
        guild_id: &str,
        run_id: i64,
        organizer_role_ids: &[String],
    ) -> Result<RunCompletionCredit, QuotaError> {
        // Resolve points before ending so rejected input leaves the run open.
        let run = self.run(guild_id, run_id).await?;
        let points = self
            .points_for_dungeon(guild_id, &run.dungeon_key, Some(organizer_role_ids))
            .await?;
        let run = self.end_run(guild_id, run_id).await?;

        let organizer = self
            .log_quota_event(
                guild_id,
                QuotaEventInput {
                    actor_user_id: run.organizer_id.clone(),
                    action_type: QuotaActionType::RunCompleted,
                    subject_id: Some(run_subject(run.id)),
                    dungeon_key: Some(run.dungeon_key.clone()),
                    quota_points: Some(points),
                },
            )
            .await?;
        let raiders_credited = self
            .award_raider_points(guild_id, run.id, &run.dungeon_key)
            .await?;

        Ok(RunCompletionCredit {
            run,
            organizer,
            raiders_credited,
        })
    }

    /// Credit `actor_user_id` for verifying `subject_user_id`.
    pub async fn log_verification(
        &self,
        guild_id: &str,
        actor_user_id: &str,
        subject_user_id: &str,
    ) -> Result<Option<LoggedQuotaEvent>, QuotaError> {
        validate_snowflake("subject_user_id", subject_user_id)?;
        self.log_quota_event(
            guild_id,
            QuotaEventInput {
                actor_user_id: actor_user_id.to_string(),
                action_type: QuotaActionType::VerifyMember,
                subject_id: Some(verify_subject(subject_user_id)),
                dungeon_key: None,
                quota_points: None,
            },
        )
        .await
    }

    /// Count a key pop and credit the raider with the dungeon's key-pop points.
    pub async fn record_key_pop(
        &self,
        guild_id: &str,
        user_id: &str,
        dungeon_key: &str,
        run_id: Option<i64>,
    ) -> Result<KeyPopRecord, QuotaError> {
        validate_snowflake("user_id", user_id)?;
        if let Some(run_id) = run_id {
            self.run(guild_id, run_id).await?;
        }
        let points = self.key_pop_points_for_dungeon(guild_id, dungeon_key).await?;

        let record = key_pops::record_key_pop(
            &self.db,
            &NewQuotaEvent {
                guild_id: guild_id.to_string(),
                actor_user_id: user_id.to_string(),
                action_type: QuotaActionType::KeyPop,
                subject_id: run_id.map(|id| key_pop_subject(id, user_id)),
                dungeon_key: Some(dungeon_key.to_string()),
                points,
                quota_points: 0,
            },
        )
        .await?;
        info!(
            guild_id,
            user_id,
            dungeon_key,
            count = record.count,
            points,
            "key pop recorded"
        );
        Ok(record)
    }

    fn default_quota_points(&self, action_type: QuotaActionType) -> i64 {
        match action_type {
            QuotaActionType::RunCompleted => self.config.default_run_points,
            QuotaActionType::VerifyMember => self.config.default_verify_points,
            QuotaActionType::KeyPop => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use raidledger_config::model::QuotaConfig;
    use raidledger_core::{ReactionState, RunStatus};
    use raidledger_storage::Database;
    use raidledger_storage::queries::events::list_user_events;
    use tempfile::tempdir;

    use super::*;

    async fn service() -> (QuotaService, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("quota.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (QuotaService::new(db, QuotaConfig::default()), dir)
    }

    fn completion(actor: &str, subject: &str) -> QuotaEventInput {
        QuotaEventInput {
            actor_user_id: actor.into(),
            action_type: QuotaActionType::RunCompleted,
            subject_id: Some(subject.into()),
            dungeon_key: Some("fungal".into()),
            quota_points: None,
        }
    }

    async fn run_with_raiders(svc: &QuotaService, raiders: &[&str]) -> Run {
        let run = svc.create_run("1", "100", "fungal").await.unwrap();
        for raider in raiders {
            svc.set_reaction("1", run.id, raider, ReactionState::Join, None)
                .await
                .unwrap();
        }
        run
    }

    #[test]
    fn subject_formats() {
        assert_eq!(run_subject(12), "run:12");
        assert_eq!(raider_subject(12, "34"), "raider:12:34");
        assert_eq!(key_pop_subject(12, "34"), "keypop:12:34");
        assert_eq!(verify_subject("34"), "verify:34");
    }

    #[tokio::test]
    async fn repeated_run_completion_logs_once() {
        let (svc, _dir) = service().await;
        let first = svc
            .log_quota_event("1", completion("100", "run:5"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.points, 0);
        assert_eq!(first.quota_points, 1);

        let second = svc
            .log_quota_event("1", completion("100", "run:5"))
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(list_user_events(svc.database(), "1", "100", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn quota_points_override_and_verify_default() {
        let (svc, _dir) = service().await;
        let mut input = completion("100", "run:6");
        input.quota_points = Some(4);
        let logged = svc.log_quota_event("1", input).await.unwrap().unwrap();
        assert_eq!(logged.quota_points, 4);

        let verify = svc.log_verification("1", "100", "555").await.unwrap().unwrap();
        assert_eq!(verify.quota_points, 1);
        assert_eq!(verify.points, 0);
    }

    #[tokio::test]
    async fn key_pop_action_is_not_a_plain_event() {
        let (svc, _dir) = service().await;
        let input = QuotaEventInput {
            action_type: QuotaActionType::KeyPop,
            ..completion("100", "keypop:1:100")
        };
        assert!(matches!(
            svc.log_quota_event("1", input).await.unwrap_err(),
            QuotaError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn raiders_are_credited_once() {
        let (svc, _dir) = service().await;
        let run = run_with_raiders(&svc, &["201", "202", "203"]).await;
        svc.set_reaction("1", run.id, "203", ReactionState::Leave, None)
            .await
            .unwrap();

        assert_eq!(svc.award_raider_points("1", run.id, "fungal").await.unwrap(), 2);
        assert_eq!(svc.award_raider_points("1", run.id, "fungal").await.unwrap(), 0);

        let events = list_user_events(svc.database(), "1", "201", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].points, 1);
        assert_eq!(events[0].quota_points, 0);
        assert_eq!(events[0].subject_id, Some(raider_subject(run.id, "201")));
    }

    #[tokio::test]
    async fn zero_raider_points_skips_award() {
        let (svc, _dir) = service().await;
        let run = run_with_raiders(&svc, &["201", "202"]).await;
        svc.set_raider_points("1", "fungal", 0).await.unwrap();

        assert_eq!(svc.award_raider_points("1", run.id, "fungal").await.unwrap(), 0);
        for raider in ["201", "202"] {
            assert!(list_user_events(svc.database(), "1", raider, 10).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn one_failing_raider_does_not_block_others() {
        let (svc, _dir) = service().await;
        let run = run_with_raiders(&svc, &["201", "202", "203"]).await;
        svc.database()
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "CREATE TRIGGER reject_raider BEFORE INSERT ON quota_event
                     WHEN NEW.actor_user_id = '202'
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
            })
            .await
            .unwrap();

        assert_eq!(svc.award_raider_points("1", run.id, "fungal").await.unwrap(), 2);
        for (raider, expected) in [("201", 1), ("202", 0), ("203", 1)] {
            let rows = list_user_events(svc.database(), "1", raider, 10).await.unwrap();
            assert_eq!(rows.len(), expected, "raider {raider}");
        }
    }

    #[tokio::test]
    async fn run_completion_credits_organizer_and_raiders() {
        let (svc, _dir) = service().await;
        let run = run_with_raiders(&svc, &["201", "202"]).await;
        svc.set_dungeon_override("1", "10", "fungal", 3).await.unwrap();
        svc.set_dungeon_override("1", "20", "fungal", 5).await.unwrap();
        assert!(!svc.is_run_already_logged("1", run.id).await.unwrap());

        let roles = vec!["10".to_string(), "20".to_string()];
        let credit = svc.credit_run_completion("1", run.id, &roles).await.unwrap();
        assert_eq!(credit.organizer.unwrap().quota_points, 5);
        assert_eq!(credit.raiders_credited, 2);
        assert!(credit.run.ended_at.is_some());
        assert!(svc.is_run_already_logged("1", run.id).await.unwrap());

        let again = svc.credit_run_completion("1", run.id, &roles).await.unwrap();
        assert!(again.organizer.is_none());
        assert_eq!(again.raiders_credited, 0);
        assert_eq!(again.run.ended_at, credit.run.ended_at);
    }

    #[tokio::test]
    async fn crediting_missing_run_is_not_found() {
        let (svc, _dir) = service().await;
        let err = svc.credit_run_completion("1", 404, &[]).await.unwrap_err();
        assert!(matches!(err, QuotaError::NotFound { kind: "run", .. }));
    }

    #[tokio::test]
    async fn rejected_role_ids_leave_run_open() {
        let (svc, _dir) = service().await;
        let run = run_with_raiders(&svc, &["201"]).await;

        let err = svc
            .credit_run_completion("1", run.id, &["abc".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, QuotaError::InvalidInput(_)));

        let stored = svc.run("1", run.id).await.unwrap();
        assert_eq!(stored.status, RunStatus::Open);
        assert!(stored.ended_at.is_none());
        assert!(!svc.is_run_already_logged("1", run.id).await.unwrap());

        // A corrected retry still credits the run.
        let credit = svc.credit_run_completion("1", run.id, &[]).await.unwrap();
        assert!(credit.organizer.is_some());
        assert_eq!(credit.run.status, RunStatus::Ended);
    }

    #[tokio::test]
    async fn concurrent_duplicate_completions_store_one_row() {
        let (svc, _dir) = service().await;
        let (a, b) = tokio::join!(
            svc.log_quota_event("1", completion("100", "run:1")),
            svc.log_quota_event("1", completion("100", "run:1")),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(usize::from(a.is_some()) + usize::from(b.is_some()), 1);

        let events = list_user_events(svc.database(), "1", "100", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject_id.as_deref(), Some("run:1"));
    }

    #[tokio::test]
    async fn key_pops_count_and_credit() {
        let (svc, _dir) = service().await;
        let run = run_with_raiders(&svc, &["201"]).await;
        svc.set_key_pop_points("1", "fungal", 3).await.unwrap();

        let first = svc.record_key_pop("1", "201", "fungal", Some(run.id)).await.unwrap();
        let second = svc.record_key_pop("1", "201", "fungal", None).await.unwrap();
        assert_eq!((first.count, first.points), (1, 3));
        assert_eq!(second.count, 2);

        let events = list_user_events(svc.database(), "1", "201", 10).await.unwrap();
        assert!(events.iter().any(|e| e.subject_id == Some(key_pop_subject(run.id, "201"))));

        assert!(matches!(
            svc.record_key_pop("1", "201", "fungal", Some(run.id + 100)).await.unwrap_err(),
            QuotaError::NotFound { .. }
        ));
    }
}
