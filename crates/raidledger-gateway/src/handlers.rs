// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the quota REST API.
//!
//! Handlers validate nothing themselves: ids and amounts are checked by
//! [`QuotaService`](raidledger_quota::QuotaService) and surface as 400s.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use raidledger_core::{
    DungeonOverrides, HealthStatus, KeyPopRecord, LeaderboardEntry, LoggedQuotaEvent, QuotaEvent,
    QuotaRoleConfig, QuotaRoleConfigPatch, ReactionState, RoleMemberStats, Run, UserQuotaStats,
};
use raidledger_quota::{QuotaEventInput, QuotaPeriod, RunCompletionCredit};

use crate::error::ApiError;
use crate::server::GatewayState;

const DEFAULT_EVENT_LIMIT: u32 = 25;
const MAX_EVENT_LIMIT: u32 = 100;

type ApiResult<T> = Result<T, ApiError>;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded`, or `unhealthy`.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Detail for non-healthy states.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Request body for PUT of an override or a per-dungeon point value.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointsBody {
    pub points: i64,
}

/// Response body for GET .../quota/points/{dungeon_key}.
#[derive(Debug, Serialize, Deserialize)]
pub struct PointsResponse {
    pub dungeon_key: String,
    pub points: i64,
}

/// Query string for GET .../quota/points/{dungeon_key}.
#[derive(Debug, Deserialize)]
pub struct PointsQuery {
    /// Comma-separated role ids of the organizer.
    #[serde(default)]
    pub role_ids: Option<String>,
}

/// Response body for ledger writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEventResponse {
    /// False when the submission was a duplicate.
    pub logged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<LoggedQuotaEvent>,
}

impl From<Option<LoggedQuotaEvent>> for LogEventResponse {
    fn from(event: Option<LoggedQuotaEvent>) -> Self {
        Self {
            logged: event.is_some(),
            event,
        }
    }
}

/// Request body for POST .../quota/verifications.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationRequest {
    pub actor_user_id: String,
    pub subject_user_id: String,
}

/// Request body for POST .../quota/leaderboard.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaderboardRequest {
    pub role_id: String,
    pub member_ids: Vec<String>,
    /// Window bounds. Both omitted means the role's current period.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// Response body for POST .../quota/leaderboard.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub role_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub entries: Vec<LeaderboardEntry>,
}

/// Request body for POST .../quota/role-stats.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleStatsRequest {
    pub member_ids: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Query string for GET .../quota/users/{user_id}/events.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Request body for POST .../runs.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRunRequest {
    pub organizer_id: String,
    pub dungeon_key: String,
}

/// Request body for PUT .../runs/{run_id}/reactions/{user_id}.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactionRequest {
    pub state: ReactionState,
    #[serde(default)]
    pub class: Option<String>,
}

/// Request body for POST .../runs/{run_id}/complete.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteRunRequest {
    /// Organizer's role ids. Empty resolves points across every role.
    #[serde(default)]
    pub organizer_role_ids: Vec<String>,
}

/// Request body for POST .../key-pops.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyPopRequest {
    pub user_id: String,
    pub dungeon_key: String,
    #[serde(default)]
    pub run_id: Option<i64>,
}

fn deleted_or_not_found(deleted: bool, kind: &str, key: &str) -> ApiResult<StatusCode> {
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("{kind} not found: {key}")))
    }
}

fn split_role_ids(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /health
///
/// Unauthenticated liveness probe backed by the storage health check.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (code, status, detail) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", None),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, "degraded", Some(reason)),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(reason))
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            Some(e.to_string()),
        ),
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        detail,
    };
    (code, Json(body)).into_response()
}

/// GET /v1/guilds/{guild_id}/quota/roles
pub async fn list_role_configs(
    State(state): State<GatewayState>,
    Path(guild_id): Path<String>,
) -> ApiResult<Json<Vec<QuotaRoleConfig>>> {
    Ok(Json(state.quota.quota_role_configs(&guild_id).await?))
}

/// GET /v1/guilds/{guild_id}/quota/roles/{role_id}
pub async fn get_role_config(
    State(state): State<GatewayState>,
    Path((guild_id, role_id)): Path<(String, String)>,
) -> ApiResult<Json<QuotaRoleConfig>> {
    state
        .quota
        .quota_role_config(&guild_id, &role_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("quota role not found: {role_id}")))
}

/// PUT /v1/guilds/{guild_id}/quota/roles/{role_id}
///
/// Partial update; omitted fields keep their stored values.
pub async fn put_role_config(
    State(state): State<GatewayState>,
    Path((guild_id, role_id)): Path<(String, String)>,
    body: Result<Json<QuotaRoleConfigPatch>, JsonRejection>,
) -> ApiResult<Json<QuotaRoleConfig>> {
    let Json(patch) = body?;
    let config = state
        .quota
        .upsert_quota_role_config(&guild_id, &role_id, patch)
        .await?;
    Ok(Json(config))
}

/// GET /v1/guilds/{guild_id}/quota/roles/{role_id}/period
pub async fn get_role_period(
    State(state): State<GatewayState>,
    Path((guild_id, role_id)): Path<(String, String)>,
) -> ApiResult<Json<QuotaPeriod>> {
    state
        .quota
        .quota_period(&guild_id, &role_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("quota role not found: {role_id}")))
}

/// GET /v1/guilds/{guild_id}/quota/roles/{role_id}/overrides
pub async fn list_overrides(
    State(state): State<GatewayState>,
    Path((guild_id, role_id)): Path<(String, String)>,
) -> ApiResult<Json<DungeonOverrides>> {
    Ok(Json(state.quota.dungeon_overrides(&guild_id, &role_id).await?))
}

/// PUT /v1/guilds/{guild_id}/quota/roles/{role_id}/overrides/{dungeon_key}
pub async fn put_override(
    State(state): State<GatewayState>,
    Path((guild_id, role_id, dungeon_key)): Path<(String, String, String)>,
    body: Result<Json<PointsBody>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = body?;
    state
        .quota
        .set_dungeon_override(&guild_id, &role_id, &dungeon_key, body.points)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/guilds/{guild_id}/quota/roles/{role_id}/overrides/{dungeon_key}
pub async fn delete_override(
    State(state): State<GatewayState>,
    Path((guild_id, role_id, dungeon_key)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let deleted = state
        .quota
        .delete_dungeon_override(&guild_id, &role_id, &dungeon_key)
        .await?;
    deleted_or_not_found(deleted, "override", &dungeon_key)
}

/// GET /v1/guilds/{guild_id}/quota/points/{dungeon_key}?role_ids=a,b
pub async fn get_points(
    State(state): State<GatewayState>,
    Path((guild_id, dungeon_key)): Path<(String, String)>,
    query: Result<Query<PointsQuery>, QueryRejection>,
) -> ApiResult<Json<PointsResponse>> {
    let Query(query) = query?;
    let role_ids = split_role_ids(query.role_ids.as_deref());
    let points = state
        .quota
        .points_for_dungeon(&guild_id, &dungeon_key, Some(&role_ids))
        .await?;
    Ok(Json(PointsResponse {
        dungeon_key,
        points,
    }))
}

/// PUT /v1/guilds/{guild_id}/quota/dungeons/{dungeon_key}/raider-points
pub async fn put_raider_points(
    State(state): State<GatewayState>,
    Path((guild_id, dungeon_key)): Path<(String, String)>,
    body: Result<Json<PointsBody>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = body?;
    state
        .quota
        .set_raider_points(&guild_id, &dungeon_key, body.points)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/guilds/{guild_id}/quota/dungeons/{dungeon_key}/raider-points
pub async fn delete_raider_points(
    State(state): State<GatewayState>,
    Path((guild_id, dungeon_key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let deleted = state
        .quota
        .delete_raider_points(&guild_id, &dungeon_key)
        .await?;
    deleted_or_not_found(deleted, "raider points", &dungeon_key)
}

/// PUT /v1/guilds/{guild_id}/quota/dungeons/{dungeon_key}/key-pop-points
pub async fn put_key_pop_points(
    State(state): State<GatewayState>,
    Path((guild_id, dungeon_key)): Path<(String, String)>,
    body: Result<Json<PointsBody>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = body?;
    state
        .quota
        .set_key_pop_points(&guild_id, &dungeon_key, body.points)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/guilds/{guild_id}/quota/dungeons/{dungeon_key}/key-pop-points
pub async fn delete_key_pop_points(
    State(state): State<GatewayState>,
    Path((guild_id, dungeon_key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let deleted = state
        .quota
        .delete_key_pop_points(&guild_id, &dungeon_key)
        .await?;
    deleted_or_not_found(deleted, "key pop points", &dungeon_key)
}

/// POST /v1/guilds/{guild_id}/quota/events
///
/// 201 with the new row, or 200 `{"logged": false}` for a duplicate run credit.
pub async fn post_event(
    State(state): State<GatewayState>,
    Path(guild_id): Path<String>,
    body: Result<Json<QuotaEventInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LogEventResponse>)> {
    let Json(input) = body?;
    let logged = state.quota.log_quota_event(&guild_id, input).await?;
    let code = if logged.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(logged.into())))
}

/// POST /v1/guilds/{guild_id}/quota/verifications
pub async fn post_verification(
    State(state): State<GatewayState>,
    Path(guild_id): Path<String>,
    body: Result<Json<VerificationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LogEventResponse>)> {
    let Json(body) = body?;
    let logged = state
        .quota
        .log_verification(&guild_id, &body.actor_user_id, &body.subject_user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(logged.into())))
}

/// POST /v1/guilds/{guild_id}/quota/leaderboard
pub async fn post_leaderboard(
    State(state): State<GatewayState>,
    Path(guild_id): Path<String>,
    body: Result<Json<LeaderboardRequest>, JsonRejection>,
) -> ApiResult<Json<LeaderboardResponse>> {
    let Json(body) = body?;
    let (start, end) = match (body.start, body.end) {
        (Some(start), Some(end)) => (start, end),
        (None, None) => {
            let period = state
                .quota
                .quota_period(&guild_id, &body.role_id)
                .await?
                .ok_or_else(|| {
                    ApiError::not_found(format!("quota role not found: {}", body.role_id))
                })?;
            (period.start, period.end)
        }
        _ => {
            return Err(ApiError::bad_request(
                "start and end must be given together",
            ));
        }
    };

    let entries = state
        .quota
        .quota_leaderboard(&guild_id, &body.role_id, &body.member_ids, start, end)
        .await?;
    Ok(Json(LeaderboardResponse {
        role_id: body.role_id,
        start,
        end,
        entries,
    }))
}

/// POST /v1/guilds/{guild_id}/quota/role-stats
pub async fn post_role_stats(
    State(state): State<GatewayState>,
    Path(guild_id): Path<String>,
    body: Result<Json<RoleStatsRequest>, JsonRejection>,
) -> ApiResult<Json<HashMap<String, RoleMemberStats>>> {
    let Json(body) = body?;
    let stats = state
        .quota
        .quota_stats_for_role(&guild_id, &body.member_ids, body.start, body.end)
        .await?;
    Ok(Json(stats))
}

/// GET /v1/guilds/{guild_id}/quota/users/{user_id}/stats
pub async fn get_user_stats(
    State(state): State<GatewayState>,
    Path((guild_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<UserQuotaStats>> {
    Ok(Json(state.quota.user_quota_stats(&guild_id, &user_id).await?))
}

/// GET /v1/guilds/{guild_id}/quota/users/{user_id}/events?limit=
pub async fn get_user_events(
    State(state): State<GatewayState>,
    Path((guild_id, user_id)): Path<(String, String)>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<QuotaEvent>>> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .clamp(1, MAX_EVENT_LIMIT);
    Ok(Json(
        state.quota.user_events(&guild_id, &user_id, limit).await?,
    ))
}

/// POST /v1/guilds/{guild_id}/runs
pub async fn post_run(
    State(state): State<GatewayState>,
    Path(guild_id): Path<String>,
    body: Result<Json<CreateRunRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Run>)> {
    let Json(body) = body?;
    let run = state
        .quota
        .create_run(&guild_id, &body.organizer_id, &body.dungeon_key)
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}

/// GET /v1/guilds/{guild_id}/runs/{run_id}
pub async fn get_run(
    State(state): State<GatewayState>,
    Path((guild_id, run_id)): Path<(String, i64)>,
) -> ApiResult<Json<Run>> {
    Ok(Json(state.quota.run(&guild_id, run_id).await?))
}

/// PUT /v1/guilds/{guild_id}/runs/{run_id}/reactions/{user_id}
pub async fn put_reaction(
    State(state): State<GatewayState>,
    Path((guild_id, run_id, user_id)): Path<(String, i64, String)>,
    body: Result<Json<ReactionRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = body?;
    state
        .quota
        .set_reaction(&guild_id, run_id, &user_id, body.state, body.class.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/guilds/{guild_id}/runs/{run_id}/complete
///
/// Ends the run and credits organizer and raiders. Safe to repeat. The body
/// may be omitted, which resolves points across every role.
pub async fn post_run_complete(
    State(state): State<GatewayState>,
    Path((guild_id, run_id)): Path<(String, i64)>,
    body: Result<Option<Json<CompleteRunRequest>>, JsonRejection>,
) -> ApiResult<Json<RunCompletionCredit>> {
    let body = body?.map(|Json(body)| body).unwrap_or_default();
    let credit = state
        .quota
        .credit_run_completion(&guild_id, run_id, &body.organizer_role_ids)
        .await?;
    Ok(Json(credit))
}

/// POST /v1/guilds/{guild_id}/key-pops
pub async fn post_key_pop(
    State(state): State<GatewayState>,
    Path(guild_id): Path<String>,
    body: Result<Json<KeyPopRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<KeyPopRecord>)> {
    let Json(body) = body?;
    let record = state
        .quota
        .record_key_pop(&guild_id, &body.user_id, &body.dungeon_key, body.run_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
