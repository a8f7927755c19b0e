// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the quota API.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use raidledger_config::model::GatewayConfig;
use raidledger_core::{PluginAdapter, RaidledgerError};
use raidledger_quota::QuotaService;
use tower_http::cors::CorsLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Quota service every `/v1` handler delegates to.
    pub quota: QuotaService,
    /// Storage adapter probed by `/health`.
    pub storage: Arc<dyn PluginAdapter>,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

/// Gateway server configuration (mirrors `GatewayConfig`).
#[derive(Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Bearer token for `/v1` routes (None = every request rejected).
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            bearer_token: config.bearer_token.clone(),
        }
    }
}

/// Build the application router.
///
/// `/health` is public; everything under `/v1` requires the bearer token.
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let guild = "/v1/guilds/{guild_id}";
    let api_routes = Router::new()
        .route(
            &format!("{guild}/quota/roles"),
            get(handlers::list_role_configs),
        )
        .route(
            &format!("{guild}/quota/roles/{{role_id}}"),
            get(handlers::get_role_config).put(handlers::put_role_config),
        )
        .route(
            &format!("{guild}/quota/roles/{{role_id}}/period"),
            get(handlers::get_role_period),
        )
        .route(
            &format!("{guild}/quota/roles/{{role_id}}/overrides"),
            get(handlers::list_overrides),
        )
        .route(
            &format!("{guild}/quota/roles/{{role_id}}/overrides/{{dungeon_key}}"),
            put(handlers::put_override).delete(handlers::delete_override),
        )
        .route(
            &format!("{guild}/quota/points/{{dungeon_key}}"),
            get(handlers::get_points),
        )
        .route(
            &format!("{guild}/quota/dungeons/{{dungeon_key}}/raider-points"),
            put(handlers::put_raider_points).delete(handlers::delete_raider_points),
        )
        .route(
            &format!("{guild}/quota/dungeons/{{dungeon_key}}/key-pop-points"),
            put(handlers::put_key_pop_points).delete(handlers::delete_key_pop_points),
        )
        .route(
            &format!("{guild}/quota/events"),
            post(handlers::post_event),
        )
        .route(
            &format!("{guild}/quota/verifications"),
            post(handlers::post_verification),
        )
        .route(
            &format!("{guild}/quota/leaderboard"),
            post(handlers::post_leaderboard),
        )
        .route(
            &format!("{guild}/quota/role-stats"),
            post(handlers::post_role_stats),
        )
        .route(
            &format!("{guild}/quota/users/{{user_id}}/stats"),
            get(handlers::get_user_stats),
        )
        .route(
            &format!("{guild}/quota/users/{{user_id}}/events"),
            get(handlers::get_user_events),
        )
        .route(&format!("{guild}/runs"), post(handlers::post_run))
        .route(&format!("{guild}/runs/{{run_id}}"), get(handlers::get_run))
        .route(
            &format!("{guild}/runs/{{run_id}}/reactions/{{user_id}}"),
            put(handlers::put_reaction),
        )
        .route(
            &format!("{guild}/runs/{{run_id}}/complete"),
            post(handlers::post_run_complete),
        )
        .route(&format!("{guild}/key-pops"), post(handlers::post_key_pop))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Bind `host:port` and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), RaidledgerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RaidledgerError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RaidledgerError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_from_gateway_config() {
        let gateway = GatewayConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 3100,
            bearer_token: Some("tok".to_string()),
        };
        let config = ServerConfig::from(&gateway);
        assert_eq!(config.port, 3100);
        assert_eq!(config.bearer_token.as_deref(), Some("tok"));

        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(!debug.contains("tok\""));
    }
}
