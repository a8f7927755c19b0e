// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `raidledger serve` command implementation.
//!
//! Opens SQLite storage, builds the quota service, and serves the HTTP API
//! until SIGINT or SIGTERM.

use std::sync::Arc;

use raidledger_config::RaidledgerConfig;
use raidledger_core::{RaidledgerError, StorageAdapter};
use raidledger_gateway::{AuthConfig, GatewayState, ServerConfig, start_server};
use tracing::{info, warn};

/// Runs the `raidledger serve` command.
pub async fn run_serve(config: RaidledgerConfig) -> Result<(), RaidledgerError> {
    if !config.gateway.enabled {
        return Err(RaidledgerError::Config(
            "gateway.enabled is false; nothing to serve".to_string(),
        ));
    }

    let (storage, quota) = crate::open_service(&config).await?;
    let storage = Arc::new(storage);
    info!(
        service = %config.service.name,
        database = %config.storage.database_path,
        "storage initialized"
    );

    let server_config = ServerConfig::from(&config.gateway);
    let state = GatewayState {
        quota,
        storage: storage.clone(),
        auth: AuthConfig {
            bearer_token: server_config.bearer_token.clone(),
        },
    };

    let served = start_server(&server_config, state, shutdown_signal()).await;

    info!("closing storage");
    storage.close().await?;
    served
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                    _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = ctrl_c.await;
                info!("received SIGINT (Ctrl+C), initiating shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        info!("received Ctrl+C, initiating shutdown");
    }
}
