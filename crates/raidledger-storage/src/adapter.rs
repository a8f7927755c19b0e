// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `StorageAdapter` lifecycle.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use raidledger_config::model::StorageConfig;
use raidledger_core::{HealthStatus, PluginAdapter, RaidledgerError, StorageAdapter};

use crate::database::Database;

/// SQLite-backed storage adapter.
///
/// The database is opened on [`StorageAdapter::initialize`]; query code
/// borrows the shared handle through [`SqliteStorage::database`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create an adapter. Nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The opened database, or an error before `initialize`.
    pub fn database(&self) -> Result<&Database, RaidledgerError> {
        self.db.get().ok_or_else(|| RaidledgerError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, RaidledgerError> {
        let Ok(db) = self.database() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(|e| RaidledgerError::HealthCheckFailed {
                name: "sqlite".to_string(),
                source: Box::new(e),
            })?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RaidledgerError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), RaidledgerError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| RaidledgerError::Storage {
            source: "storage already initialized".into(),
        })?;
        info!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RaidledgerError> {
        self.database()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
