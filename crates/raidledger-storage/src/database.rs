// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use raidledger_core::RaidledgerError;
use tracing::debug;

use crate::migrations;

/// Handle to the SQLite database. Cloning shares the same background thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, RaidledgerError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, RaidledgerError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(RaidledgerError::storage)?;

        conn.call(move |conn| -> Result<(), RaidledgerError> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            ))
            .map_err(RaidledgerError::storage)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(unwrap_call_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), RaidledgerError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(RaidledgerError::storage)?;
        debug!("database closed");
        Ok(())
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), RaidledgerError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into `RaidledgerError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> RaidledgerError {
    RaidledgerError::storage(e)
}

/// Surface errors produced inside a closure that already returns `RaidledgerError`.
fn unwrap_call_err(e: tokio_rusqlite::Error<RaidledgerError>) -> RaidledgerError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        tokio_rusqlite::Error::ConnectionClosed => {
            RaidledgerError::Internal("database connection closed".to_string())
        }
        other => RaidledgerError::Internal(format!("database call failed: {other:?}")),
    }
}
