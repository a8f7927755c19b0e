// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::RaidledgerError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of the relational store holding runs, ledger, and quota config.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), RaidledgerError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), RaidledgerError>;
}
