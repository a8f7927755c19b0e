// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for raidledger integration tests.
//!
//! [`TestHarness`] wires a temp SQLite database, the storage adapter, and a
//! [`raidledger_quota::QuotaService`] together, with helpers to seed runs and
//! ledger rows.

pub mod harness;

pub use harness::{GUILD_ID, TestHarness, TestHarnessBuilder};
