// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the quota service.
//!
//! Exposes role configuration, point resolution, ledger writes, runs, and
//! reports as JSON over axum. Everything under `/v1` requires a bearer
//! token; `/health` is public.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{GatewayState, ServerConfig, router, start_server};
