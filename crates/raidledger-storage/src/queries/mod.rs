// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries, one module per table group.

pub mod events;
pub mod key_pops;
pub mod overrides;
pub mod point_configs;
pub mod quota_roles;
pub mod reports;
pub mod runs;
