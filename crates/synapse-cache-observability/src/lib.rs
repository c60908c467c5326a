// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # synapse-cache-observability
//!
//! Logging setup shared by the synapse cache crates, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: per-run log folders with one file per crate

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Crate names accepted by `--debug-<crate>` flags
pub const KNOWN_CRATES: &[&str] = &[
    "synapse-cache",
    "synapse-cache-core",
    "synapse-cache-config",
    "synapse-cache-observability",
];
