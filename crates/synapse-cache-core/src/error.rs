// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for synapse cache operations

/// Errors raised while populating or reading the synapse cache
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Both the aligned and the fallback allocation failed
    #[error("Out of memory: requested {requested_bytes} bytes")]
    OutOfMemory {
        /// Requested bytes
        requested_bytes: usize,
    },

    /// Optional data that was not supplied when the cache was built
    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    /// The record source failed to deliver rows
    #[error("Record source error: {0}")]
    Source(String),

    /// Operation not valid in the current cache state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for synapse cache operations
pub type Result<T> = core::result::Result<T, CacheError>;
