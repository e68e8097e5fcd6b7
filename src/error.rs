// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync error types.

use crate::config::ConfigError;

/// Errors surfaced by the session, executor, client and orchestrator layers.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unauthorized after re-authentication: {path}")]
    Unauthorized { path: String },

    #[error("Rate limited after {attempts} attempts: {path}")]
    RateLimited { path: String, attempts: u32 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SyncError {
    /// Whether the error came from a condition that may clear on its own
    /// (connection failures and provider throttling).
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Network(_) | SyncError::RateLimited { .. })
    }

    /// Whether the error means the configured credentials are unusable.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, SyncError::Auth(_) | SyncError::Unauthorized { .. })
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
