// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plura provider layer.

use thiserror::Error;

/// The primary error type used across all Plura contracts and core operations.
#[derive(Debug, Error)]
pub enum PluraError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM provider errors (API failure, malformed wire payload, transport).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication flow errors (code exchange, invalid key, invalid state).
    /// Terminal per attempt: the caller must restart the flow.
    #[error("auth error: {message}")]
    Auth {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A refresh token was rejected as invalid or revoked. The session must
    /// be re-authenticated; the refresh chain stops here.
    #[error("session {session_id} requires re-authentication")]
    ReauthRequired { session_id: String },

    /// No implementation is registered for the requested (provider, operation)
    /// pair. Carries the registration key that was looked up.
    #[error("no provider module registered under '{key}'")]
    NotRegistered { key: String },

    /// Session store errors (lookup failure, serialization, backend).
    #[error("session store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An optimistic-concurrency update lost the race: the stored session
    /// version no longer matches the expected version.
    #[error("session {id} was modified concurrently")]
    StoreConflict { id: String },

    /// The requested session does not exist in the store.
    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PluraError {
    /// True for error classes the external job scheduler should retry.
    ///
    /// Auth-class failures and conflicts are terminal per attempt; provider
    /// transport errors and timeouts are transient.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PluraError::Provider { .. } | PluraError::Timeout { .. } | PluraError::Store { .. }
        )
    }
}
