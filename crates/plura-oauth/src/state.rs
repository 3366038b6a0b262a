// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending OAuth attempt tracking.
//!
//! Each in-flight authorization attempt is held under its unguessable state
//! token until the callback consumes it or the TTL evicts it. `take` is the
//! single read path and removes the entry atomically, so a replayed callback
//! can never recover the PKCE verifier.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use plura_core::{PkceParams, ProviderIdentity};

use crate::pkce::generate_state_token;

/// One pending authorization attempt.
#[derive(Debug, Clone)]
pub struct OAuthStateEntry {
    pub provider: ProviderIdentity,
    pub session_name: String,
    pub pkce: PkceParams,
    created_at: Instant,
}

/// Mutex-guarded map of pending attempts with TTL eviction.
pub struct OAuthStateMap {
    entries: Mutex<HashMap<String, OAuthStateEntry>>,
    ttl: Duration,
}

impl OAuthStateMap {
    /// Default attempt lifetime: ten minutes.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Stores a pending attempt and returns its freshly generated state
    /// token.
    pub async fn put(
        &self,
        provider: ProviderIdentity,
        session_name: impl Into<String>,
        pkce: PkceParams,
    ) -> String {
        let token = generate_state_token();
        let entry = OAuthStateEntry {
            provider,
            session_name: session_name.into(),
            pkce,
            created_at: Instant::now(),
        };
        self.entries.lock().await.insert(token.clone(), entry);
        token
    }

    /// Atomically removes and returns the attempt for a state token.
    ///
    /// Returns `None` for unknown tokens, already-taken tokens, and expired
    /// entries (which are dropped on the spot).
    pub async fn take(&self, token: &str) -> Option<OAuthStateEntry> {
        let mut entries = self.entries.lock().await;
        let entry = entries.remove(token)?;
        if entry.created_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry)
    }

    /// Drops all expired entries. Called periodically by the host.
    pub async fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| e.created_at.elapsed() <= self.ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for OAuthStateMap {
    fn default() -> Self {
        Self::new()
    }
}
