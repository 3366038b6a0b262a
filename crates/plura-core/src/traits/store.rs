// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External session store contract.

use async_trait::async_trait;

use crate::error::PluraError;
use crate::types::Session;

/// Persistence boundary for sessions. The application hosting Plura owns
/// the actual storage; this layer only reads and writes through it.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get(&self, id: &str) -> Result<Option<Session>, PluraError>;

    /// Inserts a new session. The store assigns version 0.
    async fn insert(&self, session: Session) -> Result<(), PluraError>;

    /// Updates an existing session, succeeding only when the stored version
    /// still equals `expected_version`; the stored version then increments.
    /// Returns [`PluraError::StoreConflict`] when a concurrent writer won.
    async fn update(
        &self,
        session: Session,
        expected_version: u64,
    ) -> Result<(), PluraError>;

    async fn delete(&self, id: &str) -> Result<(), PluraError>;
}
