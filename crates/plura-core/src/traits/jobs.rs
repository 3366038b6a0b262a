// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External job scheduler contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::PluraError;
use crate::types::RefreshJob;

/// Delayed-execution boundary for token refresh jobs. Implementations
/// guarantee at-least-once delivery with bounded retries on transient
/// failure.
#[async_trait]
pub trait JobScheduler: Send + Sync + 'static {
    async fn schedule(
        &self,
        job: RefreshJob,
        run_at: DateTime<Utc>,
    ) -> Result<(), PluraError>;
}
