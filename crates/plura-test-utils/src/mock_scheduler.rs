// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording job scheduler mock.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use plura_core::{JobScheduler, PluraError, RefreshJob};

/// A `JobScheduler` that records every scheduled job instead of running it.
#[derive(Default)]
pub struct MockScheduler {
    scheduled: Mutex<Vec<(RefreshJob, DateTime<Utc>)>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// All jobs scheduled so far, in call order.
    pub fn scheduled(&self) -> Vec<(RefreshJob, DateTime<Utc>)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }
}

#[async_trait]
impl JobScheduler for MockScheduler {
    async fn schedule(
        &self,
        job: RefreshJob,
        run_at: DateTime<Utc>,
    ) -> Result<(), PluraError> {
        self.scheduled.lock().unwrap().push((job, run_at));
        Ok(())
    }
}
