// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process implementations of the external collaborator contracts.
//!
//! A standalone `plura serve` has no surrounding application to hand it a
//! session store, a job scheduler, or a notification bus, so it carries
//! minimal in-process ones. An embedding application replaces all three
//! with its own implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use plura_core::traits::{JobScheduler, NotificationBus, SessionStore};
use plura_core::{PluraError, RefreshJob, Session};
use plura_oauth::{OAuthStateMap, RefreshScheduler};

/// Refresh jobs get this many retries before the chain is dropped.
const MAX_JOB_RETRIES: u32 = 3;

/// Delay before a failed refresh job is retried.
const JOB_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Process-local session store. Sessions do not survive a restart; OAuth
/// flows must be redone after one.
#[derive(Default)]
pub struct InProcessStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InProcessStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InProcessStore {
    async fn get(&self, id: &str) -> Result<Option<Session>, PluraError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| PluraError::Internal("session store lock poisoned".into()))?;
        Ok(sessions.get(id).cloned())
    }

    async fn insert(&self, session: Session) -> Result<(), PluraError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| PluraError::Internal("session store lock poisoned".into()))?;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn update(
        &self,
        session: Session,
        expected_version: u64,
    ) -> Result<(), PluraError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| PluraError::Internal("session store lock poisoned".into()))?;
        let Some(current) = sessions.get(&session.id) else {
            return Err(PluraError::SessionNotFound {
                id: session.id.clone(),
            });
        };
        if current.version != expected_version {
            return Err(PluraError::StoreConflict {
                id: session.id.clone(),
            });
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), PluraError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| PluraError::Internal("session store lock poisoned".into()))?;
        sessions.remove(id);
        Ok(())
    }
}

/// Scheduler backed by a channel and a worker task. `schedule` hands the
/// job to the worker, which sleeps until `run_at` and executes it through
/// the refresh scheduler.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<(RefreshJob, DateTime<Utc>)>,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(RefreshJob, DateTime<Utc>)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Sender handle for the worker, used to re-queue failed jobs.
    pub fn job_sender(&self) -> mpsc::UnboundedSender<(RefreshJob, DateTime<Utc>)> {
        self.tx.clone()
    }
}

#[async_trait]
impl JobScheduler for TokioScheduler {
    async fn schedule(
        &self,
        job: RefreshJob,
        run_at: DateTime<Utc>,
    ) -> Result<(), PluraError> {
        self.tx
            .send((job, run_at))
            .map_err(|_| PluraError::Internal("refresh worker is gone".into()))
    }
}

/// Drains the job channel, running each job at its due time. Transient
/// failures are re-queued with a flat delay until the retry budget runs
/// out; terminal failures already ended inside the refresh scheduler.
pub async fn run_refresh_worker(
    refresher: Arc<RefreshScheduler>,
    tx: mpsc::UnboundedSender<(RefreshJob, DateTime<Utc>)>,
    mut rx: mpsc::UnboundedReceiver<(RefreshJob, DateTime<Utc>)>,
) {
    while let Some((job, run_at)) = rx.recv().await {
        let refresher = Arc::clone(&refresher);
        let tx = tx.clone();
        tokio::spawn(async move {
            let delay = (run_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(delay).await;

            let session_id = job.session_id.clone();
            let retry_count = job.retry_count;
            match refresher.run(job.clone()).await {
                Ok(()) => debug!(%session_id, "refresh job completed"),
                Err(e) if retry_count < MAX_JOB_RETRIES => {
                    warn!(%session_id, retry_count, error = %e, "refresh job failed, retrying");
                    let retry = RefreshJob {
                        retry_count: retry_count + 1,
                        ..job
                    };
                    let run_at = Utc::now()
                        + chrono::Duration::from_std(JOB_RETRY_DELAY)
                            .unwrap_or(chrono::Duration::zero());
                    let _ = tx.send((retry, run_at));
                }
                Err(e) => {
                    warn!(%session_id, retry_count, error = %e, "refresh job abandoned");
                }
            }
        });
    }
}

/// Periodically drops expired authorization attempts. `take` evicts
/// lazily, but an abandoned flow whose callback never arrives would
/// otherwise sit in the map forever.
pub async fn run_state_sweeper(states: Arc<OAuthStateMap>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        let swept = states.sweep_expired().await;
        if swept > 0 {
            debug!(swept, "expired authorization attempts dropped");
        }
    }
}

/// Bus that announces events to the log. Enough for a standalone server;
/// an embedding application brings a real bus.
pub struct LogBus;

#[async_trait]
impl NotificationBus for LogBus {
    async fn broadcast(
        &self,
        topic: &str,
        payload: serde_json::Value,
    ) -> Result<(), PluraError> {
        info!(topic, %payload, "notification");
        Ok(())
    }
}
