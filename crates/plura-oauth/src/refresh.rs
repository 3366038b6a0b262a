// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background token refresh scheduling.
//!
//! Refresh jobs are delivered by the application's job scheduler; this
//! module decides when to schedule them and what a fired job does. Refreshes
//! for the same session are serialized through a per-id async mutex so
//! at-least-once delivery never produces concurrent refreshes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use plura_core::{
    JobScheduler, PluraError, RefreshJob, Session, SessionStore, TokenSet,
};
use plura_registry::ProviderRegistry;

/// Minimum refresh margin before expiry.
const MIN_MARGIN_SECS: i64 = 5 * 60;

/// Maximum horizon a refresh is scheduled out to.
const MAX_HORIZON_SECS: i64 = 24 * 60 * 60;

/// When to refresh a token that expires at `expires_at`.
///
/// The margin is one fifth of the remaining lifetime, floored at five
/// minutes; the result is clamped to at most 24 hours out and never in the
/// past.
pub fn compute_refresh_at(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> DateTime<Utc> {
    let lifetime_secs = (expires_at - now).num_seconds().max(0);
    let margin_secs = (lifetime_secs / 5).max(MIN_MARGIN_SECS);
    let refresh_at = expires_at - Duration::seconds(margin_secs);

    let horizon = now + Duration::seconds(MAX_HORIZON_SECS);
    refresh_at.min(horizon).max(now)
}

/// Schedules and executes token refreshes.
pub struct RefreshScheduler {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn SessionStore>,
    scheduler: Arc<dyn JobScheduler>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RefreshScheduler {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn SessionStore>,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            registry,
            store,
            scheduler,
            locks: DashMap::new(),
        }
    }

    /// Schedules the first refresh for a freshly authenticated session.
    /// Sessions without an expiry (API keys) never get one.
    pub async fn schedule_initial(&self, session: &Session) -> Result<(), PluraError> {
        let Some(expires_at) = session.expires_at else {
            return Ok(());
        };
        let run_at = compute_refresh_at(Utc::now(), expires_at);
        debug!(session_id = %session.id, %run_at, "scheduling initial token refresh");
        self.scheduler
            .schedule(
                RefreshJob {
                    provider: session.provider,
                    session_id: session.id.clone(),
                    retry_count: 0,
                },
                run_at,
            )
            .await
    }

    /// Executes one fired refresh job.
    ///
    /// Transient failures propagate as `Err` so the external scheduler
    /// retries with its backoff; terminal failures mark the session
    /// `needs_reauth`, persist it, and return `Ok` so the chain stops.
    pub async fn run(&self, job: RefreshJob) -> Result<(), PluraError> {
        let lock = self
            .locks
            .entry(job.session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let Some(session) = self.store.get(&job.session_id).await? else {
            // Session was deleted; the chain dies with it.
            debug!(session_id = %job.session_id, "refresh fired for deleted session");
            return Ok(());
        };

        if session.needs_reauth {
            return Ok(());
        }

        let Some(expires_at) = session.expires_at else {
            return Ok(());
        };

        // A concurrent refresh (or a duplicate delivery) already renewed the
        // token: the stored expiry is not yet inside its refresh window.
        let now = Utc::now();
        let refresh_at = compute_refresh_at(now, expires_at);
        if now < refresh_at {
            debug!(
                session_id = %session.id,
                "token already current, rescheduling"
            );
            return self
                .scheduler
                .schedule(
                    RefreshJob {
                        provider: session.provider,
                        session_id: session.id.clone(),
                        retry_count: 0,
                    },
                    refresh_at,
                )
                .await;
        }

        self.refresh_session(session).await
    }

    async fn refresh_session(&self, session: Session) -> Result<(), PluraError> {
        let oauth = self.registry.oauth(session.provider)?;

        let Some(refresh_token) = session
            .credentials
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
        else {
            warn!(session_id = %session.id, "session has no refresh token");
            return self.mark_needs_reauth(session).await;
        };

        match oauth
            .refresh_token(&refresh_token, &session.display_name)
            .await
        {
            Ok(tokens) => {
                // Providers may omit the refresh token on refresh responses;
                // the previous one stays valid then.
                let tokens = TokenSet {
                    refresh_token: tokens.refresh_token.or(Some(refresh_token)),
                    ..tokens
                };
                let credentials =
                    oauth.extract_api_credentials(&tokens, &session.display_name)?;

                let expected_version = session.version;
                let mut updated = session;
                updated.credentials = credentials;
                updated.expires_at = tokens.expires_at;
                self.store.update(updated.clone(), expected_version).await?;

                info!(session_id = %updated.id, "token refreshed");
                if let Some(next_expiry) = updated.expires_at {
                    let run_at = compute_refresh_at(Utc::now(), next_expiry);
                    self.scheduler
                        .schedule(
                            RefreshJob {
                                provider: updated.provider,
                                session_id: updated.id,
                                retry_count: 0,
                            },
                            run_at,
                        )
                        .await?;
                }
                Ok(())
            }
            Err(PluraError::Auth { message, .. }) => {
                // Invalid or revoked refresh token. Never log token material.
                warn!(
                    session_id = %session.id,
                    reason = %message,
                    "refresh token rejected, session needs re-authentication"
                );
                self.mark_needs_reauth(session).await
            }
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "transient refresh failure");
                Err(err)
            }
        }
    }

    async fn mark_needs_reauth(&self, session: Session) -> Result<(), PluraError> {
        let expected_version = session.version;
        let mut updated = session;
        updated.needs_reauth = true;
        self.store.update(updated, expected_version).await
    }
}
