// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth callback HTTP endpoint built on axum.
//!
//! Serves `GET /auth/callback?code&state`; every other path is a 404. The
//! state token is consumed exactly once before anything else happens, so a
//! replayed or duplicated callback can never re-run the code exchange.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use plura_core::{AuthKind, NotificationBus, PluraError, Session, SessionStore};
use plura_registry::ProviderRegistry;

use crate::refresh::RefreshScheduler;
use crate::state::OAuthStateMap;

/// Shared state for callback request handlers.
#[derive(Clone)]
pub struct CallbackState {
    pub registry: Arc<ProviderRegistry>,
    pub states: Arc<OAuthStateMap>,
    pub store: Arc<dyn SessionStore>,
    pub refresher: Arc<RefreshScheduler>,
    pub bus: Arc<dyn NotificationBus>,
    /// state token -> local waiter for flow completion.
    waiters: Arc<DashMap<String, oneshot::Sender<String>>>,
}

impl CallbackState {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        states: Arc<OAuthStateMap>,
        store: Arc<dyn SessionStore>,
        refresher: Arc<RefreshScheduler>,
        bus: Arc<dyn NotificationBus>,
    ) -> Self {
        Self {
            registry,
            states,
            store,
            refresher,
            bus,
            waiters: Arc::new(DashMap::new()),
        }
    }

    /// Registers a local waiter for a pending attempt. The receiver resolves
    /// to the new session id when the callback completes.
    pub fn register_waiter(&self, state_token: &str) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(state_token.to_string(), tx);
        rx
    }
}

/// Query parameters of the provider redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

/// Callback server configuration.
#[derive(Debug, Clone)]
pub struct CallbackServerConfig {
    pub host: String,
    pub port: u16,
}

/// Start the callback HTTP server.
///
/// Serves `GET /auth/callback`; axum's default fallback answers everything
/// else with 404.
pub async fn start_server(
    config: &CallbackServerConfig,
    state: CallbackState,
) -> Result<(), PluraError> {
    let app = Router::new()
        .route("/auth/callback", get(get_callback))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| PluraError::Internal(format!(
                "failed to bind callback server to {addr}: {e}"
            )))?;

    tracing::info!("callback server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| PluraError::Internal(format!("callback server error: {e}")))?;

    Ok(())
}

/// GET /auth/callback
pub async fn get_callback(
    State(state): State<CallbackState>,
    Query(query): Query<CallbackQuery>,
) -> (StatusCode, Html<String>) {
    match process_callback(&state, &query).await {
        Ok(_) => (
            StatusCode::OK,
            Html(
                "<html><body><h1>Authentication complete</h1>\
                 <p>You can close this window.</p></body></html>"
                    .to_string(),
            ),
        ),
        Err(message) => (
            StatusCode::BAD_REQUEST,
            Html(format!(
                "<html><body><h1>Authentication failed</h1><p>{message}</p></body></html>"
            )),
        ),
    }
}

/// Runs the callback protocol, returning the new session id.
///
/// The state entry is consumed before anything else and never restored, so
/// a failed exchange requires restarting the whole flow.
pub async fn process_callback(
    state: &CallbackState,
    query: &CallbackQuery,
) -> Result<String, String> {
    let Some(entry) = state.states.take(&query.state).await else {
        warn!("callback with unknown or expired state token");
        return Err("unknown or expired authorization attempt".to_string());
    };

    let oauth = state
        .registry
        .oauth(entry.provider)
        .map_err(|e| e.to_string())?;

    let tokens = oauth
        .exchange_code(&query.code, &entry.pkce, &entry.session_name)
        .await
        .map_err(|e| {
            warn!(provider = %entry.provider, error = %e, "code exchange failed");
            "code exchange failed".to_string()
        })?;

    let credentials = oauth
        .extract_api_credentials(&tokens, &entry.session_name)
        .map_err(|e| e.to_string())?;

    let session = Session {
        id: uuid::Uuid::new_v4().to_string(),
        provider: entry.provider,
        auth_kind: AuthKind::OAuth,
        display_name: entry.session_name.clone(),
        credentials,
        expires_at: tokens.expires_at,
        needs_reauth: false,
        version: 0,
    };

    state
        .store
        .insert(session.clone())
        .await
        .map_err(|e| e.to_string())?;

    if let Err(e) = state.refresher.schedule_initial(&session).await {
        warn!(session_id = %session.id, error = %e, "failed to schedule initial refresh");
    }

    let payload = serde_json::json!({
        "provider": entry.provider,
        "session_name": entry.session_name,
    });
    if let Err(e) = state.bus.broadcast("auth.completed", payload).await {
        warn!(error = %e, "auth.completed broadcast failed");
    }

    if let Some((_, waiter)) = state.waiters.remove(&query.state) {
        // Receiver may have been dropped; that's fine.
        let _ = waiter.send(session.id.clone());
    }

    info!(
        provider = %entry.provider,
        session_id = %session.id,
        "oauth flow completed"
    );
    Ok(session.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use plura_core::traits::OAuthFlow;
    use plura_core::{JobScheduler, PkceParams, ProviderIdentity, ProviderModule, TokenSet};
    use plura_registry::RegistryBuilder;
    use plura_test_utils::{MemorySessionStore, MockBus, MockScheduler};

    use crate::pkce::generate_pkce;

    struct ScriptedOAuth {
        fail_exchange: bool,
    }

    impl ProviderModule for ScriptedOAuth {
        fn name(&self) -> &str {
            "scripted-oauth"
        }
        fn provider(&self) -> ProviderIdentity {
            ProviderIdentity::Anthropic
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn operations(&self) -> Vec<&'static str> {
            vec![
                "generate_auth_url",
                "exchange_code",
                "refresh_token",
                "extract_api_credentials",
            ]
        }
    }

    #[async_trait]
    impl OAuthFlow for ScriptedOAuth {
        fn generate_auth_url(
            &self,
            _session_name: &str,
            _redirect_uri: &str,
        ) -> Result<(String, PkceParams), PluraError> {
            unimplemented!("not under test")
        }

        async fn exchange_code(
            &self,
            code: &str,
            _pkce: &PkceParams,
            _session_name: &str,
        ) -> Result<TokenSet, PluraError> {
            if self.fail_exchange {
                return Err(PluraError::Auth {
                    message: "invalid code".into(),
                    source: None,
                });
            }
            Ok(TokenSet {
                access_token: format!("access-for-{code}"),
                refresh_token: Some("rt-1".into()),
                expires_at: Some(Utc::now() + Duration::seconds(3600)),
                token_type: "Bearer".into(),
                scopes: vec![],
            })
        }

        async fn refresh_token(
            &self,
            _refresh_token: &str,
            _session_name: &str,
        ) -> Result<TokenSet, PluraError> {
            unimplemented!("not under test")
        }

        fn extract_api_credentials(
            &self,
            tokens: &TokenSet,
            _session_name: &str,
        ) -> Result<serde_json::Value, PluraError> {
            Ok(serde_json::json!({
                "access_token": tokens.access_token,
                "refresh_token": tokens.refresh_token,
            }))
        }
    }

    struct Harness {
        state: CallbackState,
        store: Arc<MemorySessionStore>,
        scheduler: Arc<MockScheduler>,
        bus: Arc<MockBus>,
    }

    fn harness(fail_exchange: bool) -> Harness {
        let registry = Arc::new(
            RegistryBuilder::new()
                .oauth(Arc::new(ScriptedOAuth { fail_exchange }))
                .build(),
        );
        let states = Arc::new(OAuthStateMap::new());
        let store = Arc::new(MemorySessionStore::new());
        let scheduler = Arc::new(MockScheduler::new());
        let bus = Arc::new(MockBus::new());
        let refresher = Arc::new(RefreshScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&scheduler) as Arc<dyn JobScheduler>,
        ));
        let state = CallbackState::new(
            registry,
            states,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            refresher,
            Arc::clone(&bus) as Arc<dyn NotificationBus>,
        );
        Harness {
            state,
            store,
            scheduler,
            bus,
        }
    }

    #[tokio::test]
    async fn successful_callback_creates_session_and_notifies() {
        let h = harness(false);
        let token = h
            .state
            .states
            .put(ProviderIdentity::Anthropic, "work", generate_pkce())
            .await;
        let waiter = h.state.register_waiter(&token);

        let query = CallbackQuery {
            code: "auth-code".into(),
            state: token,
        };
        let session_id = process_callback(&h.state, &query).await.unwrap();

        let session = h.store.get(&session_id).await.unwrap().unwrap();
        assert_eq!(session.display_name, "work");
        assert_eq!(session.auth_kind, AuthKind::OAuth);
        assert_eq!(session.credentials["access_token"], "access-for-auth-code");

        // First refresh scheduled, completion broadcast, waiter signalled.
        assert_eq!(h.scheduler.scheduled_count(), 1);
        let broadcasts = h.bus.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].0, "auth.completed");
        assert_eq!(broadcasts[0].1["session_name"], "work");
        assert_eq!(waiter.await.unwrap(), session_id);
    }

    #[tokio::test]
    async fn unknown_state_is_rejected() {
        let h = harness(false);
        let query = CallbackQuery {
            code: "auth-code".into(),
            state: "bogus".into(),
        };
        let err = process_callback(&h.state, &query).await.unwrap_err();
        assert!(err.contains("unknown or expired"));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn replayed_callback_is_rejected() {
        let h = harness(false);
        let token = h
            .state
            .states
            .put(ProviderIdentity::Anthropic, "work", generate_pkce())
            .await;

        let query = CallbackQuery {
            code: "auth-code".into(),
            state: token,
        };
        process_callback(&h.state, &query).await.unwrap();

        // Same state again: the entry was consumed.
        let err = process_callback(&h.state, &query).await.unwrap_err();
        assert!(err.contains("unknown or expired"));
    }

    #[tokio::test]
    async fn failed_exchange_persists_nothing_and_consumes_state() {
        let h = harness(true);
        let token = h
            .state
            .states
            .put(ProviderIdentity::Anthropic, "work", generate_pkce())
            .await;

        let query = CallbackQuery {
            code: "bad-code".into(),
            state: token.clone(),
        };
        let err = process_callback(&h.state, &query).await.unwrap_err();
        assert!(err.contains("code exchange failed"));

        assert!(h.store.is_empty());
        assert_eq!(h.scheduler.scheduled_count(), 0);
        assert!(h.bus.broadcasts().is_empty());
        // State is never restored after a failed exchange.
        assert!(h.state.states.take(&token).await.is_none());
    }
}
