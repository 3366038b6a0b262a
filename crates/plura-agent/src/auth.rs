// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-level authentication over the provider registry.
//!
//! Generic over providers: the service resolves the right module through
//! the registry and drives whichever flow the session kind requires. A
//! failed exchange or key validation never persists a session.

use std::sync::Arc;

use tracing::{debug, info};

use plura_core::traits::SessionStore;
use plura_core::{
    AuthKind, PluraError, ProviderIdentity, RefreshJob, Session, SessionOptions,
};
use plura_oauth::{OAuthStateMap, RefreshScheduler};
use plura_registry::ProviderRegistry;

/// What starting a session produced.
#[derive(Debug, Clone)]
pub enum SessionStart {
    /// OAuth: the user must visit the authorization URL; the session is
    /// created later by the callback handler.
    Authorization {
        authorization_url: String,
        state_token: String,
    },
    /// API key: the key was validated and proven, the session exists now.
    Created { session: Session },
}

/// Creates, deletes, and manually refreshes sessions.
pub struct AuthService {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn SessionStore>,
    states: Arc<OAuthStateMap>,
    refresher: Arc<RefreshScheduler>,
    redirect_uri: String,
}

impl AuthService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn SessionStore>,
        states: Arc<OAuthStateMap>,
        refresher: Arc<RefreshScheduler>,
        redirect_uri: String,
    ) -> Self {
        Self {
            registry,
            store,
            states,
            refresher,
            redirect_uri,
        }
    }

    /// Starts a new session. OAuth sessions return an authorization URL
    /// carrying a one-shot state token; API-key sessions are validated,
    /// proven against the provider, and persisted immediately.
    pub async fn create_session(
        &self,
        options: SessionOptions,
    ) -> Result<SessionStart, PluraError> {
        match options.auth_kind {
            AuthKind::OAuth => {
                self.start_oauth(options.provider, &options.display_name)
                    .await
            }
            AuthKind::ApiKey => {
                let key = options.api_key.as_deref().ok_or_else(|| PluraError::Auth {
                    message: "API-key sessions require a key".into(),
                    source: None,
                })?;
                self.create_api_key_session(options.provider, &options.display_name, key)
                    .await
            }
        }
    }

    async fn start_oauth(
        &self,
        provider: ProviderIdentity,
        display_name: &str,
    ) -> Result<SessionStart, PluraError> {
        let oauth = self.registry.oauth(provider)?;
        let (url, pkce) = oauth.generate_auth_url(display_name, &self.redirect_uri)?;
        let state_token = self.states.put(provider, display_name, pkce).await;
        let authorization_url = format!("{url}&state={state_token}");
        debug!(%provider, display_name, "authorization URL issued");
        Ok(SessionStart::Authorization {
            authorization_url,
            state_token,
        })
    }

    async fn create_api_key_session(
        &self,
        provider: ProviderIdentity,
        display_name: &str,
        key: &str,
    ) -> Result<SessionStart, PluraError> {
        let auth = self.registry.api_key(provider)?;
        auth.validate_api_key(key)?;
        let client = auth.create_client(key, &Default::default())?;
        auth.test_connection(&client).await?;

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            provider,
            auth_kind: AuthKind::ApiKey,
            display_name: display_name.to_string(),
            credentials: serde_json::json!({ "api_key": key }),
            expires_at: None,
            needs_reauth: false,
            version: 0,
        };
        self.store.insert(session.clone()).await?;
        info!(%provider, session_id = %session.id, "API-key session created");
        Ok(SessionStart::Created { session })
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), PluraError> {
        self.store.delete(session_id).await?;
        info!(session_id, "session deleted");
        Ok(())
    }

    /// Forces a refresh now instead of waiting for the scheduled job.
    pub async fn refresh_tokens(&self, session_id: &str) -> Result<(), PluraError> {
        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| PluraError::SessionNotFound {
                id: session_id.to_string(),
            })?;
        self.refresher
            .run(RefreshJob {
                provider: session.provider,
                session_id: session.id,
                retry_count: 0,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plura_core::traits::{
        ApiKeyAuth, OAuthFlow, ProviderModule, API_KEY_OPERATIONS, OAUTH_OPERATIONS,
    };
    use plura_core::{ClientOptions, PkceParams, ProviderClient, TokenSet};
    use plura_registry::RegistryBuilder;
    use plura_test_utils::{MemorySessionStore, MockScheduler};

    struct ScriptedOAuth;

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
            OAUTH_OPERATIONS.to_vec()
        }
    }

    #[async_trait]
    impl OAuthFlow for ScriptedOAuth {
        fn generate_auth_url(
            &self,
            _session_name: &str,
            redirect_uri: &str,
        ) -> Result<(String, PkceParams), PluraError> {
            Ok((
                format!("https://example.test/authorize?redirect_uri={redirect_uri}"),
                PkceParams {
                    code_verifier: "v".into(),
                    code_challenge: "c".into(),
                    challenge_method: "S256".into(),
                },
            ))
        }

        async fn exchange_code(
            &self,
            _code: &str,
            _pkce: &PkceParams,
            _session_name: &str,
        ) -> Result<TokenSet, PluraError> {
            unreachable!("not exercised here")
        }

        async fn refresh_token(
            &self,
            _refresh_token: &str,
            _session_name: &str,
        ) -> Result<TokenSet, PluraError> {
            unreachable!("not exercised here")
        }

        fn extract_api_credentials(
            &self,
            _tokens: &TokenSet,
            _session_name: &str,
        ) -> Result<serde_json::Value, PluraError> {
            unreachable!("not exercised here")
        }
    }

    struct ScriptedApiKey {
        connection_ok: bool,
    }

    impl ProviderModule for ScriptedApiKey {
        fn name(&self) -> &str {
            "scripted-api-key"
        }
        fn provider(&self) -> ProviderIdentity {
            ProviderIdentity::Anthropic
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn operations(&self) -> Vec<&'static str> {
            API_KEY_OPERATIONS.to_vec()
        }
    }

    #[async_trait]
    impl ApiKeyAuth for ScriptedApiKey {
        fn validate_api_key(&self, key: &str) -> Result<(), PluraError> {
            if key.starts_with("ok-") {
                Ok(())
            } else {
                Err(PluraError::Auth {
                    message: "bad key shape".into(),
                    source: None,
                })
            }
        }

        fn create_client(
            &self,
            _key: &str,
            _options: &ClientOptions,
        ) -> Result<ProviderClient, PluraError> {
            Ok(ProviderClient {
                provider: ProviderIdentity::Anthropic,
                base_url: "https://example.test".into(),
                default_headers: vec![],
                timeout: std::time::Duration::from_secs(30),
            })
        }

        async fn test_connection(&self, _client: &ProviderClient) -> Result<(), PluraError> {
            if self.connection_ok {
                Ok(())
            } else {
                Err(PluraError::Auth {
                    message: "key rejected by provider".into(),
                    source: None,
                })
            }
        }
    }

    fn options(
        auth_kind: AuthKind,
        display_name: &str,
        api_key: Option<&str>,
    ) -> SessionOptions {
        SessionOptions {
            provider: ProviderIdentity::Anthropic,
            auth_kind,
            display_name: display_name.into(),
            api_key: api_key.map(str::to_owned),
        }
    }

    fn service(connection_ok: bool) -> (AuthService, Arc<MemorySessionStore>) {
        let registry = Arc::new(
            RegistryBuilder::new()
                .oauth(Arc::new(ScriptedOAuth))
                .api_key(Arc::new(ScriptedApiKey { connection_ok }))
                .build(),
        );
        let store = Arc::new(MemorySessionStore::new());
        let states = Arc::new(OAuthStateMap::new());
        let refresher = Arc::new(RefreshScheduler::new(
            registry.clone(),
            store.clone(),
            Arc::new(MockScheduler::new()),
        ));
        (
            AuthService::new(
                registry,
                store.clone(),
                states,
                refresher,
                "http://127.0.0.1:8477/auth/callback".into(),
            ),
            store,
        )
    }

    #[tokio::test]
    async fn oauth_start_returns_url_with_state_and_persists_nothing() {
        let (service, store) = service(true);
        let start = service
            .create_session(options(AuthKind::OAuth, "work", None))
            .await
            .unwrap();

        match start {
            SessionStart::Authorization {
                authorization_url,
                state_token,
            } => {
                assert!(authorization_url.contains(&format!("&state={state_token}")));
                assert!(authorization_url.starts_with("https://example.test/authorize?"));
            }
            other => panic!("expected Authorization, got {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn api_key_session_is_validated_proven_and_persisted() {
        let (service, store) = service(true);
        let start = service
            .create_session(options(AuthKind::ApiKey, "work", Some("ok-123")))
            .await
            .unwrap();

        let SessionStart::Created { session } = start else {
            panic!("expected Created");
        };
        assert_eq!(session.credentials["api_key"], "ok-123");
        assert!(session.expires_at.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn failed_connection_test_persists_nothing() {
        let (service, store) = service(false);
        let err = service
            .create_session(options(AuthKind::ApiKey, "work", Some("ok-123")))
            .await
            .unwrap_err();
        assert!(matches!(err, PluraError::Auth { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalid_key_shape_persists_nothing() {
        let (service, store) = service(true);
        let err = service
            .create_session(options(AuthKind::ApiKey, "work", Some("wrong-prefix")))
            .await
            .unwrap_err();
        assert!(matches!(err, PluraError::Auth { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_rejected_up_front() {
        let (service, _store) = service(true);
        let err = service
            .create_session(options(AuthKind::ApiKey, "work", None))
            .await
            .unwrap_err();
        assert!(matches!(err, PluraError::Auth { .. }));
    }

    #[tokio::test]
    async fn delete_session_removes_it() {
        let (service, store) = service(true);
        service
            .create_session(options(AuthKind::ApiKey, "work", Some("ok-123")))
            .await
            .unwrap();

        let sessions = store.len();
        assert_eq!(sessions, 1);

        let start = service
            .create_session(options(AuthKind::ApiKey, "other", Some("ok-456")))
            .await
            .unwrap();
        let SessionStart::Created { session } = start else {
            panic!("expected Created");
        };
        service.delete_session(&session.id).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn refresh_tokens_for_unknown_session_is_not_found() {
        let (service, _store) = service(true);
        let err = service.refresh_tokens("nope").await.unwrap_err();
        assert!(matches!(err, PluraError::SessionNotFound { .. }));
    }
}
