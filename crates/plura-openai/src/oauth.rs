// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI OAuth authorization-code-with-PKCE flow.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use plura_core::traits::{OAuthFlow, OAUTH_OPERATIONS};
use plura_core::{PkceParams, PluraError, ProviderIdentity, ProviderModule, TokenSet};

use crate::types::TokenResponse;

const AUTHORIZATION_URL: &str = "https://auth.openai.com/oauth/authorize";
const TOKEN_URL: &str = "https://auth.openai.com/oauth/token";
const CLIENT_ID: &str = "app_EMoamEEZ73f0CkXaXp7hrann";
const SCOPES: &[&str] = &["openid", "profile", "email", "offline_access"];

/// OAuth flow against OpenAI's auth service (public PKCE client, no
/// client secret).
#[derive(Debug, Clone)]
pub struct OpenAiOAuth {
    client_id: String,
    authorization_url: String,
    token_url: String,
    http: reqwest::Client,
}

impl OpenAiOAuth {
    pub fn new() -> Self {
        Self {
            client_id: CLIENT_ID.to_string(),
            authorization_url: AUTHORIZATION_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Overrides the token endpoint (for testing with wiremock).
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        session_name: &str,
    ) -> Result<TokenSet, PluraError> {
        debug!(session_name, "openai token endpoint request");
        let response = self
            .http
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| PluraError::Provider {
                message: format!("token request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            // 4xx from the token endpoint means the grant itself was
            // rejected; anything else is worth retrying.
            if matches!(status.as_u16(), 400 | 401 | 403) {
                return Err(PluraError::Auth {
                    message: format!("token endpoint rejected request ({status})"),
                    source: None,
                });
            }
            return Err(PluraError::Provider {
                message: format!("token endpoint returned {status}"),
                source: None,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| PluraError::Auth {
                message: format!("invalid token response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(TokenSet {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            expires_at: parsed
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs as i64)),
            token_type: parsed.token_type,
            scopes: parsed
                .scope
                .map(|s| s.split_whitespace().map(str::to_owned).collect())
                .unwrap_or_default(),
        })
    }
}

impl Default for OpenAiOAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for OpenAiOAuth {
    fn name(&self) -> &str {
        "openai-oauth"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::OpenAi
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        OAUTH_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl OAuthFlow for OpenAiOAuth {
    fn generate_auth_url(
        &self,
        session_name: &str,
        redirect_uri: &str,
    ) -> Result<(String, PkceParams), PluraError> {
        let pkce = plura_oauth::generate_pkce();
        let mut url = reqwest::Url::parse(&self.authorization_url)
            .map_err(|e| PluraError::Config(format!("invalid authorization URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &SCOPES.join(" "))
            .append_pair("code_challenge", &pkce.code_challenge)
            .append_pair("code_challenge_method", &pkce.challenge_method);

        debug!(session_name, "generated openai authorization URL");
        Ok((url.to_string(), pkce))
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce: &PkceParams,
        session_name: &str,
    ) -> Result<TokenSet, PluraError> {
        self.token_request(
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", &self.client_id),
                ("code_verifier", &pkce.code_verifier),
            ],
            session_name,
        )
        .await
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        session_name: &str,
    ) -> Result<TokenSet, PluraError> {
        self.token_request(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
            ],
            session_name,
        )
        .await
    }

    fn extract_api_credentials(
        &self,
        tokens: &TokenSet,
        _session_name: &str,
    ) -> Result<serde_json::Value, PluraError> {
        Ok(serde_json::json!({
            "access_token": tokens.access_token,
            "refresh_token": tokens.refresh_token,
            "token_type": tokens.token_type,
            "scopes": tokens.scopes,
        }))
    }
}
