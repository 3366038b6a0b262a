// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic OAuth authorization-code-with-PKCE flow.

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use plura_core::traits::{OAuthFlow, OAUTH_OPERATIONS};
use plura_core::{PkceParams, PluraError, ProviderIdentity, ProviderModule, TokenSet};

use crate::types::TokenResponse;

const AUTHORIZATION_URL: &str = "https://claude.ai/oauth/authorize";
const TOKEN_URL: &str = "https://console.anthropic.com/v1/oauth/token";
const CLIENT_ID: &str = "9d1c250a-e61b-44d9-88ed-5944d1962f5e";
const SCOPES: &[&str] = &["org:create_api_key", "user:profile", "user:inference"];

/// OAuth flow against Anthropic's consumer endpoints (public PKCE client,
/// no client secret).
#[derive(Debug, Clone)]
pub struct AnthropicOAuth {
    client_id: String,
    authorization_url: String,
    token_url: String,
    http: reqwest::Client,
}

impl AnthropicOAuth {
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
        debug!(session_name, "anthropic token endpoint request");
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

impl Default for AnthropicOAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for AnthropicOAuth {
    fn name(&self) -> &str {
        "anthropic-oauth"
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
impl OAuthFlow for AnthropicOAuth {
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

        debug!(session_name, "generated anthropic authorization URL");
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

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_pkce() -> PkceParams {
        PkceParams {
            code_verifier: "verifier".into(),
            code_challenge: "challenge".into(),
            challenge_method: "S256".into(),
        }
    }

    #[test]
    fn auth_url_carries_pkce_and_redirect() {
        let oauth = AnthropicOAuth::new();
        let (url, pkce) = oauth
            .generate_auth_url("work", "http://127.0.0.1:8477/auth/callback")
            .unwrap();

        assert!(url.starts_with("https://claude.ai/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(&format!("code_challenge={}", pkce.code_challenge)));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8477%2Fauth%2Fcallback"));
        assert_eq!(pkce.code_verifier.len(), 43);
    }

    #[tokio::test]
    async fn exchange_code_parses_token_response() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 3600,
            "token_type": "Bearer",
            "scope": "user:inference user:profile"
        });

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code_verifier=verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let oauth =
            AnthropicOAuth::new().with_token_url(format!("{}/token", server.uri()));
        let tokens = oauth
            .exchange_code("auth-code", &test_pkce(), "work")
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "at-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt-1"));
        assert!(tokens.expires_at.is_some());
        assert_eq!(tokens.scopes.len(), 2);
    }

    #[tokio::test]
    async fn rejected_refresh_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let oauth =
            AnthropicOAuth::new().with_token_url(format!("{}/token", server.uri()));
        let err = oauth.refresh_token("revoked", "work").await.unwrap_err();
        assert!(matches!(err, PluraError::Auth { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let oauth =
            AnthropicOAuth::new().with_token_url(format!("{}/token", server.uri()));
        let err = oauth.refresh_token("rt", "work").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn credentials_carry_tokens() {
        let oauth = AnthropicOAuth::new();
        let tokens = TokenSet {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            expires_at: None,
            token_type: "Bearer".into(),
            scopes: vec!["user:inference".into()],
        };
        let creds = oauth.extract_api_credentials(&tokens, "work").unwrap();
        assert_eq!(creds["access_token"], "at");
        assert_eq!(creds["refresh_token"], "rt");
    }
}
