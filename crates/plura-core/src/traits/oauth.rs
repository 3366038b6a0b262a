// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth authorization-code-with-PKCE capability contract.

use async_trait::async_trait;

use crate::error::PluraError;
use crate::traits::module::ProviderModule;
use crate::types::{PkceParams, TokenSet};

/// Required operation names for registry compliance validation.
pub const OAUTH_OPERATIONS: &[&str] = &[
    "generate_auth_url",
    "exchange_code",
    "refresh_token",
    "extract_api_credentials",
];

/// OAuth flow for a provider supporting authorization code + PKCE.
#[async_trait]
pub trait OAuthFlow: ProviderModule {
    /// Builds the provider's authorization URL for a new session, returning
    /// the URL and the PKCE parameters the caller must retain for the code
    /// exchange.
    fn generate_auth_url(
        &self,
        session_name: &str,
        redirect_uri: &str,
    ) -> Result<(String, PkceParams), PluraError>;

    /// Exchanges an authorization code for tokens, proving possession of
    /// the PKCE verifier.
    async fn exchange_code(
        &self,
        code: &str,
        pkce: &PkceParams,
        session_name: &str,
    ) -> Result<TokenSet, PluraError>;

    /// Obtains fresh tokens from a refresh token.
    ///
    /// Returns [`PluraError::Auth`] when the provider rejects the refresh
    /// token as invalid or revoked (terminal), [`PluraError::Provider`] for
    /// transport-class failures (transient).
    async fn refresh_token(
        &self,
        refresh_token: &str,
        session_name: &str,
    ) -> Result<TokenSet, PluraError>;

    /// Derives the credential payload stored on the session from a token
    /// set. Provider-specific shape, opaque to callers.
    fn extract_api_credentials(
        &self,
        tokens: &TokenSet,
        session_name: &str,
    ) -> Result<serde_json::Value, PluraError>;
}
