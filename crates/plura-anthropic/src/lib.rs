// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic provider modules for the Plura unification layer.
//!
//! Implements the OAuth, API-key, streaming, and model-catalog contracts
//! against the Anthropic Messages API.

pub mod client;
pub mod oauth;
pub mod stream;
pub mod translate;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use plura_core::traits::{
    ApiKeyAuth, ChatStreaming, ModelCatalog, API_KEY_OPERATIONS, MODELS_OPERATIONS,
    STREAMING_OPERATIONS,
};
use plura_core::{
    ClientOptions, ConversationMessage, PluraError, ProviderClient, ProviderIdentity,
    ProviderModule, RawEvent, RawEventStream, Session, StreamItem, StreamOptions,
    StreamParserState,
};

use crate::client::{AnthropicAuth, AnthropicClient};
use crate::types::{ApiToolDefinition, MessageRequest};

pub use crate::oauth::AnthropicOAuth;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Builds an authenticated client from a session's credential payload.
/// OAuth sessions carry `access_token`, API-key sessions carry `api_key`.
fn client_for_session(
    session: &Session,
    api_version: &str,
    base_url: &str,
) -> Result<AnthropicClient, PluraError> {
    if session.needs_reauth {
        return Err(PluraError::ReauthRequired {
            session_id: session.id.clone(),
        });
    }
    let auth = if let Some(key) = session.credentials.get("api_key").and_then(|v| v.as_str())
    {
        AnthropicAuth::ApiKey(key.to_string())
    } else if let Some(token) = session
        .credentials
        .get("access_token")
        .and_then(|v| v.as_str())
    {
        AnthropicAuth::Bearer(token.to_string())
    } else {
        return Err(PluraError::Auth {
            message: "session carries neither api_key nor access_token".into(),
            source: None,
        });
    };
    AnthropicClient::new(auth, api_version, base_url)
}

/// API-key authentication for Anthropic.
#[derive(Debug, Clone)]
pub struct AnthropicApiKey {
    base_url: String,
    api_version: String,
}

impl AnthropicApiKey {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_api_version(mut self, version: String) -> Self {
        self.api_version = version;
        self
    }
}

impl Default for AnthropicApiKey {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for AnthropicApiKey {
    fn name(&self) -> &str {
        "anthropic-api-key"
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
impl ApiKeyAuth for AnthropicApiKey {
    fn validate_api_key(&self, key: &str) -> Result<(), PluraError> {
        if !key.starts_with("sk-ant-") {
            return Err(PluraError::Auth {
                message: "Anthropic API keys start with 'sk-ant-'".into(),
                source: None,
            });
        }
        if key.len() < 20 || key.chars().any(char::is_whitespace) {
            return Err(PluraError::Auth {
                message: "malformed Anthropic API key".into(),
                source: None,
            });
        }
        Ok(())
    }

    fn create_client(
        &self,
        key: &str,
        options: &ClientOptions,
    ) -> Result<ProviderClient, PluraError> {
        self.validate_api_key(key)?;
        Ok(ProviderClient {
            provider: ProviderIdentity::Anthropic,
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            default_headers: vec![
                ("x-api-key".to_string(), key.to_string()),
                ("anthropic-version".to_string(), self.api_version.clone()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            timeout: REQUEST_TIMEOUT,
        })
    }

    async fn test_connection(&self, client: &ProviderClient) -> Result<(), PluraError> {
        AnthropicClient::from_handle(client)?.test_connection().await
    }
}

/// Streaming chat for Anthropic.
#[derive(Debug, Clone)]
pub struct AnthropicStreaming {
    base_url: String,
    api_version: String,
}

impl AnthropicStreaming {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_api_version(mut self, version: String) -> Self {
        self.api_version = version;
        self
    }
}

impl Default for AnthropicStreaming {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for AnthropicStreaming {
    fn name(&self) -> &str {
        "anthropic-streaming"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::Anthropic
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        STREAMING_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ChatStreaming for AnthropicStreaming {
    async fn stream_chat(
        &self,
        session: &Session,
        messages: &[ConversationMessage],
        options: &StreamOptions,
    ) -> Result<RawEventStream, PluraError> {
        let client = client_for_session(session, &self.api_version, &self.base_url)?;
        let request = MessageRequest {
            model: options.model.clone(),
            messages: translate::to_api_messages(messages),
            system: options.system_prompt.clone(),
            max_tokens: options.max_tokens,
            stream: true,
            tools: if options.tools.is_empty() {
                None
            } else {
                Some(
                    options
                        .tools
                        .iter()
                        .map(|t| ApiToolDefinition {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            input_schema: t.input_schema.clone(),
                        })
                        .collect(),
                )
            },
        };
        debug!(model = %options.model, "opening anthropic message stream");
        client.stream_messages(&request).await
    }

    fn parse_stream_event(
        &self,
        event: RawEvent,
        state: StreamParserState,
    ) -> (Vec<StreamItem>, StreamParserState) {
        stream::parse_stream_event(event, state)
    }
}

/// Model catalog for Anthropic.
#[derive(Debug, Clone)]
pub struct AnthropicModels {
    base_url: String,
    api_version: String,
}

impl AnthropicModels {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_api_version(mut self, version: String) -> Self {
        self.api_version = version;
        self
    }
}

impl Default for AnthropicModels {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for AnthropicModels {
    fn name(&self) -> &str {
        "anthropic-models"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::Anthropic
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        MODELS_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ModelCatalog for AnthropicModels {
    async fn list_models(&self, session: &Session) -> Result<Vec<String>, PluraError> {
        client_for_session(session, &self.api_version, &self.base_url)?
            .list_models()
            .await
    }
}
