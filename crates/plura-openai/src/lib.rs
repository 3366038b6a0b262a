// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI provider modules for the Plura unification layer.
//!
//! Implements the OAuth, API-key, streaming, and model-catalog contracts
//! against the Chat Completions API.

pub mod client;
pub mod oauth;
pub mod stream;
pub mod translate;
pub mod types;

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

use crate::client::OpenAiClient;
use crate::types::{ApiFunctionSpec, ApiMessage, ApiToolSpec, ChatRequest};

pub use crate::oauth::OpenAiOAuth;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Builds an authenticated client from a session's credential payload.
/// Both API keys and OAuth access tokens go out as Bearer tokens.
fn client_for_session(session: &Session, base_url: &str) -> Result<OpenAiClient, PluraError> {
    if session.needs_reauth {
        return Err(PluraError::ReauthRequired {
            session_id: session.id.clone(),
        });
    }
    let token = session
        .credentials
        .get("api_key")
        .or_else(|| session.credentials.get("access_token"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| PluraError::Auth {
            message: "session carries neither api_key nor access_token".into(),
            source: None,
        })?;
    OpenAiClient::new(token, base_url)
}

/// API-key authentication for OpenAI.
#[derive(Debug, Clone)]
pub struct OpenAiApiKey {
    base_url: String,
}

impl OpenAiApiKey {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Default for OpenAiApiKey {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for OpenAiApiKey {
    fn name(&self) -> &str {
        "openai-api-key"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::OpenAi
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        API_KEY_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ApiKeyAuth for OpenAiApiKey {
    fn validate_api_key(&self, key: &str) -> Result<(), PluraError> {
        if !key.starts_with("sk-") {
            return Err(PluraError::Auth {
                message: "OpenAI API keys start with 'sk-'".into(),
                source: None,
            });
        }
        if key.len() < 20 || key.chars().any(char::is_whitespace) {
            return Err(PluraError::Auth {
                message: "malformed OpenAI API key".into(),
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
            provider: ProviderIdentity::OpenAi,
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            default_headers: vec![
                ("authorization".to_string(), format!("Bearer {key}")),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            timeout: REQUEST_TIMEOUT,
        })
    }

    async fn test_connection(&self, client: &ProviderClient) -> Result<(), PluraError> {
        OpenAiClient::from_handle(client)?.test_connection().await
    }
}

/// Streaming chat for OpenAI.
#[derive(Debug, Clone)]
pub struct OpenAiStreaming {
    base_url: String,
}

impl OpenAiStreaming {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Default for OpenAiStreaming {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for OpenAiStreaming {
    fn name(&self) -> &str {
        "openai-streaming"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::OpenAi
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        STREAMING_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ChatStreaming for OpenAiStreaming {
    async fn stream_chat(
        &self,
        session: &Session,
        messages: &[ConversationMessage],
        options: &StreamOptions,
    ) -> Result<RawEventStream, PluraError> {
        let client = client_for_session(session, &self.base_url)?;

        let mut api_messages = translate::to_api_messages(messages);
        if let Some(system) = &options.system_prompt {
            api_messages.insert(0, ApiMessage::text("system", system.clone()));
        }

        let request = ChatRequest {
            model: options.model.clone(),
            messages: api_messages,
            max_tokens: options.max_tokens,
            stream: true,
            tools: if options.tools.is_empty() {
                None
            } else {
                Some(
                    options
                        .tools
                        .iter()
                        .map(|t| ApiToolSpec {
                            spec_type: "function".to_string(),
                            function: ApiFunctionSpec {
                                name: t.name.clone(),
                                description: t.description.clone(),
                                parameters: t.input_schema.clone(),
                            },
                        })
                        .collect(),
                )
            },
        };
        debug!(model = %options.model, "opening openai chat stream");
        client.stream_chat(&request).await
    }

    fn parse_stream_event(
        &self,
        event: RawEvent,
        state: StreamParserState,
    ) -> (Vec<StreamItem>, StreamParserState) {
        stream::parse_stream_event(event, state)
    }
}

/// Model catalog for OpenAI.
#[derive(Debug, Clone)]
pub struct OpenAiModels {
    base_url: String,
}

impl OpenAiModels {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Default for OpenAiModels {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for OpenAiModels {
    fn name(&self) -> &str {
        "openai-models"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::OpenAi
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        MODELS_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ModelCatalog for OpenAiModels {
    async fn list_models(&self, session: &Session) -> Result<Vec<String>, PluraError> {
        client_for_session(session, &self.base_url)?
            .list_models()
            .await
    }
}
