// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini provider modules for the Plura unification layer.
//!
//! Implements the API-key, streaming, and model-catalog contracts against
//! the generateContent API. Gemini registers no OAuth module, so its
//! registry entry only validates against the operations it declares.

pub mod client;
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

use crate::client::GeminiClient;
use crate::types::{
    ApiContent, ApiTool, FunctionDeclaration, GenerateContentRequest, GenerationConfig,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Builds an authenticated client from a session's credential payload.
/// Gemini sessions always carry an API key.
fn client_for_session(session: &Session, base_url: &str) -> Result<GeminiClient, PluraError> {
    if session.needs_reauth {
        return Err(PluraError::ReauthRequired {
            session_id: session.id.clone(),
        });
    }
    let key = session
        .credentials
        .get("api_key")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PluraError::Auth {
            message: "session carries no api_key".into(),
            source: None,
        })?;
    GeminiClient::new(key, base_url)
}

/// API-key authentication for Gemini.
#[derive(Debug, Clone)]
pub struct GeminiApiKey {
    base_url: String,
}

impl GeminiApiKey {
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

impl Default for GeminiApiKey {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for GeminiApiKey {
    fn name(&self) -> &str {
        "gemini-api-key"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::Gemini
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        API_KEY_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ApiKeyAuth for GeminiApiKey {
    fn validate_api_key(&self, key: &str) -> Result<(), PluraError> {
        if !key.starts_with("AIza") {
            return Err(PluraError::Auth {
                message: "Gemini API keys start with 'AIza'".into(),
                source: None,
            });
        }
        if key.len() < 20 || key.chars().any(char::is_whitespace) {
            return Err(PluraError::Auth {
                message: "malformed Gemini API key".into(),
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
            provider: ProviderIdentity::Gemini,
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            default_headers: vec![
                ("x-goog-api-key".to_string(), key.to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            timeout: REQUEST_TIMEOUT,
        })
    }

    async fn test_connection(&self, client: &ProviderClient) -> Result<(), PluraError> {
        GeminiClient::from_handle(client)?.test_connection().await
    }
}

/// Streaming chat for Gemini.
#[derive(Debug, Clone)]
pub struct GeminiStreaming {
    base_url: String,
}

impl GeminiStreaming {
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

impl Default for GeminiStreaming {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for GeminiStreaming {
    fn name(&self) -> &str {
        "gemini-streaming"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::Gemini
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        STREAMING_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ChatStreaming for GeminiStreaming {
    async fn stream_chat(
        &self,
        session: &Session,
        messages: &[ConversationMessage],
        options: &StreamOptions,
    ) -> Result<RawEventStream, PluraError> {
        let client = client_for_session(session, &self.base_url)?;

        let request = GenerateContentRequest {
            contents: translate::to_api_contents(messages),
            system_instruction: options
                .system_prompt
                .as_ref()
                .map(|s| ApiContent::system(s.clone())),
            tools: if options.tools.is_empty() {
                None
            } else {
                Some(vec![ApiTool {
                    function_declarations: options
                        .tools
                        .iter()
                        .map(|t| FunctionDeclaration {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.clone(),
                        })
                        .collect(),
                }])
            },
            generation_config: Some(GenerationConfig {
                max_output_tokens: options.max_tokens,
            }),
        };
        debug!(model = %options.model, "opening gemini content stream");
        client.stream_generate(&options.model, &request).await
    }

    fn parse_stream_event(
        &self,
        event: RawEvent,
        state: StreamParserState,
    ) -> (Vec<StreamItem>, StreamParserState) {
        stream::parse_stream_event(event, state)
    }
}

/// Model catalog for Gemini.
#[derive(Debug, Clone)]
pub struct GeminiModels {
    base_url: String,
}

impl GeminiModels {
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

impl Default for GeminiModels {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderModule for GeminiModels {
    fn name(&self) -> &str {
        "gemini-models"
    }

    fn provider(&self) -> ProviderIdentity {
        ProviderIdentity::Gemini
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn operations(&self) -> Vec<&'static str> {
        MODELS_OPERATIONS.to_vec()
    }
}

#[async_trait]
impl ModelCatalog for GeminiModels {
    async fn list_models(&self, session: &Session) -> Result<Vec<String>, PluraError> {
        client_for_session(session, &self.base_url)?
            .list_models()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plura_core::AuthKind;

    fn api_key_session(key: &str) -> Session {
        Session {
            id: "sess-1".into(),
            provider: ProviderIdentity::Gemini,
            auth_kind: AuthKind::ApiKey,
            display_name: "lab".into(),
            credentials: serde_json::json!({"api_key": key}),
            expires_at: None,
            needs_reauth: false,
            version: 0,
        }
    }

    #[test]
    fn validate_api_key_shape() {
        let module = GeminiApiKey::new();
        assert!(module.validate_api_key("AIzaSy0123456789abcdef").is_ok());
        assert!(module.validate_api_key("sk-not-a-gemini-key-at-all").is_err());
        assert!(module.validate_api_key("AIzaShort").is_err());
        assert!(module.validate_api_key("AIzaSy has whitespace here").is_err());
    }

    #[test]
    fn create_client_carries_goog_header() {
        let module = GeminiApiKey::new();
        let client = module
            .create_client("AIzaSy0123456789abcdef", &ClientOptions::default())
            .unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert!(client
            .default_headers
            .iter()
            .any(|(n, v)| n == "x-goog-api-key" && v.starts_with("AIza")));
    }

    #[tokio::test]
    async fn stream_chat_rejects_needs_reauth_session() {
        let module = GeminiStreaming::new();
        let mut session = api_key_session("AIzaSy0123456789abcdef");
        session.needs_reauth = true;

        let Err(err) = module
            .stream_chat(
                &session,
                &[ConversationMessage::user_text("hi")],
                &StreamOptions {
                    model: "gemini-2.0-flash".into(),
                    max_tokens: 1024,
                    tools: vec![],
                    system_prompt: None,
                },
            )
            .await
        else {
            panic!("expected stream_chat to fail");
        };
        assert!(matches!(err, PluraError::ReauthRequired { .. }));
    }

    #[tokio::test]
    async fn list_models_requires_api_key() {
        let module = GeminiModels::new();
        let mut session = api_key_session("AIzaSy0123456789abcdef");
        session.credentials = serde_json::json!({"access_token": "not-a-key"});

        let err = module.list_models(&session).await.unwrap_err();
        assert!(matches!(err, PluraError::Auth { .. }));
    }
}
