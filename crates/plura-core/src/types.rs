// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the capability contracts and the Plura workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies one of the supported LLM providers. Used as a lookup key
/// throughout the registry, the OAuth state map, and refresh jobs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderIdentity {
    Anthropic,
    OpenAi,
    Gemini,
}

impl ProviderIdentity {
    /// All known providers, in registry enumeration order.
    pub fn all() -> [ProviderIdentity; 3] {
        [
            ProviderIdentity::Anthropic,
            ProviderIdentity::OpenAi,
            ProviderIdentity::Gemini,
        ]
    }
}

/// How a session authenticates against its provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AuthKind {
    #[strum(serialize = "oauth")]
    #[serde(rename = "oauth")]
    OAuth,
    #[strum(serialize = "api_key")]
    #[serde(rename = "api_key")]
    ApiKey,
}

/// One authenticated connection to a provider.
///
/// Owned by the external session store; the core only reads and updates it
/// through [`crate::traits::SessionStore`]. `version` backs the store's
/// optimistic concurrency; `needs_reauth` is set when a refresh token is
/// rejected as invalid or revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier.
    pub id: String,
    pub provider: ProviderIdentity,
    pub auth_kind: AuthKind,
    /// User-chosen name, unique per provider + auth kind.
    pub display_name: String,
    /// Provider-specific credential payload (opaque to the core).
    pub credentials: serde_json::Value,
    /// Absolute expiry of the access credential. Absent for API keys.
    pub expires_at: Option<DateTime<Utc>>,
    /// Set when the refresh chain hit a terminal failure.
    #[serde(default)]
    pub needs_reauth: bool,
    /// Store version for optimistic-concurrency updates.
    #[serde(default)]
    pub version: u64,
}

/// Tokens returned by an OAuth token endpoint (code exchange or refresh).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    /// Some providers omit the refresh token on refresh responses; callers
    /// preserve the previous one in that case.
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub token_type: String,
    pub scopes: Vec<String>,
}

/// PKCE verifier/challenge pair, generated once per OAuth attempt and
/// consumed exactly once by the code exchange. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkceParams {
    pub code_verifier: String,
    pub code_challenge: String,
    /// Always "S256" for the supported providers.
    pub challenge_method: String,
}

/// Payload handed to the external job scheduler for a token refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshJob {
    pub provider: ProviderIdentity,
    pub session_id: String,
    pub retry_count: u32,
}

/// Arguments of a model-requested tool call, in the provider's wire
/// encoding: JSON text for providers that stream argument fragments, an
/// already-structured value for providers that deliver calls whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallArguments {
    Structured(serde_json::Value),
    Raw(String),
}

impl CallArguments {
    /// Parses the arguments into a structured value, defaulting to an empty
    /// object when the wire encoding is malformed or empty.
    pub fn parse(&self) -> serde_json::Value {
        match self {
            CallArguments::Structured(v) => v.clone(),
            CallArguments::Raw(s) => {
                if s.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(s).unwrap_or_else(|_| serde_json::json!({}))
                }
            }
        }
    }
}

/// A model-requested tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, unique within one turn.
    pub id: String,
    pub name: String,
    pub arguments: CallArguments,
}

/// The result of executing one [`ToolCall`]. Exactly one outcome per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub call_id: String,
    /// Success payload, or the stringified error when `is_error` is set.
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: message.into(),
            is_error: true,
        }
    }
}

/// Role of a canonical conversation message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A content block within a canonical conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// The model's request to invoke a named tool.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// The output fed back to the model for one tool invocation.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// One entry of the canonical, append-only conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ConversationMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }
}

/// Options for creating a session through the auth service.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub provider: ProviderIdentity,
    pub auth_kind: AuthKind,
    pub display_name: String,
    /// Required when `auth_kind` is `ApiKey`.
    pub api_key: Option<String>,
}

/// A plain data handle describing an authenticated HTTP client for a
/// provider. Provider crates materialize a real client from it; keeping it
/// data-only keeps this crate free of HTTP dependencies.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    pub provider: ProviderIdentity,
    pub base_url: String,
    pub default_headers: Vec<(String, String)>,
    pub timeout: std::time::Duration,
}

/// Options for building an API-key client.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Override of the provider's default base URL.
    pub base_url: Option<String>,
}

/// Per-request options for chat streaming.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub model: String,
    pub max_tokens: u32,
    /// Tool definitions offered to the model, in each provider's schema
    /// shape (name, description, JSON-schema parameters).
    pub tools: Vec<ToolDefinition>,
    pub system_prompt: Option<String>,
}

/// A tool definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}
