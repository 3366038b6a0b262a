// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plura provider layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Plura configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluraConfig {
    /// Tool execution sandbox settings.
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// OAuth callback HTTP endpoint settings.
    #[serde(default)]
    pub callback: CallbackConfig,

    /// OAuth flow settings.
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Tool execution sandbox configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Root directory all file operations are confined to.
    #[serde(default = "default_sandbox_root")]
    pub root: String,

    /// Wall-clock limit for shell commands, in seconds.
    #[serde(default = "default_shell_timeout_secs")]
    pub shell_timeout_secs: u64,

    /// Maximum bytes kept from a fetched response body.
    #[serde(default = "default_fetch_max_bytes")]
    pub fetch_max_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: default_sandbox_root(),
            shell_timeout_secs: default_shell_timeout_secs(),
            fetch_max_bytes: default_fetch_max_bytes(),
        }
    }
}

fn default_sandbox_root() -> String {
    ".".to_string()
}

fn default_shell_timeout_secs() -> u64 {
    120
}

fn default_fetch_max_bytes() -> usize {
    512 * 1024
}

/// OAuth callback HTTP endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CallbackConfig {
    /// Bind address for the callback server.
    #[serde(default = "default_callback_host")]
    pub host: String,

    /// Bind port for the callback server.
    #[serde(default = "default_callback_port")]
    pub port: u16,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            host: default_callback_host(),
            port: default_callback_port(),
        }
    }
}

fn default_callback_host() -> String {
    "127.0.0.1".to_string()
}

fn default_callback_port() -> u16 {
    8477
}

/// OAuth flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthConfig {
    /// Lifetime of a pending authorization attempt, in seconds.
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,

    /// Redirect URI registered with the providers.
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            state_ttl_secs: default_state_ttl_secs(),
            redirect_uri: default_redirect_uri(),
        }
    }
}

fn default_state_ttl_secs() -> u64 {
    600
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:8477/auth/callback".to_string()
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Base URL for the Anthropic API.
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Anthropic API version string.
    #[serde(default = "default_anthropic_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            api_version: default_anthropic_api_version(),
        }
    }
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_api_version() -> String {
    "2023-06-01".to_string()
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Base URL for the OpenAI API.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Base URL for the Gemini API.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
