// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registration from configuration.

use std::sync::Arc;

use plura_anthropic::{AnthropicApiKey, AnthropicModels, AnthropicOAuth, AnthropicStreaming};
use plura_config::PluraConfig;
use plura_gemini::{GeminiApiKey, GeminiModels, GeminiStreaming};
use plura_openai::{OpenAiApiKey, OpenAiModels, OpenAiOAuth, OpenAiStreaming};
use plura_registry::{ProviderRegistry, RegistryBuilder};

/// Registers every shipped provider module and validates the result.
///
/// Gemini ships without an OAuth module, so its registry entry reports
/// `Invalid` while its validated categories stay usable.
pub fn build_registry(config: &PluraConfig) -> ProviderRegistry {
    let anthropic = &config.anthropic;
    let openai = &config.openai;
    let gemini = &config.gemini;

    RegistryBuilder::new()
        .oauth(Arc::new(AnthropicOAuth::new()))
        .api_key(Arc::new(
            AnthropicApiKey::new()
                .with_base_url(anthropic.base_url.clone())
                .with_api_version(anthropic.api_version.clone()),
        ))
        .streaming(Arc::new(
            AnthropicStreaming::new()
                .with_base_url(anthropic.base_url.clone())
                .with_api_version(anthropic.api_version.clone()),
        ))
        .models(Arc::new(
            AnthropicModels::new()
                .with_base_url(anthropic.base_url.clone())
                .with_api_version(anthropic.api_version.clone()),
        ))
        .oauth(Arc::new(OpenAiOAuth::new()))
        .api_key(Arc::new(
            OpenAiApiKey::new().with_base_url(openai.base_url.clone()),
        ))
        .streaming(Arc::new(
            OpenAiStreaming::new().with_base_url(openai.base_url.clone()),
        ))
        .models(Arc::new(
            OpenAiModels::new().with_base_url(openai.base_url.clone()),
        ))
        .api_key(Arc::new(
            GeminiApiKey::new().with_base_url(gemini.base_url.clone()),
        ))
        .streaming(Arc::new(
            GeminiStreaming::new().with_base_url(gemini.base_url.clone()),
        ))
        .models(Arc::new(
            GeminiModels::new().with_base_url(gemini.base_url.clone()),
        ))
        .build()
}
