// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical conversation to Gemini wire format.
//!
//! Gemini has no call ids on the wire; calls and responses pair up by
//! function name. Canonical tool-result blocks carry the synthesized
//! `{name}-{ordinal}` id, so the name is recovered by stripping the
//! ordinal suffix.

use plura_core::{ContentBlock, ConversationMessage, Role};

use crate::types::{ApiContent, ApiPart, FunctionCall, FunctionResponse};

/// Converts canonical messages into the generateContent contents array.
pub fn to_api_contents(messages: &[ConversationMessage]) -> Vec<ApiContent> {
    messages
        .iter()
        .map(|message| ApiContent {
            role: Some(
                match message.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                }
                .to_string(),
            ),
            parts: message.content.iter().map(to_api_part).collect(),
        })
        .collect()
}

fn to_api_part(block: &ContentBlock) -> ApiPart {
    match block {
        ContentBlock::Text { text } => ApiPart::Text { text: text.clone() },
        ContentBlock::ToolUse { name, input, .. } => ApiPart::FunctionCall {
            function_call: FunctionCall {
                name: name.clone(),
                args: input.clone(),
            },
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let response = if is_error.unwrap_or(false) {
                serde_json::json!({"error": content})
            } else {
                serde_json::json!({"result": content})
            };
            ApiPart::FunctionResponse {
                function_response: FunctionResponse {
                    name: call_name(tool_use_id),
                    response,
                },
            }
        }
    }
}

/// Recovers the function name from a synthesized `{name}-{ordinal}` id.
/// Ids without a numeric suffix pass through whole.
fn call_name(call_id: &str) -> String {
    match call_id.rsplit_once('-') {
        Some((name, suffix)) if suffix.chars().all(|c| c.is_ascii_digit()) => name.to_string(),
        _ => call_id.to_string(),
    }
}
