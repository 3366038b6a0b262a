// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical conversation to Anthropic wire format.

use plura_core::{ContentBlock, ConversationMessage, Role};

use crate::types::{ApiContentBlock, ApiMessage};

/// Converts canonical messages into the Messages API array. The canonical
/// block set maps one-to-one onto Anthropic content blocks.
pub fn to_api_messages(messages: &[ConversationMessage]) -> Vec<ApiMessage> {
    messages
        .iter()
        .map(|message| ApiMessage {
            role: match message.role {
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: message.content.iter().map(to_api_block).collect(),
        })
        .collect()
}

fn to_api_block(block: &ContentBlock) -> ApiContentBlock {
    match block {
        ContentBlock::Text { text } => ApiContentBlock::Text { text: text.clone() },
        ContentBlock::ToolUse { id, name, input } => ApiContentBlock::ToolUse {
            id: id.clone(),
            name: name.clone(),
            input: input.clone(),
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => ApiContentBlock::ToolResult {
            tool_use_id: tool_use_id.clone(),
            content: content.clone(),
            is_error: *is_error,
        },
    }
}
