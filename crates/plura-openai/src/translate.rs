// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical conversation to OpenAI wire format.
//!
//! The canonical shape is Anthropic-like (tool calls and results live as
//! content blocks), while chat completions splits them: assistant tool
//! calls ride a `tool_calls` array, and each tool result becomes its own
//! `role: "tool"` message answering one `tool_call_id`.

use plura_core::{ContentBlock, ConversationMessage, Role};

use crate::types::{ApiFunctionCall, ApiMessage, ApiToolCall};

/// Converts canonical messages into the chat-completions array. One
/// canonical message may expand into several wire messages (one per tool
/// result), preserving block order.
pub fn to_api_messages(messages: &[ConversationMessage]) -> Vec<ApiMessage> {
    let mut api = Vec::new();
    for message in messages {
        match message.role {
            Role::Assistant => api.push(assistant_message(message)),
            Role::User => api.extend(user_messages(message)),
        }
    }
    api
}

fn assistant_message(message: &ConversationMessage) -> ApiMessage {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in &message.content {
        match block {
            ContentBlock::Text { text: t } => text.push_str(t),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(ApiToolCall {
                    id: id.clone(),
                    call_type: "function".to_string(),
                    function: ApiFunctionCall {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                });
            }
            // Tool results never appear on assistant messages.
            ContentBlock::ToolResult { .. } => {}
        }
    }
    ApiMessage {
        role: "assistant".to_string(),
        content: if text.is_empty() { None } else { Some(text) },
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id: None,
    }
}

fn user_messages(message: &ConversationMessage) -> Vec<ApiMessage> {
    let mut out = Vec::new();
    let mut text = String::new();
    for block in &message.content {
        match block {
            ContentBlock::Text { text: t } => text.push_str(t),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => {
                out.push(ApiMessage {
                    role: "tool".to_string(),
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id.clone()),
                });
            }
            ContentBlock::ToolUse { .. } => {}
        }
    }
    if !text.is_empty() {
        out.push(ApiMessage::text("user", text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_turn_splits_into_tool_calls_and_tool_messages() {
        let messages = vec![
            ConversationMessage::user_text("run ls"),
            ConversationMessage {
                role: Role::Assistant,
                content: vec![
                    ContentBlock::Text {
                        text: "Running it.".into(),
                    },
                    ContentBlock::ToolUse {
                        id: "call_1".into(),
                        name: "shell".into(),
                        input: json!({"command": "ls"}),
                    },
                ],
            },
            ConversationMessage {
                role: Role::User,
                content: vec![ContentBlock::ToolResult {
                    tool_use_id: "call_1".into(),
                    content: "Cargo.toml\nsrc".into(),
                    is_error: None,
                }],
            },
        ];

        let api = to_api_messages(&messages);
        assert_eq!(api.len(), 3);

        assert_eq!(api[0].role, "user");
        assert_eq!(api[0].content.as_deref(), Some("run ls"));

        assert_eq!(api[1].role, "assistant");
        assert_eq!(api[1].content.as_deref(), Some("Running it."));
        let calls = api[1].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "shell");
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&calls[0].function.arguments).unwrap(),
            json!({"command": "ls"})
        );

        assert_eq!(api[2].role, "tool");
        assert_eq!(api[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(api[2].content.as_deref(), Some("Cargo.toml\nsrc"));
    }

    #[test]
    fn text_only_assistant_message_has_no_tool_calls() {
        let api = to_api_messages(&[ConversationMessage::assistant_text("hello")]);
        assert_eq!(api.len(), 1);
        assert!(api[0].tool_calls.is_none());
        assert_eq!(api[0].content.as_deref(), Some("hello"));
    }

    #[test]
    fn multiple_results_become_one_tool_message_each() {
        let message = ConversationMessage {
            role: Role::User,
            content: vec![
                ContentBlock::ToolResult {
                    tool_use_id: "call_a".into(),
                    content: "a".into(),
                    is_error: None,
                },
                ContentBlock::ToolResult {
                    tool_use_id: "call_b".into(),
                    content: "b".into(),
                    is_error: Some(true),
                },
            ],
        };
        let api = to_api_messages(&[message]);
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].tool_call_id.as_deref(), Some("call_a"));
        assert_eq!(api[1].tool_call_id.as_deref(), Some("call_b"));
    }
}
