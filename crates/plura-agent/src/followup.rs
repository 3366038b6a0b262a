// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Follow-up message building after tool execution.
//!
//! A tool turn appends exactly two canonical messages: one assistant
//! message carrying the turn's text (when non-empty) and its tool-use
//! blocks in wire order, then one user message carrying the tool results
//! in the same order. Provider translate modules render these into each
//! wire format on the next request.

use plura_core::{ContentBlock, ConversationMessage, Role, ToolCall, ToolOutcome};
use plura_sandbox::Sandbox;

/// Appends the assistant/tool-result message pair for one executed turn
/// and returns the full new array. `history` is never mutated in place;
/// the append-only discipline means prior entries come back unchanged.
pub fn build_followup(
    history: &[ConversationMessage],
    calls: &[ToolCall],
    prior_text: Option<&str>,
    outcomes: &[ToolOutcome],
) -> Vec<ConversationMessage> {
    let mut assistant_blocks = Vec::with_capacity(calls.len() + 1);
    if let Some(text) = prior_text.map(str::trim).filter(|t| !t.is_empty()) {
        assistant_blocks.push(ContentBlock::Text {
            text: text.to_string(),
        });
    }
    for call in calls {
        assistant_blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.arguments.parse(),
        });
    }

    // Results ride in call order, whatever order execution finished in.
    let result_blocks = calls
        .iter()
        .map(|call| {
            match outcomes.iter().find(|o| o.call_id == call.id) {
                Some(outcome) => ContentBlock::ToolResult {
                    tool_use_id: outcome.call_id.clone(),
                    content: outcome.content.clone(),
                    is_error: outcome.is_error.then_some(true),
                },
                None => ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: format!("no outcome recorded for call '{}'", call.id),
                    is_error: Some(true),
                },
            }
        })
        .collect();

    let mut messages = history.to_vec();
    messages.push(ConversationMessage {
        role: Role::Assistant,
        content: assistant_blocks,
    });
    messages.push(ConversationMessage {
        role: Role::User,
        content: result_blocks,
    });
    messages
}

/// Executes each call through the sandbox, then builds the follow-up pair.
pub async fn execute_followup(
    sandbox: &Sandbox,
    history: &[ConversationMessage],
    calls: &[ToolCall],
    prior_text: Option<&str>,
) -> (Vec<ConversationMessage>, Vec<ToolOutcome>) {
    let mut outcomes = Vec::with_capacity(calls.len());
    for call in calls {
        outcomes.push(sandbox.execute(call).await);
    }
    let messages = build_followup(history, calls, prior_text, &outcomes);
    (messages, outcomes)
}
