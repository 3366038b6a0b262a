// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure parsing fold for OpenAI chat-completions stream chunks.
//!
//! Tool calls arrive as `delta.tool_calls` fragments keyed by index: the
//! first fragment for an index carries the call id and function name,
//! later fragments append to the JSON-text argument string. `finish_reason`
//! completes all open calls and the turn; the `[DONE]` sentinel (surfaced
//! by the client as a `done` event) is terminal.

use plura_core::{ParserPhase, PartialCall, RawEvent, StreamItem, StreamParserState};

use crate::client::DONE_EVENT;

/// Folds one chat-completions chunk into canonical stream items.
pub fn parse_stream_event(
    event: RawEvent,
    mut state: StreamParserState,
) -> (Vec<StreamItem>, StreamParserState) {
    if state.is_done() {
        return (Vec::new(), state);
    }

    let mut items = Vec::new();

    if event.event == DONE_EVENT {
        // Normally finish_reason arrives first; a bare [DONE] still closes
        // anything left open so no call is silently dropped.
        finish_turn(&mut state, &mut items);
        return (items, state);
    }

    let choice = &event.data["choices"][0];
    let delta = &choice["delta"];

    if let Some(text) = delta["content"].as_str() {
        if !text.is_empty() {
            items.push(StreamItem::TextDelta(text.to_string()));
        }
    }

    if let Some(fragments) = delta["tool_calls"].as_array() {
        for fragment in fragments {
            let index = fragment["index"].as_u64().unwrap_or(0) as usize;
            if state.pending_mut(index).is_none() {
                state.pending.push(PartialCall {
                    index,
                    id: fragment["id"].as_str().unwrap_or_default().to_string(),
                    name: fragment["function"]["name"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    arguments: String::new(),
                });
                state.phase = ParserPhase::AccumulatingToolArgs;
            }
            if let Some(args) = fragment["function"]["arguments"].as_str() {
                if let Some(pending) = state.pending_mut(index) {
                    pending.arguments.push_str(args);
                }
            }
        }
    }

    if let Some(reason) = choice["finish_reason"].as_str() {
        state.stop_reason = Some(reason.to_string());
        finish_turn(&mut state, &mut items);
    }

    (items, state)
}

fn finish_turn(state: &mut StreamParserState, items: &mut Vec<StreamItem>) {
    for call in state.finish_pending() {
        items.push(StreamItem::ToolCall(call));
    }
    state.phase = ParserPhase::Done;
    items.push(StreamItem::Done {
        stop_reason: state.stop_reason.clone(),
    });
}
