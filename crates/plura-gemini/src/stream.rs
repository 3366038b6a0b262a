// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure parsing fold for Gemini streamGenerateContent chunks.
//!
//! Gemini never fragments function calls: each `functionCall` part is a
//! complete call and emits immediately. The wire carries no call ids, so
//! ids are synthesized as `{name}-{ordinal}` with the ordinal counting
//! calls within the turn; the pending list doubles as that counter and
//! keeps the synthesized ids unique even when a name repeats.

use plura_core::{
    CallArguments, ParserPhase, PartialCall, RawEvent, StreamItem, StreamParserState, ToolCall,
};

/// Folds one streamGenerateContent chunk into canonical stream items.
pub fn parse_stream_event(
    event: RawEvent,
    mut state: StreamParserState,
) -> (Vec<StreamItem>, StreamParserState) {
    if state.is_done() {
        return (Vec::new(), state);
    }

    let mut items = Vec::new();
    let candidate = &event.data["candidates"][0];

    if let Some(parts) = candidate["content"]["parts"].as_array() {
        for part in parts {
            if let Some(text) = part["text"].as_str() {
                if !text.is_empty() {
                    items.push(StreamItem::TextDelta(text.to_string()));
                }
            }
            if let Some(call) = part.get("functionCall") {
                let name = call["name"].as_str().unwrap_or_default().to_string();
                let args = call.get("args").cloned().unwrap_or(serde_json::json!({}));
                let ordinal = state.pending.len();
                let id = format!("{name}-{ordinal}");
                // Ledger entry only; the call is already emitted below.
                state.pending.push(PartialCall {
                    index: ordinal,
                    id: id.clone(),
                    name: name.clone(),
                    arguments: args.to_string(),
                });
                items.push(StreamItem::ToolCall(ToolCall {
                    id,
                    name,
                    arguments: CallArguments::Structured(args),
                }));
            }
        }
    }

    if let Some(reason) = candidate["finishReason"].as_str() {
        state.stop_reason = Some(reason.to_string());
        state.pending.clear();
        state.phase = ParserPhase::Done;
        items.push(StreamItem::Done {
            stop_reason: state.stop_reason.clone(),
        });
    }

    (items, state)
}
