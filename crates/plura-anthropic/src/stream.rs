// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure parsing fold for Anthropic streaming events.
//!
//! Tool calls follow the content block lifecycle: `content_block_start`
//! opens a pending call, `input_json_delta` fragments accumulate its
//! argument text, `content_block_stop` completes it. Text deltas emit
//! immediately; unknown events are skipped.

use plura_core::{
    CallArguments, ParserPhase, PartialCall, RawEvent, StreamItem, StreamParserState,
    ToolCall,
};

/// Folds one Anthropic SSE event into canonical stream items.
pub fn parse_stream_event(
    event: RawEvent,
    mut state: StreamParserState,
) -> (Vec<StreamItem>, StreamParserState) {
    if state.is_done() {
        return (Vec::new(), state);
    }

    let mut items = Vec::new();

    match event.event.as_str() {
        "content_block_start" => {
            let index = event.data["index"].as_u64().unwrap_or(0) as usize;
            let block = &event.data["content_block"];
            if block["type"].as_str() == Some("tool_use") {
                state.pending.push(PartialCall {
                    index,
                    id: block["id"].as_str().unwrap_or_default().to_string(),
                    name: block["name"].as_str().unwrap_or_default().to_string(),
                    arguments: String::new(),
                });
                state.phase = ParserPhase::AccumulatingToolArgs;
            }
        }
        "content_block_delta" => {
            let index = event.data["index"].as_u64().unwrap_or(0) as usize;
            let delta = &event.data["delta"];
            match delta["type"].as_str() {
                Some("text_delta") => {
                    if let Some(text) = delta["text"].as_str() {
                        items.push(StreamItem::TextDelta(text.to_string()));
                    }
                }
                Some("input_json_delta") => {
                    if let Some(fragment) = delta["partial_json"].as_str() {
                        if let Some(pending) = state.pending_mut(index) {
                            pending.arguments.push_str(fragment);
                        }
                    }
                }
                _ => {}
            }
        }
        "content_block_stop" => {
            let index = event.data["index"].as_u64().unwrap_or(0) as usize;
            if let Some(pos) = state.pending.iter().position(|c| c.index == index) {
                let partial = state.pending.remove(pos);
                items.push(StreamItem::ToolCall(ToolCall {
                    id: partial.id,
                    name: partial.name,
                    arguments: CallArguments::Raw(partial.arguments),
                }));
            }
            if state.pending.is_empty() {
                state.phase = ParserPhase::Idle;
            }
        }
        "message_delta" => {
            if let Some(reason) = event.data["delta"]["stop_reason"].as_str() {
                state.stop_reason = Some(reason.to_string());
            }
        }
        "message_stop" => {
            state.phase = ParserPhase::Done;
            items.push(StreamItem::Done {
                stop_reason: state.stop_reason.clone(),
            });
        }
        // ping and unknown events are skipped.
        _ => {}
    }

    (items, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fold(events: Vec<RawEvent>) -> Vec<StreamItem> {
        let mut state = StreamParserState::default();
        let mut items = Vec::new();
        for event in events {
            let (mut emitted, next) = parse_stream_event(event, state);
            items.append(&mut emitted);
            state = next;
        }
        items
    }

    #[test]
    fn text_deltas_emit_immediately() {
        let items = fold(vec![
            RawEvent::new(
                "content_block_delta",
                json!({"index": 0, "delta": {"type": "text_delta", "text": "Hel"}}),
            ),
            RawEvent::new(
                "content_block_delta",
                json!({"index": 0, "delta": {"type": "text_delta", "text": "lo"}}),
            ),
        ]);
        assert_eq!(
            items,
            vec![
                StreamItem::TextDelta("Hel".into()),
                StreamItem::TextDelta("lo".into()),
            ]
        );
    }

    #[test]
    fn tool_call_accumulates_across_block_lifecycle() {
        let items = fold(vec![
            RawEvent::new(
                "content_block_start",
                json!({"index": 1, "content_block": {
                    "type": "tool_use", "id": "toolu_1", "name": "shell", "input": {}
                }}),
            ),
            RawEvent::new(
                "content_block_delta",
                json!({"index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"comm"}}),
            ),
            RawEvent::new(
                "content_block_delta",
                json!({"index": 1, "delta": {"type": "input_json_delta", "partial_json": "and\":\"ls\"}"}}),
            ),
            RawEvent::new("content_block_stop", json!({"index": 1})),
        ]);

        assert_eq!(items.len(), 1);
        match &items[0] {
            StreamItem::ToolCall(call) => {
                assert_eq!(call.id, "toolu_1");
                assert_eq!(call.name, "shell");
                assert_eq!(call.arguments.parse(), json!({"command": "ls"}));
            }
            other => panic!("expected ToolCall, got {other:?}"),
        }
    }

    #[test]
    fn message_stop_carries_stop_reason() {
        let items = fold(vec![
            RawEvent::new(
                "message_delta",
                json!({"delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 5}}),
            ),
            RawEvent::new("message_stop", json!({})),
        ]);
        assert_eq!(
            items,
            vec![StreamItem::Done {
                stop_reason: Some("tool_use".into())
            }]
        );
    }

    #[test]
    fn events_after_done_are_ignored() {
        let items = fold(vec![
            RawEvent::new("message_stop", json!({})),
            RawEvent::new(
                "content_block_delta",
                json!({"index": 0, "delta": {"type": "text_delta", "text": "late"}}),
            ),
        ]);
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], StreamItem::Done { .. }));
    }

    #[test]
    fn unknown_and_ping_events_are_skipped() {
        let items = fold(vec![
            RawEvent::new("ping", json!({})),
            RawEvent::new("some_future_event", json!({"x": 1})),
        ]);
        assert!(items.is_empty());
    }

    #[test]
    fn text_block_start_opens_nothing() {
        let (items, state) = parse_stream_event(
            RawEvent::new(
                "content_block_start",
                json!({"index": 0, "content_block": {"type": "text", "text": ""}}),
            ),
            StreamParserState::default(),
        );
        assert!(items.is_empty());
        assert!(state.pending.is_empty());
        assert_eq!(state.phase, ParserPhase::Idle);
    }

    #[test]
    fn empty_tool_arguments_parse_to_empty_object() {
        let items = fold(vec![
            RawEvent::new(
                "content_block_start",
                json!({"index": 0, "content_block": {
                    "type": "tool_use", "id": "toolu_2", "name": "list_dir", "input": {}
                }}),
            ),
            RawEvent::new("content_block_stop", json!({"index": 0})),
        ]);
        match &items[0] {
            StreamItem::ToolCall(call) => {
                assert_eq!(call.arguments.parse(), json!({}));
            }
            other => panic!("expected ToolCall, got {other:?}"),
        }
    }
}
