// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stream parser state machine shared by every provider's event translation.
//!
//! Providers differ only in how they map their wire events onto this
//! machine: the fold itself (`parse_stream_event` in each provider crate)
//! is a pure function `(RawEvent, StreamParserState) -> (Vec<StreamItem>,
//! StreamParserState)` with no I/O, which keeps the translation layer
//! testable with literal event sequences.

use serde::{Deserialize, Serialize};

use crate::types::ToolCall;

/// One provider event as it came off the wire, reduced to a common shape:
/// the event name (empty for providers that only send data lines) and the
/// decoded JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl RawEvent {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// An event carrying only a data payload, as OpenAI- and Gemini-style
    /// streams do.
    pub fn data_only(data: serde_json::Value) -> Self {
        Self {
            event: String::new(),
            data,
        }
    }
}

/// Phase of the per-stream parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserPhase {
    #[default]
    Idle,
    /// At least one tool call is open and accumulating argument fragments.
    AccumulatingToolArgs,
    /// The stream signalled completion; further events are ignored.
    Done,
}

/// A tool call under construction: identity arrives on the opening
/// fragment, argument text accumulates across subsequent fragments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialCall {
    /// Provider slot for the call (OpenAI fragment index, Anthropic block
    /// index). Providers that deliver calls whole never store partials.
    pub index: usize,
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Carried state of the pure parsing fold. Fresh per stream via `Default`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamParserState {
    pub phase: ParserPhase,
    /// Open calls, in wire order. Multiple entries when the provider
    /// interleaves several calls in one turn.
    pub pending: Vec<PartialCall>,
    pub stop_reason: Option<String>,
}

impl StreamParserState {
    pub fn is_done(&self) -> bool {
        self.phase == ParserPhase::Done
    }

    /// Looks up the open call for a provider slot.
    pub fn pending_mut(&mut self, index: usize) -> Option<&mut PartialCall> {
        self.pending.iter_mut().find(|c| c.index == index)
    }

    /// Drains all open calls into finished [`ToolCall`]s, in wire order.
    pub fn finish_pending(&mut self) -> Vec<ToolCall> {
        self.pending
            .drain(..)
            .map(|partial| ToolCall {
                id: partial.id,
                name: partial.name,
                arguments: crate::types::CallArguments::Raw(partial.arguments),
            })
            .collect()
    }
}

/// Canonical items produced by the parsing fold, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// Incremental assistant text.
    TextDelta(String),
    /// A completed tool call.
    ToolCall(ToolCall),
    /// Terminal item; carries the provider's stop reason when it sent one.
    Done { stop_reason: Option<String> },
}
