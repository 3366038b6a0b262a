// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat streaming capability contract.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::PluraError;
use crate::stream::{RawEvent, StreamItem, StreamParserState};
use crate::traits::module::ProviderModule;
use crate::types::{ConversationMessage, Session, StreamOptions};

/// Required operation names for registry compliance validation.
pub const STREAMING_OPERATIONS: &[&str] = &["stream_chat", "parse_stream_event"];

/// Boxed stream of raw provider events.
pub type RawEventStream =
    Pin<Box<dyn Stream<Item = Result<RawEvent, PluraError>> + Send>>;

/// Streaming chat for a provider.
#[async_trait]
pub trait ChatStreaming: ProviderModule {
    /// Opens a streaming chat request for the session. The stream is lazy;
    /// dropping it cancels the request. Already-emitted events stay valid.
    async fn stream_chat(
        &self,
        session: &Session,
        messages: &[ConversationMessage],
        options: &StreamOptions,
    ) -> Result<RawEventStream, PluraError>;

    /// Pure transition function folding one wire event into canonical
    /// stream items. No I/O; callers thread the state across events.
    fn parse_stream_event(
        &self,
        event: RawEvent,
        state: StreamParserState,
    ) -> (Vec<StreamItem>, StreamParserState);
}
