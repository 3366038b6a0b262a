// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted event stream helper.

use futures::stream;

use plura_core::{RawEvent, RawEventStream};

/// Builds a ready-made event stream from a literal event sequence, for
/// driving turn loops and parser folds in tests without a network.
pub fn script_stream(events: Vec<RawEvent>) -> RawEventStream {
    Box::pin(stream::iter(events.into_iter().map(Ok)))
}
