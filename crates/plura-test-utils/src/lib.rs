// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the Plura workspace.
//!
//! Provides an in-memory session store with real optimistic-concurrency
//! semantics, recording mocks for the external scheduler and bus, and a
//! helper for feeding literal event sequences to stream parsers.

pub mod mock_bus;
pub mod mock_scheduler;
pub mod mock_store;
pub mod script;

pub use mock_bus::MockBus;
pub use mock_scheduler::MockScheduler;
pub use mock_store::MemorySessionStore;
pub use script::script_stream;
