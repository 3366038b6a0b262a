// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session authentication, tool follow-up building, and the streaming
//! turn loop, tied together over the provider registry.

pub mod auth;
pub mod followup;
pub mod turn;

pub use auth::{AuthService, SessionStart};
pub use followup::{build_followup, execute_followup};
pub use turn::{run_turn, TurnResult};
