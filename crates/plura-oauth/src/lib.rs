// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth plumbing for the Plura provider layer: PKCE generation, pending
//! attempt tracking, the callback HTTP endpoint, and background token
//! refresh scheduling.

pub mod callback;
pub mod pkce;
pub mod refresh;
pub mod state;

pub use callback::{start_server, CallbackServerConfig, CallbackState};
pub use pkce::{generate_pkce, generate_state_token};
pub use refresh::{compute_refresh_at, RefreshScheduler};
pub use state::{OAuthStateEntry, OAuthStateMap};
