// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability contracts and external-collaborator traits.
//!
//! Provider capabilities extend the [`ProviderModule`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility. External
//! collaborators (session store, job scheduler, notification bus) are owned
//! by the hosting application and mocked in tests.

pub mod api_key;
pub mod bus;
pub mod jobs;
pub mod models;
pub mod module;
pub mod oauth;
pub mod store;
pub mod streaming;

// Re-export all traits at the traits module level for convenience.
pub use api_key::{ApiKeyAuth, API_KEY_OPERATIONS};
pub use bus::NotificationBus;
pub use jobs::JobScheduler;
pub use models::{ModelCatalog, MODELS_OPERATIONS};
pub use module::ProviderModule;
pub use oauth::{OAuthFlow, OAUTH_OPERATIONS};
pub use store::SessionStore;
pub use streaming::{ChatStreaming, RawEventStream, STREAMING_OPERATIONS};
