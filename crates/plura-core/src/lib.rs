// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plura provider unification layer.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Plura workspace. Provider capability
//! modules implement the contracts defined here; the session store, job
//! scheduler, and notification bus are application-owned collaborators
//! behind the traits in [`traits`].

pub mod error;
pub mod stream;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PluraError;
pub use stream::{ParserPhase, PartialCall, RawEvent, StreamItem, StreamParserState};
pub use types::{
    AuthKind, CallArguments, ClientOptions, ContentBlock, ConversationMessage, PkceParams,
    ProviderClient, ProviderIdentity, RefreshJob, Role, Session, SessionOptions,
    StreamOptions, TokenSet, ToolCall, ToolDefinition, ToolOutcome,
};

// Re-export all capability and collaborator traits at crate root.
pub use traits::{
    ApiKeyAuth, ChatStreaming, JobScheduler, ModelCatalog, NotificationBus, OAuthFlow,
    ProviderModule, RawEventStream, SessionStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plura_error_has_all_variants() {
        // Verify all 10 error variants exist and can be constructed.
        let _config = PluraError::Config("test".into());
        let _provider = PluraError::Provider {
            message: "test".into(),
            source: None,
        };
        let _auth = PluraError::Auth {
            message: "test".into(),
            source: None,
        };
        let _reauth = PluraError::ReauthRequired {
            session_id: "test".into(),
        };
        let _not_registered = PluraError::NotRegistered { key: "test".into() };
        let _store = PluraError::Store {
            source: Box::new(std::io::Error::other("test")),
        };
        let _conflict = PluraError::StoreConflict { id: "test".into() };
        let _missing = PluraError::SessionNotFound { id: "test".into() };
        let _timeout = PluraError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = PluraError::Internal("test".into());
    }

    #[test]
    fn provider_identity_round_trips() {
        use std::str::FromStr;

        for provider in ProviderIdentity::all() {
            let s = provider.to_string();
            let parsed = ProviderIdentity::from_str(&s).expect("should parse back");
            assert_eq!(provider, parsed);

            let json = serde_json::to_string(&provider).expect("should serialize");
            let from_json: ProviderIdentity =
                serde_json::from_str(&json).expect("should deserialize");
            assert_eq!(provider, from_json);
        }
    }

    #[test]
    fn all_contract_traits_are_exported() {
        // If any contract trait is missing from the public API, this test
        // won't compile.
        fn _assert_module<T: ProviderModule>() {}
        fn _assert_oauth<T: OAuthFlow>() {}
        fn _assert_api_key<T: ApiKeyAuth>() {}
        fn _assert_streaming<T: ChatStreaming>() {}
        fn _assert_models<T: ModelCatalog>() {}
        fn _assert_store<T: SessionStore>() {}
        fn _assert_scheduler<T: JobScheduler>() {}
        fn _assert_bus<T: NotificationBus>() {}
    }
}
