// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static API-key capability contract.

use async_trait::async_trait;

use crate::error::PluraError;
use crate::traits::module::ProviderModule;
use crate::types::{ClientOptions, ProviderClient};

/// Required operation names for registry compliance validation.
pub const API_KEY_OPERATIONS: &[&str] =
    &["validate_api_key", "create_client", "test_connection"];

/// API-key authentication for a provider.
#[async_trait]
pub trait ApiKeyAuth: ProviderModule {
    /// Checks the key's shape (prefix, length, charset) without any network
    /// round trip.
    fn validate_api_key(&self, key: &str) -> Result<(), PluraError>;

    /// Builds the client handle for the key. Pure construction, no I/O.
    fn create_client(
        &self,
        key: &str,
        options: &ClientOptions,
    ) -> Result<ProviderClient, PluraError>;

    /// Makes a minimal authenticated request to prove the key works.
    async fn test_connection(&self, client: &ProviderClient) -> Result<(), PluraError>;
}
