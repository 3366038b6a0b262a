// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model catalog capability contract.

use async_trait::async_trait;

use crate::error::PluraError;
use crate::traits::module::ProviderModule;
use crate::types::Session;

/// Required operation names for registry compliance validation.
pub const MODELS_OPERATIONS: &[&str] = &["list_models"];

/// Model enumeration for a provider.
#[async_trait]
pub trait ModelCatalog: ProviderModule {
    /// Lists the model identifiers available to the session's credentials.
    async fn list_models(&self, session: &Session) -> Result<Vec<String>, PluraError>;
}
