// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that all provider capability modules must implement.

use crate::types::ProviderIdentity;

/// The base trait for all Plura provider modules.
///
/// Every capability implementation (OAuth flow, API-key auth, streaming,
/// model catalog) implements this trait, which provides identity and the
/// declared operation list the registry validates against its contract.
pub trait ProviderModule: Send + Sync + 'static {
    /// Returns the human-readable name of this module instance.
    fn name(&self) -> &str;

    /// Returns the provider this module serves.
    fn provider(&self) -> ProviderIdentity;

    /// Returns the semantic version of this module.
    fn version(&self) -> semver::Version;

    /// Returns the operation names this module declares it supports.
    ///
    /// The registry compares this list against the contract's required
    /// operations during compliance validation.
    fn operations(&self) -> Vec<&'static str>;
}
