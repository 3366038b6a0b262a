// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compliance report types produced by registry validation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use plura_core::traits::{
    API_KEY_OPERATIONS, MODELS_OPERATIONS, OAUTH_OPERATIONS, STREAMING_OPERATIONS,
};
use plura_core::ProviderIdentity;

/// One capability category a provider can register an implementation for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum OperationKind {
    #[strum(serialize = "oauth")]
    #[serde(rename = "oauth")]
    OAuth,
    #[strum(serialize = "api_key")]
    #[serde(rename = "api_key")]
    ApiKey,
    #[strum(serialize = "streaming")]
    #[serde(rename = "streaming")]
    Streaming,
    #[strum(serialize = "models")]
    #[serde(rename = "models")]
    Models,
}

impl OperationKind {
    /// All categories, in validation order.
    pub fn all() -> [OperationKind; 4] {
        [
            OperationKind::OAuth,
            OperationKind::ApiKey,
            OperationKind::Streaming,
            OperationKind::Models,
        ]
    }

    /// Operation names the category's contract requires.
    pub fn required_operations(&self) -> &'static [&'static str] {
        match self {
            OperationKind::OAuth => OAUTH_OPERATIONS,
            OperationKind::ApiKey => API_KEY_OPERATIONS,
            OperationKind::Streaming => STREAMING_OPERATIONS,
            OperationKind::Models => MODELS_OPERATIONS,
        }
    }
}

/// The registration key for a (provider, operation) pair, as reported in
/// lookup and validation errors.
pub fn registration_key(provider: ProviderIdentity, operation: OperationKind) -> String {
    format!("{provider}/{operation}")
}

/// Overall compliance verdict for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Valid,
    Invalid,
}

/// Validation result for one provider, rebuilt wholesale on every refresh.
///
/// An `Invalid` entry still lists the categories that did validate in
/// `operations`, so partially compliant providers stay usable for those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub provider: ProviderIdentity,
    /// Categories whose registered module passed validation.
    pub operations: Vec<OperationKind>,
    /// Declared operation names per validated category.
    pub capabilities: HashMap<OperationKind, Vec<String>>,
    pub status: ComplianceStatus,
    /// One message per missing registration or missing declared operation.
    pub errors: Vec<String>,
}

impl RegistryEntry {
    pub fn is_valid(&self) -> bool {
        self.status == ComplianceStatus::Valid
    }

    /// True when the given category validated, regardless of overall status.
    pub fn supports(&self, operation: OperationKind) -> bool {
        self.operations.contains(&operation)
    }
}
