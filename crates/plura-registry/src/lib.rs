// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registration map and compliance validation for Plura.
//!
//! Providers are registered explicitly at startup; the registry validates
//! every (provider, operation category) pair against its contract and keeps
//! the resulting report behind an atomic swap for cheap concurrent reads.

pub mod registry;
pub mod report;

pub use registry::{ProviderRegistry, RegistryBuilder};
pub use report::{registration_key, ComplianceStatus, OperationKind, RegistryEntry};
