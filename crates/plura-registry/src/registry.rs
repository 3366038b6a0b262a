// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit provider registration map with startup compliance validation.
//!
//! Implementations are registered by hand at startup through
//! [`RegistryBuilder`]; there is no runtime discovery. Validation produces a
//! [`RegistryEntry`] per known provider, cached behind an `ArcSwap` so reads
//! never block and `refresh` replaces the whole report atomically.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use plura_core::traits::{ApiKeyAuth, ChatStreaming, ModelCatalog, OAuthFlow};
use plura_core::{PluraError, ProviderIdentity, ProviderModule};

use crate::report::{
    registration_key, ComplianceStatus, OperationKind, RegistryEntry,
};

/// A registered capability module, one variant per category.
#[derive(Clone)]
enum ModuleHandle {
    OAuth(Arc<dyn OAuthFlow>),
    ApiKey(Arc<dyn ApiKeyAuth>),
    Streaming(Arc<dyn ChatStreaming>),
    Models(Arc<dyn ModelCatalog>),
}

impl ModuleHandle {
    fn as_module(&self) -> &dyn ProviderModule {
        match self {
            ModuleHandle::OAuth(m) => m.as_ref(),
            ModuleHandle::ApiKey(m) => m.as_ref(),
            ModuleHandle::Streaming(m) => m.as_ref(),
            ModuleHandle::Models(m) => m.as_ref(),
        }
    }
}

/// Builder for the provider registration map.
#[derive(Default)]
pub struct RegistryBuilder {
    modules: HashMap<(ProviderIdentity, OperationKind), ModuleHandle>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oauth(mut self, module: Arc<dyn OAuthFlow>) -> Self {
        self.modules.insert(
            (module.provider(), OperationKind::OAuth),
            ModuleHandle::OAuth(module),
        );
        self
    }

    pub fn api_key(mut self, module: Arc<dyn ApiKeyAuth>) -> Self {
        self.modules.insert(
            (module.provider(), OperationKind::ApiKey),
            ModuleHandle::ApiKey(module),
        );
        self
    }

    pub fn streaming(mut self, module: Arc<dyn ChatStreaming>) -> Self {
        self.modules.insert(
            (module.provider(), OperationKind::Streaming),
            ModuleHandle::Streaming(module),
        );
        self
    }

    pub fn models(mut self, module: Arc<dyn ModelCatalog>) -> Self {
        self.modules.insert(
            (module.provider(), OperationKind::Models),
            ModuleHandle::Models(module),
        );
        self
    }

    /// Validates every (provider, category) pair and produces the registry.
    pub fn build(self) -> ProviderRegistry {
        let registry = ProviderRegistry {
            modules: self.modules,
            report: ArcSwap::from_pointee(Vec::new()),
        };
        registry.refresh();
        registry
    }
}

/// Validated provider registry with an atomically swapped compliance report.
pub struct ProviderRegistry {
    modules: HashMap<(ProviderIdentity, OperationKind), ModuleHandle>,
    report: ArcSwap<Vec<RegistryEntry>>,
}

impl ProviderRegistry {
    /// The current compliance report. Cheap clone of an `Arc`; never blocks.
    pub fn registry(&self) -> Arc<Vec<RegistryEntry>> {
        self.report.load_full()
    }

    /// The compliance entry for one provider.
    pub fn provider(&self, id: ProviderIdentity) -> Result<RegistryEntry, PluraError> {
        self.report
            .load()
            .iter()
            .find(|e| e.provider == id)
            .cloned()
            .ok_or_else(|| PluraError::NotRegistered { key: id.to_string() })
    }

    /// Re-validates every registered module and swaps in the new report
    /// atomically. Readers holding the previous report keep a consistent
    /// snapshot.
    pub fn refresh(&self) {
        let entries: Vec<RegistryEntry> = ProviderIdentity::all()
            .into_iter()
            .map(|provider| self.validate_provider(provider))
            .collect();

        let valid = entries.iter().filter(|e| e.is_valid()).count();
        info!(
            providers = entries.len(),
            valid,
            invalid = entries.len() - valid,
            "provider registry rebuilt"
        );
        for entry in entries.iter().filter(|e| !e.is_valid()) {
            warn!(
                provider = %entry.provider,
                errors = ?entry.errors,
                "provider failed compliance validation"
            );
        }

        self.report.store(Arc::new(entries));
    }

    fn validate_provider(&self, provider: ProviderIdentity) -> RegistryEntry {
        let mut operations = Vec::new();
        let mut capabilities = HashMap::new();
        let mut errors = Vec::new();

        for kind in OperationKind::all() {
            let key = registration_key(provider, kind);
            match self.modules.get(&(provider, kind)) {
                None => {
                    errors.push(format!("not_found: no module registered under '{key}'"));
                }
                Some(handle) => {
                    let declared: Vec<String> = handle
                        .as_module()
                        .operations()
                        .iter()
                        .map(|s| s.to_string())
                        .collect();
                    let missing: Vec<&str> = kind
                        .required_operations()
                        .iter()
                        .filter(|required| !declared.iter().any(|d| d == **required))
                        .copied()
                        .collect();
                    if missing.is_empty() {
                        operations.push(kind);
                        capabilities.insert(kind, declared);
                    } else {
                        for op in missing {
                            errors.push(format!(
                                "found_but_invalid: '{key}' is missing operation '{op}'"
                            ));
                        }
                    }
                }
            }
        }

        let status = if errors.is_empty() {
            ComplianceStatus::Valid
        } else {
            ComplianceStatus::Invalid
        };
        RegistryEntry {
            provider,
            operations,
            capabilities,
            status,
            errors,
        }
    }

    /// Resolves the OAuth flow for a provider.
    pub fn oauth(&self, id: ProviderIdentity) -> Result<Arc<dyn OAuthFlow>, PluraError> {
        match self.modules.get(&(id, OperationKind::OAuth)) {
            Some(ModuleHandle::OAuth(m)) => Ok(Arc::clone(m)),
            _ => Err(PluraError::NotRegistered {
                key: registration_key(id, OperationKind::OAuth),
            }),
        }
    }

    /// Resolves the API-key auth for a provider.
    pub fn api_key(&self, id: ProviderIdentity) -> Result<Arc<dyn ApiKeyAuth>, PluraError> {
        match self.modules.get(&(id, OperationKind::ApiKey)) {
            Some(ModuleHandle::ApiKey(m)) => Ok(Arc::clone(m)),
            _ => Err(PluraError::NotRegistered {
                key: registration_key(id, OperationKind::ApiKey),
            }),
        }
    }

    /// Resolves the chat streaming implementation for a provider.
    pub fn streaming(
        &self,
        id: ProviderIdentity,
    ) -> Result<Arc<dyn ChatStreaming>, PluraError> {
        match self.modules.get(&(id, OperationKind::Streaming)) {
            Some(ModuleHandle::Streaming(m)) => Ok(Arc::clone(m)),
            _ => Err(PluraError::NotRegistered {
                key: registration_key(id, OperationKind::Streaming),
            }),
        }
    }

    /// Resolves the model catalog for a provider.
    pub fn models(&self, id: ProviderIdentity) -> Result<Arc<dyn ModelCatalog>, PluraError> {
        match self.modules.get(&(id, OperationKind::Models)) {
            Some(ModuleHandle::Models(m)) => Ok(Arc::clone(m)),
            _ => Err(PluraError::NotRegistered {
                key: registration_key(id, OperationKind::Models),
            }),
        }
    }
}
