// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plura.toml` > `~/.config/plura/plura.toml` > `/etc/plura/plura.toml`
//! with environment variable overrides via `PLURA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PluraConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plura/plura.toml` (system-wide)
/// 3. `~/.config/plura/plura.toml` (user XDG config)
/// 4. `./plura.toml` (local directory)
/// 5. `PLURA_*` environment variables
pub fn load_config() -> Result<PluraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluraConfig::default()))
        .merge(Toml::file("/etc/plura/plura.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("plura/plura.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("plura.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PluraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluraConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PluraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluraConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PLURA_SANDBOX_SHELL_TIMEOUT_SECS`
/// must map to `sandbox.shell_timeout_secs`, not `sandbox.shell.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("PLURA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PLURA_SANDBOX_FETCH_MAX_BYTES -> "sandbox_fetch_max_bytes"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("sandbox_", "sandbox.", 1)
            .replacen("callback_", "callback.", 1)
            .replacen("oauth_", "oauth.", 1)
            .replacen("anthropic_", "anthropic.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("gemini_", "gemini.", 1);
        mapped.into()
    })
}
