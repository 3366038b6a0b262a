// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Plura provider layer.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use plura_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Sandbox root: {}", config.sandbox.root);
//! ```

#![allow(clippy::result_large_err)]

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PluraConfig;
pub use validation::validate_config;

use plura_core::PluraError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that loads config from TOML files and
/// env vars via Figment, then runs post-deserialization validation. All
/// failures are flattened into [`PluraError::Config`].
pub fn load_and_validate() -> Result<PluraConfig, PluraError> {
    let config = loader::load_config().map_err(|e| PluraError::Config(e.to_string()))?;
    validation::validate_config(&config)
        .map_err(|errors| PluraError::Config(errors.join("; ")))?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<PluraConfig, PluraError> {
    let config = loader::load_config_from_str(toml_content)
        .map_err(|e| PluraError::Config(e.to_string()))?;
    validation::validate_config(&config)
        .map_err(|errors| PluraError::Config(errors.join("; ")))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_str_surfaces_config_error() {
        let err = load_and_validate_str("[sandbox]\nroot = \"\"\n").unwrap_err();
        match err {
            PluraError::Config(msg) => assert!(msg.contains("sandbox.root")),
            other => panic!("expected Config error, got {other}"),
        }
    }

    #[test]
    fn validate_str_accepts_good_config() {
        let config =
            load_and_validate_str("[sandbox]\nroot = \"/work\"\n").expect("valid config");
        assert_eq!(config.sandbox.root, "/work");
    }
}
