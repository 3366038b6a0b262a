// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses and non-zero limits.

use crate::model::PluraConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err` with all collected
/// validation error messages (does not fail fast).
pub fn validate_config(config: &PluraConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.sandbox.root.trim().is_empty() {
        errors.push("sandbox.root must not be empty".to_string());
    }

    if config.sandbox.shell_timeout_secs == 0 {
        errors.push("sandbox.shell_timeout_secs must be at least 1".to_string());
    }

    if config.sandbox.fetch_max_bytes == 0 {
        errors.push("sandbox.fetch_max_bytes must be at least 1".to_string());
    }

    let host = config.callback.host.trim();
    if host.is_empty() {
        errors.push("callback.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(format!(
                "callback.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.oauth.state_ttl_secs == 0 {
        errors.push("oauth.state_ttl_secs must be at least 1".to_string());
    }

    let redirect = config.oauth.redirect_uri.trim();
    if !(redirect.starts_with("http://") || redirect.starts_with("https://")) {
        errors.push(format!(
            "oauth.redirect_uri `{redirect}` must be an http(s) URL"
        ));
    }

    for (section, url) in [
        ("anthropic", &config.anthropic.base_url),
        ("openai", &config.openai.base_url),
        ("gemini", &config.gemini.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("{section}.base_url `{url}` must be an http(s) URL"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
