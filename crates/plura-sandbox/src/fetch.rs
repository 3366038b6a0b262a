// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! URL fetching with per-URL isolation.
//!
//! URLs are extracted from the call's prompt text by regex and fetched
//! independently: one URL failing never hides another URL's content. Each
//! URL's result lands in its own labeled section.

use regex::Regex;
use tracing::debug;

const URL_PATTERN: &str = r#"https?://[^\s"'<>\)\]]+"#;

pub async fn web_fetch(
    http: &reqwest::Client,
    max_bytes: usize,
    args: &serde_json::Value,
) -> Result<String, String> {
    let prompt = args["prompt"]
        .as_str()
        .or_else(|| args["url"].as_str())
        .ok_or("missing required 'prompt' parameter")?;

    let url_regex = Regex::new(URL_PATTERN).map_err(|e| format!("URL pattern error: {e}"))?;
    let urls: Vec<&str> = url_regex.find_iter(prompt).map(|m| m.as_str()).collect();
    if urls.is_empty() {
        return Err("no URLs found in prompt".to_string());
    }

    let mut sections = Vec::with_capacity(urls.len());
    for url in urls {
        sections.push(format!("## {url}\n{}", fetch_one(http, max_bytes, url).await));
    }
    Ok(sections.join("\n\n"))
}

async fn fetch_one(http: &reqwest::Client, max_bytes: usize, url: &str) -> String {
    debug!(url, "fetching URL");
    let response = match http.get(url).send().await {
        Ok(response) => response,
        Err(e) => return format!("error: request failed: {e}"),
    };
    let status = response.status();
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return format!("error: failed to read body: {e}"),
    };
    format!("HTTP {status}\n{}", truncate_to(body, max_bytes))
}

/// Truncates to at most `max_bytes`, backing off to a char boundary.
fn truncate_to(body: String, max_bytes: usize) -> String {
    if body.len() <= max_bytes {
        return body;
    }
    let mut end = max_bytes;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n[truncated from {} to {end} bytes]",
        &body[..end],
        body.len()
    )
}
