// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Handles request construction, authentication, streaming SSE responses,
//! and transient error retry.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use plura_core::{PluraError, ProviderClient, RawEvent, RawEventStream};

use crate::types::{ApiErrorResponse, MessageRequest, ModelsResponse};

/// How the client authenticates against the API.
#[derive(Debug, Clone)]
pub enum AnthropicAuth {
    /// Static API key, sent as `x-api-key`.
    ApiKey(String),
    /// OAuth access token, sent as a Bearer token.
    Bearer(String),
}

/// HTTP client for Anthropic API communication.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 500, 503, 529).
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(
        auth: AnthropicAuth,
        api_version: &str,
        base_url: &str,
    ) -> Result<Self, PluraError> {
        let mut headers = HeaderMap::new();
        match auth {
            AnthropicAuth::ApiKey(key) => {
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(&key).map_err(|e| {
                        PluraError::Config(format!("invalid API key header value: {e}"))
                    })?,
                );
            }
            AnthropicAuth::Bearer(token) => {
                headers.insert(
                    "authorization",
                    HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                        PluraError::Config(format!("invalid bearer header value: {e}"))
                    })?,
                );
            }
        }
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                PluraError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| PluraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Materializes a client from a [`ProviderClient`] data handle.
    pub fn from_handle(handle: &ProviderClient) -> Result<Self, PluraError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &handle.default_headers {
            let name: reqwest::header::HeaderName = name.parse().map_err(|e| {
                PluraError::Config(format!("invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PluraError::Config(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(handle.timeout)
            .build()
            .map_err(|e| PluraError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            base_url: handle.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Sends a streaming Messages request and returns the raw event stream.
    ///
    /// On transient errors, retries once after a 1-second delay.
    pub async fn stream_messages(
        &self,
        request: &MessageRequest,
    ) -> Result<RawEventStream, PluraError> {
        let mut req = request.clone();
        req.stream = true;
        let url = format!("{}/v1/messages", self.base_url);

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(&req)
                .send()
                .await
                .map_err(|e| PluraError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "streaming response received");

            if status.is_success() {
                return Ok(raw_event_stream(response));
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(PluraError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        Err(last_error.unwrap_or_else(|| PluraError::Provider {
            message: "streaming request failed after retries".into(),
            source: None,
        }))
    }

    /// Lists the model identifiers available to the credentials.
    pub async fn list_models(&self) -> Result<Vec<String>, PluraError> {
        let url = format!("{}/v1/models", self.base_url);

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying models request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response =
                self.client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| PluraError::Provider {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    })?;

            let status = response.status();

            if status.is_success() {
                let body = response.text().await.map_err(|e| PluraError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let models: ModelsResponse =
                    serde_json::from_str(&body).map_err(|e| PluraError::Provider {
                        message: format!("failed to parse models response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(models.data.into_iter().map(|m| m.id).collect());
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(PluraError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            return Err(api_error(status, response.text().await.unwrap_or_default()));
        }

        Err(last_error.unwrap_or_else(|| PluraError::Provider {
            message: "models request failed after retries".into(),
            source: None,
        }))
    }

    /// Makes a minimal authenticated request to prove the credentials work.
    pub async fn test_connection(&self) -> Result<(), PluraError> {
        self.list_models().await.map(|_| ())
    }
}

/// Converts a streaming response body into raw SSE events.
///
/// Event payloads are decoded to JSON; events with undecodable payloads
/// surface as stream errors. Unknown event names pass through for the
/// parser to ignore, per Anthropic's API versioning policy.
fn raw_event_stream(response: reqwest::Response) -> RawEventStream {
    let events = response.bytes_stream().eventsource().map(|result| {
        match result {
            Ok(event) => {
                let data = if event.data.trim().is_empty() {
                    serde_json::Value::Null
                } else {
                    serde_json::from_str(&event.data).map_err(|e| PluraError::Provider {
                        message: format!("failed to parse event '{}': {e}", event.event),
                        source: Some(Box::new(e)),
                    })?
                };
                Ok(RawEvent::new(event.event, data))
            }
            Err(e) => Err(PluraError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            }),
        }
    });
    Box::pin(events)
}

fn api_error(status: reqwest::StatusCode, body: String) -> PluraError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
        format!(
            "Anthropic API error ({}): {}",
            api_err.error.type_, api_err.error.message
        )
    } else {
        format!("API returned {status}: {body}")
    };
    PluraError::Provider {
        message,
        source: None,
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
