// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.
//!
//! The streaming endpoint speaks data-only SSE: every frame is a `data:`
//! line with a JSON chunk, and the literal `data: [DONE]` closes the
//! stream. Frames are surfaced as [`RawEvent`]s with the event name left
//! empty and `[DONE]` mapped to the synthetic `done` event.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use plura_core::{PluraError, ProviderClient, RawEvent, RawEventStream};

use crate::types::{ApiErrorResponse, ChatRequest, ModelsResponse};

pub(crate) const DONE_EVENT: &str = "done";

/// HTTP client for OpenAI API communication. Authenticates with a Bearer
/// token (API key or OAuth access token) and retries transient errors
/// (429, 500, 503) once.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(bearer_token: &str, base_url: &str) -> Result<Self, PluraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {bearer_token}")).map_err(|e| {
                PluraError::Config(format!("invalid bearer header value: {e}"))
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

    /// Sends a streaming chat-completions request and returns the raw
    /// event stream. Retries once on transient errors.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<RawEventStream, PluraError> {
        let mut req = request.clone();
        req.stream = true;
        let url = format!("{}/v1/chat/completions", self.base_url);

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

/// Converts a data-only SSE response into raw events. `[DONE]` becomes a
/// `done` event with a null payload; everything else must be JSON.
fn raw_event_stream(response: reqwest::Response) -> RawEventStream {
    let events = response.bytes_stream().eventsource().map(|result| {
        match result {
            Ok(event) => {
                let trimmed = event.data.trim();
                if trimmed == "[DONE]" {
                    return Ok(RawEvent::new(DONE_EVENT, serde_json::Value::Null));
                }
                let data = if trimmed.is_empty() {
                    serde_json::Value::Null
                } else {
                    serde_json::from_str(trimmed).map_err(|e| PluraError::Provider {
                        message: format!("failed to parse stream chunk: {e}"),
                        source: Some(Box::new(e)),
                    })?
                };
                Ok(RawEvent::data_only(data))
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
            "OpenAI API error ({}): {}",
            api_err.error.type_.as_deref().unwrap_or("unknown"),
            api_err.error.message
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
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![crate::types::ApiMessage::text("user", "Hello")],
            max_tokens: 1024,
            stream: true,
            tools: None,
        }
    }

    #[tokio::test]
    async fn stream_chat_yields_chunks_and_done_sentinel() {
        let server = MockServer::start().await;
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
                   data: [DONE]\n\n";

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test", &server.uri()).unwrap();
        let mut stream = client.stream_chat(&test_request()).await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.data["choices"][0]["delta"]["content"], "Hi");

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.event, DONE_EVENT);
        assert!(second.data.is_null());
    }

    #[tokio::test]
    async fn stream_chat_retries_on_429() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("data: [DONE]\n\n"),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test", &server.uri()).unwrap();
        let mut stream = client.stream_chat(&test_request()).await.unwrap();
        let event = stream.next().await.unwrap().unwrap();
        assert_eq!(event.event, DONE_EVENT);
    }

    #[tokio::test]
    async fn stream_chat_fails_on_401() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "invalid_request_error", "message": "Invalid API key"}
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(&error_body))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-bad", &server.uri()).unwrap();
        let Err(err) = client.stream_chat(&test_request()).await else {
            panic!("expected the request to fail");
        };
        assert!(err.to_string().contains("invalid_request_error"));
    }

    #[tokio::test]
    async fn list_models_parses_ids() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "object": "list",
            "data": [
                {"id": "gpt-4o", "object": "model"},
                {"id": "gpt-4o-mini", "object": "model"}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test", &server.uri()).unwrap();
        let models = client.list_models().await.unwrap();
        assert_eq!(models, vec!["gpt-4o", "gpt-4o-mini"]);
    }
}
