// SPDX-FileCopyrightText: 2026 Plura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The streaming turn loop.
//!
//! One turn streams the assistant's response, folding raw provider events
//! through the module's pure parser. Tool calls are executed in the
//! sandbox, the follow-up pair is appended, and the loop re-streams until
//! a turn completes without tool calls.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use plura_core::traits::ChatStreaming;
use plura_core::{
    ConversationMessage, PluraError, Session, StreamItem, StreamOptions, StreamParserState,
    ToolCall,
};
use plura_sandbox::Sandbox;

use crate::followup::execute_followup;

/// Upper bound on tool rounds within one logical turn. A model that keeps
/// requesting tools past this is cut off with an error.
const MAX_TOOL_ROUNDS: usize = 8;

/// The result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// The full conversation including everything this turn appended.
    pub messages: Vec<ConversationMessage>,
    /// The provider's stop reason from the final round, when it sent one.
    pub stop_reason: Option<String>,
}

/// Runs one logical turn to completion, including any tool rounds.
pub async fn run_turn(
    streaming: &Arc<dyn ChatStreaming>,
    sandbox: &Sandbox,
    session: &Session,
    mut messages: Vec<ConversationMessage>,
    options: &StreamOptions,
) -> Result<TurnResult, PluraError> {
    for round in 0..MAX_TOOL_ROUNDS {
        let mut stream = streaming.stream_chat(session, &messages, options).await?;

        let mut state = StreamParserState::default();
        let mut text = String::new();
        let mut calls: Vec<ToolCall> = Vec::new();
        let mut stop_reason = None;

        while let Some(event) = stream.next().await {
            let event = event?;
            let (items, next) = streaming.parse_stream_event(event, state);
            state = next;
            for item in items {
                match item {
                    StreamItem::TextDelta(delta) => text.push_str(&delta),
                    StreamItem::ToolCall(call) => calls.push(call),
                    StreamItem::Done { stop_reason: r } => stop_reason = r,
                }
            }
            if state.is_done() {
                break;
            }
        }
        drop(stream);

        if calls.is_empty() {
            debug!(round, "turn completed without tool calls");
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                messages.push(ConversationMessage::assistant_text(trimmed));
            }
            return Ok(TurnResult {
                messages,
                stop_reason,
            });
        }

        debug!(round, calls = calls.len(), "executing tool round");
        let prior_text = if text.trim().is_empty() {
            None
        } else {
            Some(text.as_str())
        };
        let (next_messages, _outcomes) =
            execute_followup(sandbox, &messages, &calls, prior_text).await;
        messages = next_messages;
    }

    warn!(max = MAX_TOOL_ROUNDS, "tool round limit exceeded");
    Err(PluraError::Internal(format!(
        "turn exceeded {MAX_TOOL_ROUNDS} tool rounds"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plura_core::traits::{ProviderModule, STREAMING_OPERATIONS};
    use plura_core::{
        AuthKind, CallArguments, ContentBlock, ParserPhase, ProviderIdentity, RawEvent,
        RawEventStream, Role,
    };
    use plura_test_utils::script_stream;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Streaming module whose wire format is already canonical: events
    /// named "text", "call", and "done" with self-describing payloads.
    struct ScriptedStreaming {
        rounds: Mutex<VecDeque<Vec<RawEvent>>>,
    }

    impl ScriptedStreaming {
        fn new(rounds: Vec<Vec<RawEvent>>) -> Self {
            Self {
                rounds: Mutex::new(rounds.into()),
            }
        }
    }

    impl ProviderModule for ScriptedStreaming {
        fn name(&self) -> &str {
            "scripted-streaming"
        }
        fn provider(&self) -> ProviderIdentity {
            ProviderIdentity::Anthropic
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn operations(&self) -> Vec<&'static str> {
            STREAMING_OPERATIONS.to_vec()
        }
    }

    #[async_trait]
    impl ChatStreaming for ScriptedStreaming {
        async fn stream_chat(
            &self,
            _session: &Session,
            _messages: &[ConversationMessage],
            _options: &StreamOptions,
        ) -> Result<RawEventStream, PluraError> {
            let round = self
                .rounds
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| PluraError::Internal("script exhausted".into()))?;
            Ok(script_stream(round))
        }

        fn parse_stream_event(
            &self,
            event: RawEvent,
            mut state: StreamParserState,
        ) -> (Vec<StreamItem>, StreamParserState) {
            if state.is_done() {
                return (Vec::new(), state);
            }
            let items = match event.event.as_str() {
                "text" => vec![StreamItem::TextDelta(
                    event.data["text"].as_str().unwrap_or_default().to_string(),
                )],
                "call" => vec![StreamItem::ToolCall(ToolCall {
                    id: event.data["id"].as_str().unwrap_or_default().to_string(),
                    name: event.data["name"].as_str().unwrap_or_default().to_string(),
                    arguments: CallArguments::Structured(event.data["args"].clone()),
                })],
                "done" => {
                    state.phase = ParserPhase::Done;
                    vec![StreamItem::Done {
                        stop_reason: event.data["reason"].as_str().map(str::to_owned),
                    }]
                }
                _ => Vec::new(),
            };
            (items, state)
        }
    }

    fn session() -> Session {
        Session {
            id: "sess-1".into(),
            provider: ProviderIdentity::Anthropic,
            auth_kind: AuthKind::ApiKey,
            display_name: "work".into(),
            credentials: json!({"api_key": "k"}),
            expires_at: None,
            needs_reauth: false,
            version: 0,
        }
    }

    fn options() -> StreamOptions {
        StreamOptions {
            model: "test-model".into(),
            max_tokens: 1024,
            tools: vec![],
            system_prompt: None,
        }
    }

    fn sandbox(dir: &tempfile::TempDir) -> Sandbox {
        Sandbox::new(dir.path(), Duration::from_secs(5), 1024).unwrap()
    }

    #[tokio::test]
    async fn text_only_turn_appends_one_assistant_message() {
        let streaming: Arc<dyn ChatStreaming> = Arc::new(ScriptedStreaming::new(vec![vec![
            RawEvent::new("text", json!({"text": "hello "})),
            RawEvent::new("text", json!({"text": "there"})),
            RawEvent::new("done", json!({"reason": "end_turn"})),
        ]]));
        let dir = tempfile::tempdir().unwrap();

        let result = run_turn(
            &streaming,
            &sandbox(&dir),
            &session(),
            vec![ConversationMessage::user_text("hi")],
            &options(),
        )
        .await
        .unwrap();

        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[1].role, Role::Assistant);
        assert_eq!(
            result.messages[1].content,
            vec![ContentBlock::Text {
                text: "hello there".into()
            }]
        );
        assert_eq!(result.stop_reason.as_deref(), Some("end_turn"));
    }

    #[tokio::test]
    async fn tool_round_appends_followup_pair_then_final_text() {
        let streaming: Arc<dyn ChatStreaming> = Arc::new(ScriptedStreaming::new(vec![
            vec![
                RawEvent::new("text", json!({"text": "checking"})),
                RawEvent::new(
                    "call",
                    json!({"id": "c1", "name": "shell", "args": {"command": "echo hi"}}),
                ),
                RawEvent::new("done", json!({"reason": "tool_use"})),
            ],
            vec![
                RawEvent::new("text", json!({"text": "it said hi"})),
                RawEvent::new("done", json!({"reason": "end_turn"})),
            ],
        ]));
        let dir = tempfile::tempdir().unwrap();

        let result = run_turn(
            &streaming,
            &sandbox(&dir),
            &session(),
            vec![ConversationMessage::user_text("run echo")],
            &options(),
        )
        .await
        .unwrap();

        // history + assistant(text, tool_use) + user(tool_result) + assistant(text)
        assert_eq!(result.messages.len(), 4);

        let tool_turn = &result.messages[1];
        assert_eq!(tool_turn.role, Role::Assistant);
        assert!(matches!(
            tool_turn.content[1],
            ContentBlock::ToolUse { .. }
        ));

        match &result.messages[2].content[0] {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id, "c1");
                assert_eq!(content.trim(), "hi");
                assert_eq!(*is_error, None);
            }
            other => panic!("expected tool result, got {other:?}"),
        }

        assert_eq!(
            result.messages[3].content,
            vec![ContentBlock::Text {
                text: "it said hi".into()
            }]
        );
        assert_eq!(result.stop_reason.as_deref(), Some("end_turn"));
    }

    #[tokio::test]
    async fn failed_tool_call_still_reaches_the_model() {
        let streaming: Arc<dyn ChatStreaming> = Arc::new(ScriptedStreaming::new(vec![
            vec![
                RawEvent::new(
                    "call",
                    json!({"id": "c1", "name": "read_file", "args": {"path": "../escape"}}),
                ),
                RawEvent::new("done", json!({"reason": "tool_use"})),
            ],
            vec![RawEvent::new("done", json!({"reason": "end_turn"}))],
        ]));
        let dir = tempfile::tempdir().unwrap();

        let result = run_turn(
            &streaming,
            &sandbox(&dir),
            &session(),
            vec![],
            &options(),
        )
        .await
        .unwrap();

        match &result.messages[1].content[0] {
            ContentBlock::ToolResult {
                content, is_error, ..
            } => {
                assert_eq!(*is_error, Some(true));
                assert!(content.contains("outside sandbox root"));
            }
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn endless_tool_requests_are_cut_off() {
        let round = vec![
            RawEvent::new(
                "call",
                json!({"id": "c1", "name": "shell", "args": {"command": "true"}}),
            ),
            RawEvent::new("done", json!({"reason": "tool_use"})),
        ];
        let streaming: Arc<dyn ChatStreaming> =
            Arc::new(ScriptedStreaming::new(vec![round; 20]));
        let dir = tempfile::tempdir().unwrap();

        let err = run_turn(
            &streaming,
            &sandbox(&dir),
            &session(),
            vec![],
            &options(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PluraError::Internal(_)));
    }
}
