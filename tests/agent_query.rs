//! Orchestrator integration tests
//!
//! Drives `handle_user_query` end to end against a scripted stub LLM client
//! and the in-memory fake browser worker, exercising the query-level
//! scenarios without a live Bedrock endpoint or a real Chromium binary.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use ariapilot::agent::{handle_user_query, QueryStatus};
use ariapilot::core::{AgentError, ContentBlock, ElementRef, Message, MessageRole, Result, TokenUsage, ToolResultStatus};
use ariapilot::llm::{ConverseRequest, ConverseResponse, LlmClient, StopReason};
use ariapilot::tools::browser::fake::{spawn_fake, FakePage};

/// A scripted LLM client that replays a fixed sequence of responses.
struct StubLlm {
    responses: Mutex<VecDeque<ConverseResponse>>,
}

impl StubLlm {
    fn new(responses: Vec<ConverseResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn converse(&self, _request: ConverseRequest) -> Result<ConverseResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::llm("stub exhausted its scripted responses"))
    }
}

fn assistant_text(text: &str, usage: (u64, u64)) -> ConverseResponse {
    let mut tu = TokenUsage::default();
    tu.add(usage.0, usage.1);
    ConverseResponse {
        message: Message {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::Text { text: text.to_string() }],
        },
        stop_reason: StopReason::EndTurn,
        usage: tu,
    }
}

fn assistant_tool_use(id: &str, name: &str, input: serde_json::Value, usage: (u64, u64)) -> ConverseResponse {
    let mut tu = TokenUsage::default();
    tu.add(usage.0, usage.1);
    ConverseResponse {
        message: Message {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            }],
        },
        stop_reason: StopReason::ToolUse,
        usage: tu,
    }
}

fn button_page(url: &str) -> FakePage {
    FakePage::new(
        url,
        vec![ElementRef {
            ref_id: 1,
            role: "button".into(),
            name: "Submit".into(),
        }],
    )
}

/// S1 - a trivial end_turn with no tool calls.
#[tokio::test]
async fn trivial_end_turn_returns_success() {
    let worker = spawn_fake(button_page("https://example.com"));
    let llm = StubLlm::new(vec![assistant_text("hi", (10, 2))]);

    let outcome = handle_user_query("hello", &llm, "system", "anthropic.claude-3-5", &worker, 20)
        .await
        .unwrap();

    assert_eq!(outcome.status, QueryStatus::Success);
    assert_eq!(outcome.messages.len(), 2);
    assert_eq!(outcome.messages[0].text().unwrap(), "hello");
    assert_eq!(outcome.token_usage.total, 12);
}

/// S2 - a single click, then a final answer.
#[tokio::test]
async fn single_click_then_final_answer() {
    let worker = spawn_fake(button_page("https://example.com"));
    let llm = StubLlm::new(vec![
        assistant_tool_use("t1", "click_element", serde_json::json!({"ref_id": 1}), (20, 5)),
        assistant_text("done", (15, 3)),
    ]);

    let outcome = handle_user_query("click submit", &llm, "system", "anthropic.claude-3-5", &worker, 20)
        .await
        .unwrap();

    assert_eq!(outcome.status, QueryStatus::Success);
    // seed, assistant(tool_use), user(tool_result), assistant(final)
    assert_eq!(outcome.messages.len(), 4);
    let tool_result = &outcome.messages[2].content[0];
    match tool_result {
        ContentBlock::ToolResult { status, .. } => assert_eq!(*status, ToolResultStatus::Success),
        other => panic!("expected a tool result block, got {other:?}"),
    }
    assert_eq!(outcome.token_usage.total, 43);
}

/// S4 - a click on a ref_id that doesn't exist on the page times out but the
/// query still completes once the model recovers with a final answer.
#[tokio::test]
async fn click_on_missing_ref_id_is_recoverable() {
    let worker = spawn_fake(button_page("https://example.com"));
    let llm = StubLlm::new(vec![
        assistant_tool_use("t1", "click_element", serde_json::json!({"ref_id": 999}), (10, 2)),
        assistant_text("I could not find that element", (8, 4)),
    ]);

    let outcome = handle_user_query("click the missing button", &llm, "system", "anthropic.claude-3-5", &worker, 20)
        .await
        .unwrap();

    assert_eq!(outcome.status, QueryStatus::Success);
    let tool_result = &outcome.messages[2].content[0];
    match tool_result {
        ContentBlock::ToolResult { status, content, .. } => {
            assert_eq!(*status, ToolResultStatus::Error);
            assert!(content.contains("timed out"));
        }
        other => panic!("expected a tool result block, got {other:?}"),
    }
}

/// S5 - a malformed tool call (missing a required parameter) never reaches
/// the worker and is reported back as a synthetic error result.
#[tokio::test]
async fn malformed_tool_call_short_circuits_before_worker() {
    let worker = spawn_fake(button_page("https://example.com"));
    let llm = StubLlm::new(vec![
        assistant_tool_use("t1", "input_text", serde_json::json!({"ref_id": 1}), (10, 2)),
        assistant_text("retrying", (8, 2)),
    ]);

    let outcome = handle_user_query("type something", &llm, "system", "anthropic.claude-3-5", &worker, 20)
        .await
        .unwrap();

    let tool_result = &outcome.messages[2].content[0];
    match tool_result {
        ContentBlock::ToolResult { status, content, .. } => {
            assert_eq!(*status, ToolResultStatus::Error);
            assert!(content.contains("missing required parameter"));
        }
        other => panic!("expected a tool result block, got {other:?}"),
    }
}

/// S6 - the model never stops calling tools; the orchestrator enforces the
/// turn budget rather than looping forever.
#[tokio::test]
async fn turn_budget_is_enforced() {
    let worker = spawn_fake(button_page("https://example.com"));
    let responses: Vec<ConverseResponse> = (0..5)
        .map(|i| {
            assistant_tool_use(
                &format!("t{i}"),
                "click_element",
                serde_json::json!({"ref_id": 1}),
                (5, 1),
            )
        })
        .collect();
    let llm = StubLlm::new(responses);

    let outcome = handle_user_query("keep clicking forever", &llm, "system", "anthropic.claude-3-5", &worker, 5)
        .await
        .unwrap();

    assert_eq!(outcome.status, QueryStatus::Error);
    assert_eq!(outcome.message.as_deref(), Some("Maximum turns reached"));
    assert_eq!(outcome.token_usage.total, 30);
}

/// An LLM transport failure is recorded into the outcome rather than
/// propagated as a Rust error, preserving partial history.
#[tokio::test]
async fn llm_failure_preserves_partial_history() {
    let worker = spawn_fake(button_page("https://example.com"));
    let llm = StubLlm::new(vec![]); // exhausted immediately

    let outcome = handle_user_query("hello", &llm, "system", "anthropic.claude-3-5", &worker, 20)
        .await
        .unwrap();

    assert_eq!(outcome.status, QueryStatus::Error);
    assert_eq!(outcome.messages.len(), 1);
    assert!(outcome.message.unwrap().contains("exhausted"));
}
