//! Turn orchestrator
//!
//! Drives the perceive → reason → act loop: seeds conversation state from an
//! initial snapshot, calls the LLM, dispatches any tool calls it asks for,
//! and loops until the model signals completion or the turn budget runs out.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::core::{Config, ContentBlock, Message, Result, TokenUsage, ToolResultStatus};
use crate::llm::{BedrockClient, ConverseRequest, LlmClient, StopReason};
use crate::prompt::{tool_catalog, DEFAULT_SYSTEM_PROMPT};
use crate::tools::browser::{WorkerCommand, WorkerHandle};
use crate::tools::dispatcher;

/// How a query concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Success,
    Error,
}

/// Result of running [`handle_user_query`] to completion.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub status: QueryStatus,
    pub messages: Vec<Message>,
    pub token_usage: TokenUsage,
    pub message: Option<String>,
}

/// Drive a single query end to end.
///
/// Seeds the conversation from a fresh worker snapshot, then alternates LLM
/// calls and tool dispatch until the model reaches `end_turn`, fails, or the
/// turn budget (`max_turns`) is exhausted.
pub async fn handle_user_query(
    user_input: &str,
    llm_client: &dyn LlmClient,
    system_prompt: &str,
    model_id: &str,
    worker: &WorkerHandle,
    max_turns: usize,
) -> Result<QueryOutcome> {
    let seed_response = worker.send(WorkerCommand::GetAriaSnapshot).await?;
    let seed_snapshot = seed_response.aria_snapshot.unwrap_or_default();

    let mut conversation = Conversation::new();
    conversation.seed(user_input, &seed_snapshot);

    let mut token_usage = TokenUsage::default();
    let tools = tool_catalog();

    for turn in 0..max_turns {
        debug!(turn, max_turns, "starting orchestrator turn");

        let request = ConverseRequest {
            model_id: model_id.to_string(),
            system_prompt: system_prompt.to_string(),
            messages: conversation.api_history().to_vec(),
            tools: tools.clone(),
            inference_config: BedrockClient::inference_config_for(model_id),
        };

        let response = match llm_client.converse(request).await {
            Ok(r) => r,
            Err(e) => {
                return Ok(QueryOutcome {
                    status: QueryStatus::Error,
                    messages: conversation.into_display_history(),
                    token_usage,
                    message: Some(e.to_string()),
                });
            }
        };

        token_usage.add(response.usage.input, response.usage.output);
        conversation.push_assistant(response.message.content.clone());

        let tool_uses: Vec<(String, String, serde_json::Value)> = response
            .message
            .tool_uses()
            .into_iter()
            .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
            .collect();

        if tool_uses.is_empty() {
            return match response.stop_reason {
                StopReason::EndTurn => Ok(QueryOutcome {
                    status: QueryStatus::Success,
                    messages: conversation.into_display_history(),
                    token_usage,
                    message: None,
                }),
                StopReason::MaxTokens => {
                    warn!("model stopped at max_tokens with no tool calls");
                    Ok(QueryOutcome {
                        status: QueryStatus::Success,
                        messages: conversation.into_display_history(),
                        token_usage,
                        message: Some("response may be truncated (max_tokens)".to_string()),
                    })
                }
                _ => Ok(QueryOutcome {
                    status: QueryStatus::Error,
                    messages: conversation.into_display_history(),
                    token_usage,
                    message: Some("model stopped without a final answer or tool call".to_string()),
                }),
            };
        }

        info!(turn, tool_calls = tool_uses.len(), "dispatching tool calls");

        let mut result_blocks = Vec::with_capacity(tool_uses.len());
        for (id, name, input) in &tool_uses {
            let payload = dispatcher::dispatch(worker, name, input).await;
            let status = payload.status;
            result_blocks.push(ContentBlock::ToolResult {
                id: id.clone(),
                content: payload.to_json_string(),
                status,
            });
            if status == ToolResultStatus::Error {
                debug!(tool = %name, "tool call returned an error result");
            }
        }

        conversation.push_tool_results(result_blocks);
    }

    Ok(QueryOutcome {
        status: QueryStatus::Error,
        messages: conversation.into_display_history(),
        token_usage,
        message: Some("Maximum turns reached".to_string()),
    })
}

/// Convenience bundle pairing a worker handle, config, and LLM client so
/// embedders can call `agent.run(input)` instead of wiring the pieces by hand.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    worker: WorkerHandle,
    system_prompt: String,
}

impl Agent {
    /// Launch a browser worker and build a Bedrock-backed agent from config.
    pub async fn new(config: Config) -> Result<Self> {
        let worker = crate::tools::browser::spawn(config.browser.clone()).await?;
        let llm = BedrockClient::new(config.llm.region.clone()).await;
        let system_prompt = config
            .agent
            .system_prompt_override
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        Ok(Self {
            config,
            llm: Arc::new(llm),
            worker,
            system_prompt,
        })
    }

    /// Build an agent around an already-running worker and a caller-supplied
    /// LLM client, e.g. a scripted stub in tests.
    pub fn with_parts(config: Config, llm: Arc<dyn LlmClient>, worker: WorkerHandle) -> Self {
        let system_prompt = config
            .agent
            .system_prompt_override
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        Self {
            config,
            llm,
            worker,
            system_prompt,
        }
    }

    /// Run a single query to completion.
    pub async fn run(&self, user_input: &str) -> Result<QueryOutcome> {
        handle_user_query(
            user_input,
            self.llm.as_ref(),
            &self.system_prompt,
            &self.config.llm.model_id,
            &self.worker,
            self.config.agent.max_turns,
        )
        .await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
