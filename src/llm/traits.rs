//! LLM client abstraction
//!
//! Generic over the backend so the orchestrator can run against a real hosted
//! model or a scripted stub in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{Message, Result, TokenUsage};

/// Per-call inference parameters, selected by the adapter based on model family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// A tool schema entry sent to the model in the request's tool catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Request assembled by the adapter and handed to the backend.
#[derive(Debug, Clone)]
pub struct ConverseRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub inference_config: InferenceConfig,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other,
}

/// Normalized response handed back to the orchestrator.
#[derive(Debug, Clone)]
pub struct ConverseResponse {
    pub message: Message,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

/// A backend capable of running one Converse-style turn.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn converse(&self, request: ConverseRequest) -> Result<ConverseResponse>;
}
