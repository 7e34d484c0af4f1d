//! LLM module - hosted language model integration
//!
//! Speaks the Bedrock Converse API shape directly, behind a swappable
//! [`LlmClient`] trait so the orchestrator can run against a scripted stub in
//! tests.

pub mod bedrock;
pub mod traits;

pub use bedrock::BedrockClient;
pub use traits::{ConverseRequest, ConverseResponse, InferenceConfig, LlmClient, StopReason, ToolSpec};
