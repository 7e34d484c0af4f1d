//! Bedrock Converse API client
//!
//! Speaks the hosted LLM's native "converse" request/response shape directly,
//! translating to and from the crate's internal [`Message`] model.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::types as bt;
use aws_smithy_types::Document;
use tracing::warn;

use crate::core::{
    AgentError, ContentBlock, Message, MessageRole, Result, TokenUsage, ToolResultStatus,
};
use crate::llm::traits::{ConverseRequest, ConverseResponse, InferenceConfig, LlmClient, StopReason};

/// Client backed by a real AWS Bedrock Runtime SDK client.
pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockClient {
    /// Build a client from the ambient AWS config (environment, profile, IMDS, ...).
    pub async fn new(region: impl Into<String>) -> Self {
        let region = aws_config::Region::new(region.into());
        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        Self {
            client: aws_sdk_bedrockruntime::Client::new(&shared_config),
        }
    }

    /// Select inference parameters by substring-matching the model family,
    /// mirroring the defaults each vendor publishes for its Converse integration.
    pub fn inference_config_for(model_id: &str) -> InferenceConfig {
        if model_id.contains("amazon.nova") {
            InferenceConfig {
                max_tokens: 3000,
                temperature: Some(1.0),
                top_p: Some(1.0),
            }
        } else if model_id.contains("anthropic.claude") {
            InferenceConfig {
                max_tokens: 3000,
                temperature: Some(0.0),
                top_p: None,
            }
        } else {
            InferenceConfig {
                max_tokens: 3000,
                temperature: None,
                top_p: None,
            }
        }
    }
}

#[async_trait]
impl LlmClient for BedrockClient {
    async fn converse(&self, request: ConverseRequest) -> Result<ConverseResponse> {
        let messages = request
            .messages
            .iter()
            .map(to_sdk_message)
            .collect::<Result<Vec<_>>>()?;

        let tools = request
            .tools
            .iter()
            .map(|t| {
                let schema = Document::from(json_to_document(&t.input_schema));
                bt::Tool::ToolSpec(
                    bt::ToolSpecification::builder()
                        .name(&t.name)
                        .description(&t.description)
                        .input_schema(bt::ToolInputSchema::Json(schema))
                        .build()
                        .expect("tool spec fields are all set above"),
                )
            })
            .collect::<Vec<_>>();

        let tool_config = bt::ToolConfiguration::builder()
            .set_tools(Some(tools))
            .tool_choice(bt::ToolChoice::Auto(bt::AutoToolChoice::builder().build()))
            .build()
            .map_err(|e| AgentError::llm(format!("failed to build tool config: {e}")))?;

        let inference_config = bt::InferenceConfiguration::builder()
            .max_tokens(request.inference_config.max_tokens as i32)
            .set_temperature(request.inference_config.temperature)
            .set_top_p(request.inference_config.top_p)
            .build();

        let response = self
            .client
            .converse()
            .model_id(&request.model_id)
            .set_messages(Some(messages))
            .system(bt::SystemContentBlock::Text(request.system_prompt.clone()))
            .inference_config(inference_config)
            .tool_config(tool_config)
            .send()
            .await
            .map_err(|e| AgentError::llm(format!("Bedrock converse call failed: {e}")))?;

        let usage = response
            .usage()
            .map(|u| {
                let mut tu = TokenUsage::default();
                tu.add(u.input_tokens() as u64, u.output_tokens() as u64);
                tu
            })
            .unwrap_or_default();

        let stop_reason = match response.stop_reason() {
            bt::StopReason::EndTurn => StopReason::EndTurn,
            bt::StopReason::ToolUse => StopReason::ToolUse,
            bt::StopReason::MaxTokens => {
                warn!("model response truncated at max_tokens");
                StopReason::MaxTokens
            }
            _ => StopReason::Other,
        };

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| AgentError::llm("Bedrock response carried no assistant message"))?;

        let message = from_sdk_message(output_message)?;

        if stop_reason == StopReason::ToolUse && message.tool_uses().is_empty() {
            return Err(AgentError::llm(
                "stop_reason was tool_use but the message contained no tool-use blocks",
            ));
        }

        Ok(ConverseResponse {
            message,
            stop_reason,
            usage,
        })
    }
}

fn to_sdk_message(msg: &Message) -> Result<bt::Message> {
    let role = match msg.role {
        MessageRole::User => bt::ConversationRole::User,
        MessageRole::Assistant => bt::ConversationRole::Assistant,
    };

    let blocks = msg
        .content
        .iter()
        .map(|b| match b {
            ContentBlock::Text { text } => Ok(bt::ContentBlock::Text(text.clone())),
            ContentBlock::ToolUse { id, name, input } => {
                let block = bt::ToolUseBlock::builder()
                    .tool_use_id(id)
                    .name(name)
                    .input(Document::from(json_to_document(input)))
                    .build()
                    .map_err(|e| AgentError::llm(format!("bad tool_use block: {e}")))?;
                Ok(bt::ContentBlock::ToolUse(block))
            }
            ContentBlock::ToolResult { id, content, status } => {
                let sdk_status = match status {
                    ToolResultStatus::Success => bt::ToolResultStatus::Success,
                    ToolResultStatus::Error => bt::ToolResultStatus::Error,
                };
                let block = bt::ToolResultBlock::builder()
                    .tool_use_id(id)
                    .content(bt::ToolResultContentBlock::Text(content.clone()))
                    .status(sdk_status)
                    .build()
                    .map_err(|e| AgentError::llm(format!("bad tool_result block: {e}")))?;
                Ok(bt::ContentBlock::ToolResult(block))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    bt::Message::builder()
        .role(role)
        .set_content(Some(blocks))
        .build()
        .map_err(|e| AgentError::llm(format!("bad message: {e}")))
}

fn from_sdk_message(msg: &bt::Message) -> Result<Message> {
    let role = match msg.role() {
        bt::ConversationRole::User => MessageRole::User,
        _ => MessageRole::Assistant,
    };

    let content = msg
        .content()
        .iter()
        .filter_map(|b| match b {
            bt::ContentBlock::Text(text) => Some(ContentBlock::Text { text: text.clone() }),
            bt::ContentBlock::ToolUse(tu) => Some(ContentBlock::ToolUse {
                id: tu.tool_use_id().to_string(),
                name: tu.name().to_string(),
                input: document_to_json(tu.input()),
            }),
            _ => None,
        })
        .collect();

    Ok(Message { role, content })
}

/// Convert a `serde_json::Value` into the smithy `Document` type the SDK uses
/// for open-ended (tool input / tool schema) payloads.
fn json_to_document(value: &serde_json::Value) -> Document {
    match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Document::Number(aws_smithy_types::Number::NegInt(i))
            } else if let Some(f) = n.as_f64() {
                Document::Number(aws_smithy_types::Number::Float(f))
            } else {
                Document::Null
            }
        }
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(arr) => {
            Document::Array(arr.iter().map(json_to_document).collect())
        }
        serde_json::Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect(),
        ),
    }
}

fn document_to_json(doc: &Document) -> serde_json::Value {
    match doc {
        Document::Null => serde_json::Value::Null,
        Document::Bool(b) => serde_json::Value::Bool(*b),
        Document::Number(n) => match n {
            aws_smithy_types::Number::PosInt(i) => serde_json::json!(i),
            aws_smithy_types::Number::NegInt(i) => serde_json::json!(i),
            aws_smithy_types::Number::Float(f) => serde_json::json!(f),
        },
        Document::String(s) => serde_json::Value::String(s.clone()),
        Document::Array(arr) => serde_json::Value::Array(arr.iter().map(document_to_json).collect()),
        Document::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
    }
}
