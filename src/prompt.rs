//! System prompt & tool catalog
//!
//! Static text and schemas handed to the LLM adapter on every turn.

use crate::llm::ToolSpec;

/// Default system prompt instructing the model how to use the ref_id-based
/// tool surface.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a browser automation agent. You are given a task and the current
state of a web page, described as a flat list of interactable elements.

## Rules
- Always consult the most recent snapshot: the one embedded in your first
  user turn, or the one attached to the result of your last tool call.
- Address elements only by their numeric ref_id. Never guess a ref_id that
  is not present in the most recent snapshot.
- Call exactly one tool per turn, or respond with final text to conclude
  the task. Do not call a tool and provide a final answer in the same turn.
- If a tool call returns an error, read the snapshot attached to that error
  and re-plan; do not repeat the same ref_id blindly."#;

/// The two tools this agent exposes to the model.
pub fn tool_catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "click_element".to_string(),
            description: "Click an interactable element identified by its ref_id from the most recent snapshot.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "ref_id": {
                        "type": "integer",
                        "description": "The ref_id of the element to click, from the most recent snapshot"
                    }
                },
                "required": ["ref_id"]
            }),
        },
        ToolSpec {
            name: "input_text".to_string(),
            description: "Clear a text field, type the given text into it, and press Enter.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "ref_id": {
                        "type": "integer",
                        "description": "The ref_id of the text field, from the most recent snapshot"
                    },
                    "text": {
                        "type": "string",
                        "description": "The text to type into the field"
                    }
                },
                "required": ["ref_id", "text"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_catalog_has_both_tools() {
        let tools = tool_catalog();
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().any(|t| t.name == "click_element"));
        assert!(tools.iter().any(|t| t.name == "input_text"));
    }
}
