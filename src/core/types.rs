//! Shared data model used across ariapilot modules
//!
//! Mirrors the wire shapes exchanged with the hosted LLM and the browser worker.

use serde::{Deserialize, Serialize};

/// Roles an element must have to be surfaced to the LLM and accepted by the
/// interaction engine.
pub const ALLOWED_ROLES: &[&str] = &["button", "link", "textbox", "searchbox", "combobox"];

/// A single interactable element surfaced in a [`Snapshot`].
///
/// `ref_id` is only valid within the snapshot it was produced in; a fresh
/// snapshot reassigns every ref_id from 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElementRef {
    pub ref_id: u32,
    pub role: String,
    pub name: String,
}

impl ElementRef {
    /// The CSS selector used to resolve this element back in the DOM.
    pub fn selector(&self) -> String {
        format!("[data-ref-id='ref-{}']", self.ref_id)
    }
}

/// An ordered inventory of interactable elements on the current page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    pub elements: Vec<ElementRef>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self { elements: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Restrict the snapshot to the roles the LLM is allowed to act on.
    pub fn filter_allowed_roles(mut self) -> Self {
        self.elements
            .retain(|e| ALLOWED_ROLES.contains(&e.role.as_str()));
        self
    }
}

/// Content block carried by a [`Message`], mirroring the Bedrock Converse
/// content-block union.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        #[serde(rename = "tool_use_id")]
        id: String,
        content: String,
        status: ToolResultStatus,
    },
}

/// Outcome of a single tool invocation, carried on [`ContentBlock::ToolResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResultStatus {
    Success,
    Error,
}

/// A message in either the API history or the display history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
        }
    }

    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::User,
            content,
        }
    }

    /// Tool-use blocks contained in this message, in order.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
                _ => None,
            })
            .collect()
    }

    /// Plain-text concatenation of every `Text` block, if any.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

/// Payload carried inside a [`ContentBlock::ToolResult`]'s `content` string,
/// serialized as pretty JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultPayload {
    pub status: ToolResultStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_snapshot: Option<Snapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_snapshot_message: Option<String>,
}

impl ToolResultPayload {
    pub fn success(message: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            status: ToolResultStatus::Success,
            message: message.into(),
            aria_snapshot: Some(snapshot),
            aria_snapshot_message: None,
        }
    }

    pub fn error(message: impl Into<String>, snapshot: Option<Snapshot>) -> Self {
        Self {
            status: ToolResultStatus::Error,
            message: message.into(),
            aria_snapshot: snapshot,
            aria_snapshot_message: None,
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Cumulative token usage across all LLM calls in a single query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn add(&mut self, input: u64, output: u64) {
        self.input += input;
        self.output += output;
        self.total = self.input + self.output;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_selector_format() {
        let e = ElementRef {
            ref_id: 7,
            role: "button".to_string(),
            name: "Submit".to_string(),
        };
        assert_eq!(e.selector(), "[data-ref-id='ref-7']");
    }

    #[test]
    fn filter_allowed_roles_drops_unknown() {
        let snap = Snapshot {
            elements: vec![
                ElementRef { ref_id: 1, role: "button".into(), name: "A".into() },
                ElementRef { ref_id: 2, role: "heading".into(), name: "B".into() },
            ],
        };
        let filtered = snap.filter_allowed_roles();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.elements[0].role, "button");
    }

    #[test]
    fn token_usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(10, 5);
        usage.add(3, 2);
        assert_eq!(usage.input, 13);
        assert_eq!(usage.output, 7);
        assert_eq!(usage.total, 20);
    }

    #[test]
    fn message_tool_uses_extracts_in_order() {
        let msg = Message::assistant(vec![
            ContentBlock::Text { text: "thinking".into() },
            ContentBlock::ToolUse {
                id: "t1".into(),
                name: "click_element".into(),
                input: serde_json::json!({"ref_id": 1}),
            },
        ]);
        let uses = msg.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].1, "click_element");
    }
}
