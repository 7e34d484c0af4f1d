//! Dual conversation history
//!
//! The orchestrator maintains two parallel message lists: the API history
//! sent to the LLM (whose first user turn embeds the page snapshot inline)
//! and the display history shown to a human caller (whose first user turn
//! holds only the raw question). Both are mutated in lock-step everywhere
//! except that first seed message.

use crate::core::{ContentBlock, Message, Snapshot};

const SNAPSHOT_JSON_CHAR_LIMIT: usize = 100_000;
const TRUNCATION_MARKER: &str = "\n… (truncated)";

/// Parallel API / display message histories for a single query.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    api_history: Vec<Message>,
    display_history: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed both histories from the user's raw instruction and the initial
    /// page snapshot. Only the API history's first message carries the
    /// snapshot; the display history keeps the raw question alone.
    pub fn seed(&mut self, user_input: &str, snapshot: &Snapshot) {
        let seed_text = build_seed_text(user_input, snapshot);
        self.api_history.push(Message::user_text(seed_text));
        self.display_history.push(Message::user_text(user_input));
    }

    /// Append an assistant turn to both histories identically.
    pub fn push_assistant(&mut self, content: Vec<ContentBlock>) {
        self.api_history.push(Message::assistant(content.clone()));
        self.display_history.push(Message::assistant(content));
    }

    /// Append a user turn (tool results) to both histories identically.
    pub fn push_tool_results(&mut self, content: Vec<ContentBlock>) {
        self.api_history.push(Message::user(content.clone()));
        self.display_history.push(Message::user(content));
    }

    pub fn api_history(&self) -> &[Message] {
        &self.api_history
    }

    pub fn display_history(&self) -> Vec<Message> {
        self.display_history.clone()
    }

    pub fn into_display_history(self) -> Vec<Message> {
        self.display_history
    }
}

fn build_seed_text(user_input: &str, snapshot: &Snapshot) -> String {
    let snapshot_json = serde_json::to_string_pretty(snapshot).unwrap_or_else(|_| "{}".to_string());

    let truncated = if snapshot_json.len() > SNAPSHOT_JSON_CHAR_LIMIT {
        let boundary = snapshot_json
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= SNAPSHOT_JSON_CHAR_LIMIT)
            .last()
            .unwrap_or(0);
        let mut cut = snapshot_json;
        cut.truncate(boundary);
        cut.push_str(TRUNCATION_MARKER);
        cut
    } else {
        snapshot_json
    };

    format!(
        "{user_input}\n\nCurrent page state (ARIA snapshot):\n{truncated}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ElementRef;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            elements: vec![ElementRef {
                ref_id: 1,
                role: "button".into(),
                name: "Submit".into(),
            }],
        }
    }

    #[test]
    fn seed_keeps_display_history_clean() {
        let mut conv = Conversation::new();
        conv.seed("search for cats", &sample_snapshot());

        let display = conv.display_history();
        assert_eq!(display.len(), 1);
        assert_eq!(display[0].text().unwrap(), "search for cats");

        assert_eq!(conv.api_history().len(), 1);
        let api_text = conv.api_history()[0].text().unwrap();
        assert!(api_text.contains("search for cats"));
        assert!(api_text.contains("Submit"));
    }

    #[test]
    fn seed_truncates_oversized_snapshot() {
        let huge = Snapshot {
            elements: (0..20_000)
                .map(|i| ElementRef {
                    ref_id: i,
                    role: "button".into(),
                    name: format!("button number {i} with a moderately long label"),
                })
                .collect(),
        };

        let mut conv = Conversation::new();
        conv.seed("do something", &huge);

        let api_text = conv.api_history()[0].text().unwrap();
        assert!(api_text.contains(TRUNCATION_MARKER.trim()));
    }

    #[test]
    fn seed_truncates_oversized_snapshot_with_multibyte_names() {
        // Japanese labels ensure the byte offset at SNAPSHOT_JSON_CHAR_LIMIT
        // can land mid-character; this must truncate cleanly, not panic.
        let huge = Snapshot {
            elements: (0..20_000)
                .map(|i| ElementRef {
                    ref_id: i,
                    role: "button".into(),
                    name: format!("ボタン番号{i}です"),
                })
                .collect(),
        };

        let mut conv = Conversation::new();
        conv.seed("何かする", &huge);

        let api_text = conv.api_history()[0].text().unwrap();
        assert!(api_text.contains(TRUNCATION_MARKER.trim()));
    }

    #[test]
    fn histories_stay_in_lockstep_after_seed() {
        let mut conv = Conversation::new();
        conv.seed("hi", &sample_snapshot());
        conv.push_assistant(vec![ContentBlock::Text { text: "ok".into() }]);

        assert_eq!(conv.api_history().len(), conv.display_history().len());
    }
}
