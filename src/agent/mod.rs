//! Agent module - orchestration and conversation management

pub mod conversation;
pub mod orchestrator;

pub use conversation::Conversation;
pub use orchestrator::{handle_user_query, Agent, QueryOutcome, QueryStatus};
