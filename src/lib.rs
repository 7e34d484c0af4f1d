//! ariapilot - LLM-driven browser automation agent
//!
//! Drives a real Chromium browser to complete natural-language tasks by
//! alternating between capturing an ARIA accessibility snapshot of the
//! current page, consulting a hosted LLM through the Bedrock Converse API,
//! and executing whatever tool call it asks for.
//!
//! # Architecture
//!
//! - **core**: shared types, configuration, and error handling
//! - **llm**: the Bedrock Converse client behind a swappable `LlmClient` trait
//! - **tools**: the browser worker (owns the one Chromium instance), its
//!   snapshot/interaction logic, and the tool dispatcher
//! - **agent**: the dual-history conversation model and the turn orchestrator
//! - **prompt**: the static system prompt and tool catalog
//!
//! # Usage
//!
//! ```rust,no_run
//! use ariapilot::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load();
//!     let agent = Agent::new(config).await?;
//!     let outcome = agent.run("search for wireless earphones and add one to the cart").await?;
//!     println!("{:?}", outcome.status);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod core;
pub mod llm;
pub mod prompt;
pub mod tools;

pub use agent::{handle_user_query, Agent, QueryOutcome, QueryStatus};
pub use core::{AgentError, Config, Result};
