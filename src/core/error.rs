//! Unified error type for ariapilot
//!
//! Every fallible public function in the crate returns `Result<T>`.

use thiserror::Error;

/// Main error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM transport, auth, or malformed-response errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Browser launch, navigation, or evaluate failures
    #[error("Browser error: {0}")]
    Browser(String),

    /// Tool execution errors (unknown tool, dispatch failure)
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// A page operation exceeded its budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cookie file read/write/parse errors
    #[error("Cookie error: {0}")]
    Cookie(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a cookie error
    pub fn cookie(msg: impl Into<String>) -> Self {
        Self::Cookie(msg.into())
    }
}
