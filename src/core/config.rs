//! Configuration management for ariapilot
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/ariapilot/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{AgentError, Result};

/// Main configuration for ariapilot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hosted LLM configuration
    pub llm: LlmConfig,
    /// Browser configuration
    pub browser: BrowserConfig,
    /// Agent behavior configuration
    pub agent: AgentConfig,
}

/// Hosted LLM (Bedrock Converse) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Bedrock model ID, e.g. "anthropic.claude-3-5-sonnet-20240620-v1:0"
    pub model_id: String,
    /// AWS region to call Bedrock in
    pub region: String,
}

/// Browser automation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Whether to run Chromium headless
    pub headless: bool,
    /// Path to the cookie persistence file
    pub cookie_path: PathBuf,
    /// URL the worker navigates to at startup
    pub default_url: String,
    /// Per-action timeout (click, input) in milliseconds
    pub action_timeout_ms: u64,
    /// Navigation timeout in milliseconds
    pub nav_timeout_ms: u64,
    /// `Accept-Language`/UI locale the context presents to pages
    pub locale: String,
    /// Fixed user-agent string the context presents to pages
    pub user_agent: String,
    /// Viewport width, detected screen size by default
    pub viewport_width: u32,
    /// Viewport height, detected screen size by default
    pub viewport_height: u32,
    /// Whether TLS certificate errors are ignored (self-signed/staging hosts)
    pub ignore_https_errors: bool,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum reasoning loop turns before stopping
    pub max_turns: usize,
    /// Whether to emit verbose debug logging
    pub debug: bool,
    /// Override for the default system prompt, if set
    pub system_prompt_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            browser: BrowserConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_id: env::var("ARIAPILOT_MODEL_ID")
                .unwrap_or_else(|_| "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: env::var("ARIAPILOT_HEADLESS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            cookie_path: env::var("ARIAPILOT_COOKIE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("browser_cookies.json")),
            default_url: env::var("ARIAPILOT_DEFAULT_URL")
                .unwrap_or_else(|_| "about:blank".to_string()),
            action_timeout_ms: 5_000,
            nav_timeout_ms: 5_000,
            locale: env::var("ARIAPILOT_LOCALE").unwrap_or_else(|_| "ja-JP".to_string()),
            user_agent: env::var("ARIAPILOT_USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/124.0.0.0 Safari/537.36"
                    .to_string()
            }),
            viewport_width: env::var("ARIAPILOT_VIEWPORT_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1920),
            viewport_height: env::var("ARIAPILOT_VIEWPORT_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1080),
            ignore_https_errors: env::var("ARIAPILOT_IGNORE_HTTPS_ERRORS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            debug: env::var("ARIAPILOT_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            system_prompt_override: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ariapilot")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: runtime overrides (applied by the caller) > env vars > config file > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(AgentError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| AgentError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| AgentError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| AgentError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AgentError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| AgentError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path it was written to
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Check if a config file exists
    pub fn config_exists() -> bool {
        Self::config_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.max_turns, 20);
        assert!(config.browser.headless);
        assert_eq!(config.browser.cookie_path, PathBuf::from("browser_cookies.json"));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model_id, config.llm.model_id);
        assert_eq!(parsed.agent.max_turns, config.agent.max_turns);
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("ariapilot"));
    }
}
