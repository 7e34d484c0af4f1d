//! Cookie persistence
//!
//! A single JSON file holding the browser's native cookie records. Loaded
//! once at worker startup if present; overwritten atomically on save.

use std::path::Path;

use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use tracing::info;

use crate::core::{AgentError, Result};

/// Load cookies from `path` into the page's browser context, if the file exists.
pub async fn load(page: &Page, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AgentError::cookie(format!("failed to read cookie file: {e}")))?;

    let cookies: Vec<CookieParam> = serde_json::from_str(&content)
        .map_err(|e| AgentError::cookie(format!("failed to parse cookie file: {e}")))?;

    if !cookies.is_empty() {
        page.set_cookies(cookies)
            .await
            .map_err(|e| AgentError::cookie(format!("failed to apply cookies: {e}")))?;
    }

    info!(path = %path.display(), "loaded cookies");
    Ok(())
}

/// Serialize the page's current cookies to `path` as pretty-printed UTF-8,
/// writing to a temp file first and renaming into place.
pub async fn save(page: &Page, path: &Path) -> Result<()> {
    let cookies = page
        .get_cookies()
        .await
        .map_err(|e| AgentError::cookie(format!("failed to read cookies: {e}")))?;

    let content = serde_json::to_string_pretty(&cookies)
        .map_err(|e| AgentError::cookie(format!("failed to serialize cookies: {e}")))?;

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, content)
        .await
        .map_err(|e| AgentError::cookie(format!("failed to write cookie file: {e}")))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AgentError::cookie(format!("failed to finalize cookie file: {e}")))?;

    info!(path = %path.display(), count = cookies.len(), "saved cookies");
    Ok(())
}
