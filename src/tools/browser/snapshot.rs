//! ARIA snapshot builder
//!
//! Runs as an injected script in the page context. Enumerates candidate
//! elements, derives role/name, filters by visibility and operability, and
//! assigns a fresh `data-ref-id` to every surviving element.

use chromiumoxide::Page;
use serde::Deserialize;
use tracing::warn;

use crate::core::{AgentError, ElementRef, Result, Snapshot};

const SNAPSHOT_SCRIPT: &str = r#"
(() => {
  const CANDIDATE_SELECTOR = [
    'button', 'a', 'input', 'select', 'textarea',
    '[role="button"]', '[role="link"]', '[role="checkbox"]', '[role="radio"]',
    '[role="tab"]', '[role="combobox"]', '[role="textbox"]', '[role="searchbox"]',
  ].join(',');

  function deriveRole(el) {
    const explicit = el.getAttribute('role');
    if (explicit) return explicit;
    const tag = el.tagName.toLowerCase();
    if (tag === 'a') return 'link';
    if (tag === 'button') return 'button';
    if (tag === 'select') return 'combobox';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'input') {
      const type = (el.getAttribute('type') || 'text').toLowerCase();
      if (type === 'search') return 'searchbox';
      if (type === 'button' || type === 'submit') return 'button';
      if (type === 'checkbox') return 'checkbox';
      if (type === 'radio') return 'radio';
      return 'textbox';
    }
    return 'unknown';
  }

  function deriveName(el) {
    const ariaLabel = el.getAttribute('aria-label');
    if (ariaLabel && ariaLabel.trim()) return ariaLabel.trim();

    const labelledBy = el.getAttribute('aria-labelledby');
    if (labelledBy) {
      const target = document.getElementById(labelledBy);
      if (target && target.textContent.trim()) return target.textContent.trim();
    }

    const placeholder = el.getAttribute('placeholder');
    if (placeholder && placeholder.trim()) return placeholder.trim();

    const name = el.getAttribute('name');
    if (name && name.trim()) return name.trim();

    const title = el.getAttribute('title');
    if (title && title.trim()) return title.trim();

    const alt = el.getAttribute('alt');
    if (alt && alt.trim()) return alt.trim();

    if (el.textContent && el.textContent.trim()) return el.textContent.trim();

    if (el.id) {
      const label = document.querySelector(`label[for="${el.id}"]`);
      if (label && label.textContent.trim()) return label.textContent.trim();
    }

    return 'Unnamed Element';
  }

  function isVisible(el) {
    const rect = el.getBoundingClientRect();
    if (rect.width <= 0 || rect.height <= 0) return false;
    const style = window.getComputedStyle(el);
    return style.visibility !== 'hidden' && style.display !== 'none';
  }

  function isOperable(el) {
    return !el.disabled && !el.readOnly;
  }

  const elements = [];
  let errorCount = 0;
  let refCounter = 1;

  for (const el of document.querySelectorAll(CANDIDATE_SELECTOR)) {
    try {
      const role = deriveRole(el);
      if (role === 'unknown') continue;
      if (!isVisible(el)) continue;
      if (!isOperable(el)) continue;

      const refId = refCounter++;
      el.setAttribute('data-ref-id', `ref-${refId}`);
      elements.push({ ref_id: refId, role, name: deriveName(el) });
    } catch (e) {
      errorCount++;
    }
  }

  return { elements, errorCount };
})()
"#;

#[derive(Debug, Deserialize)]
struct RawSnapshotResult {
    elements: Vec<ElementRef>,
    #[serde(rename = "errorCount")]
    error_count: u32,
}

/// Capture the current page's ARIA snapshot, filtered to the roles the LLM is
/// allowed to act on.
///
/// Waits (soft, non-fatal) for `domcontentloaded` before evaluating the
/// traversal script, since a snapshot taken mid-navigation is unreliable.
pub async fn capture(page: &Page) -> Result<Snapshot> {
    if let Err(e) = page.wait_for_navigation().await {
        warn!(error = %e, "domcontentloaded wait before snapshot timed out, proceeding anyway");
    }

    let raw: RawSnapshotResult = page
        .evaluate(SNAPSHOT_SCRIPT)
        .await
        .map_err(|e| AgentError::browser(format!("snapshot evaluate failed: {e}")))?
        .into_value()
        .map_err(|e| AgentError::browser(format!("snapshot result was not valid JSON: {e}")))?;

    if raw.error_count > 0 {
        warn!(
            error_count = raw.error_count,
            url = page.url().await.ok().flatten().unwrap_or_default(),
            "snapshot traversal skipped some elements"
        );
    }

    Ok(Snapshot { elements: raw.elements }.filter_allowed_roles())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_script_assigns_ref_attribute_pattern() {
        assert!(SNAPSHOT_SCRIPT.contains("data-ref-id"));
        assert!(SNAPSHOT_SCRIPT.contains("ref-"));
    }
}
