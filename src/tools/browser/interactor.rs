//! Element interaction engine
//!
//! Resolves a `ref_id` to a DOM node via the `data-ref-id` attribute injected
//! by the snapshot builder, and performs click / fill-and-submit with a
//! viewport-aware recovery ladder for elements scrolled out of view.

use std::time::Duration;

use chromiumoxide::Page;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::core::{AgentError, Result};

const EXISTS_SCRIPT_TEMPLATE: &str = r#"(() => !!document.querySelector("{selector}"))()"#;

const CLICK_SCRIPT_TEMPLATE: &str = r#"
(() => {
  const el = document.querySelector("{selector}");
  if (!el) return { ok: false, reason: 'not_found' };

  const rect = el.getBoundingClientRect();
  const viewportH = window.innerHeight;
  if (rect.bottom < 0 || rect.top > viewportH) {
    return { ok: false, reason: 'outside_viewport', rect };
  }

  try {
    el.click();
    return { ok: true };
  } catch (e) {
    return { ok: false, reason: String(e) };
  }
})()
"#;

const SCROLL_RECOVER_TEMPLATE: &str = r#"
(() => {
  const el = document.querySelector("{selector}");
  if (!el) return { ok: false, reason: 'not_found' };

  const rect = el.getBoundingClientRect();
  const viewportH = window.innerHeight;
  const margin = 20;
  let delta = 0;
  if (rect.top < 0) delta = rect.top - margin;
  else if (rect.bottom > viewportH) delta = (rect.bottom - viewportH) + margin;
  if (delta !== 0) window.scrollBy(0, delta);

  el.scrollIntoView({ block: 'center', inline: 'center' });

  try {
    el.click();
    return { ok: true };
  } catch (e) {
    return { ok: false, reason: String(e) };
  }
})()
"#;

const FORCE_CLICK_TEMPLATE: &str = r#"
(() => {
  const el = document.querySelector("{selector}");
  if (!el) return { ok: false, reason: 'not_found' };
  const evt = new MouseEvent('click', { bubbles: true, cancelable: true, view: window });
  el.dispatchEvent(evt);
  return { ok: true };
})()
"#;

const INPUT_SCRIPT_TEMPLATE: &str = r#"
(() => {
  const el = document.querySelector("{selector}");
  if (!el) return { ok: false, reason: 'not_found' };

  el.value = '';
  el.dispatchEvent(new Event('input', { bubbles: true }));

  el.value = {text};
  el.dispatchEvent(new Event('input', { bubbles: true }));
  el.dispatchEvent(new Event('change', { bubbles: true }));

  el.dispatchEvent(new KeyboardEvent('keydown', { key: 'Enter', bubbles: true }));
  el.dispatchEvent(new KeyboardEvent('keyup', { key: 'Enter', bubbles: true }));

  return { ok: true };
})()
"#;

#[derive(Debug, Deserialize)]
struct AttemptResult {
    ok: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Poll interval while waiting for a ref_id's selector to resolve.
const POLL_INTERVAL_MS: u64 = 100;

fn selector_for(ref_id: u32) -> String {
    format!("ref-{}", ref_id)
}

/// Wait for `selector` to resolve in the DOM, polling every
/// [`POLL_INTERVAL_MS`] until it does or `timeout_ms` elapses. A ref_id from a
/// stale snapshot, or one that was never valid, never resolves, so this is
/// what actually turns that case into a timeout rather than an instant error.
async fn wait_for_element(page: &Page, selector: &str, timeout_ms: u64) -> Result<()> {
    let script = EXISTS_SCRIPT_TEMPLATE.replace("{selector}", selector);

    let poll = async {
        loop {
            let exists: bool = page
                .evaluate(script.as_str())
                .await
                .map_err(|e| AgentError::tool(format!("evaluate failed: {e}")))?
                .into_value()
                .map_err(|e| AgentError::tool(format!("exists check was not valid JSON: {e}")))?;
            if exists {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    };

    match timeout(Duration::from_millis(timeout_ms), poll).await {
        Ok(inner) => inner,
        Err(_) => Err(AgentError::timeout(format!(
            "element matching {selector} did not appear within {timeout_ms}ms"
        ))),
    }
}

/// Click the element identified by `ref_id`, recovering from
/// out-of-viewport failures by scrolling and, as a last resort, forcing the
/// click via a synthetic event.
#[instrument(skip(page))]
pub async fn click(page: &Page, ref_id: u32, action_timeout_ms: u64) -> Result<()> {
    let selector = format!("[data-ref-id='{}']", selector_for(ref_id));

    if let Err(e) = wait_for_element(page, &selector, action_timeout_ms).await {
        return Err(AgentError::timeout(format!(
            "click on ref_id {ref_id} timed out: {e}"
        )));
    }

    let script = CLICK_SCRIPT_TEMPLATE.replace("{selector}", &selector);

    let result = run_with_timeout(page, &script, action_timeout_ms).await?;
    if result.ok {
        return Ok(());
    }

    if result.reason.as_deref() == Some("outside_viewport") {
        debug!(ref_id, "element outside viewport, attempting scroll recovery");
        let recover_script = SCROLL_RECOVER_TEMPLATE.replace("{selector}", &selector);
        let recovered = run_with_timeout(page, &recover_script, action_timeout_ms).await?;
        if recovered.ok {
            return Ok(());
        }

        debug!(ref_id, "scroll recovery failed, forcing click");
        let force_script = FORCE_CLICK_TEMPLATE.replace("{selector}", &selector);
        let forced = run_with_timeout(page, &force_script, action_timeout_ms).await?;
        if forced.ok {
            return Ok(());
        }
        return Err(AgentError::tool(format!(
            "click on ref_id {} failed after recovery: {:?}",
            ref_id, forced.reason
        )));
    }

    Err(AgentError::tool(format!(
        "click on ref_id {} failed: {:?}",
        ref_id, result.reason
    )))
}

/// Clear, fill, and submit (Enter) a text field identified by `ref_id`.
#[instrument(skip(page, text))]
pub async fn input_text(page: &Page, ref_id: u32, text: &str, action_timeout_ms: u64) -> Result<()> {
    let selector = format!("[data-ref-id='{}']", selector_for(ref_id));

    if let Err(e) = wait_for_element(page, &selector, action_timeout_ms).await {
        return Err(AgentError::timeout(format!(
            "input_text on ref_id {ref_id} timed out: {e}"
        )));
    }

    let quoted_text = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
    let script = INPUT_SCRIPT_TEMPLATE
        .replace("{selector}", &selector)
        .replace("{text}", &quoted_text);

    let result = run_with_timeout(page, &script, action_timeout_ms).await?;
    if result.ok {
        Ok(())
    } else {
        Err(AgentError::tool(format!(
            "input_text on ref_id {} failed: {:?}",
            ref_id, result.reason
        )))
    }
}

async fn run_with_timeout(page: &Page, script: &str, timeout_ms: u64) -> Result<AttemptResult> {
    let fut = page.evaluate(script);
    match timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(Ok(value)) => value
            .into_value()
            .map_err(|e| AgentError::tool(format!("interaction result was not valid JSON: {e}"))),
        Ok(Err(e)) => Err(AgentError::tool(format!("evaluate failed: {e}"))),
        Err(_) => Err(AgentError::timeout(format!(
            "interaction timed out after {}ms",
            timeout_ms
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_for_formats_ref_id() {
        assert_eq!(selector_for(42), "ref-42");
    }
}
