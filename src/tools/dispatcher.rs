//! Tool dispatcher
//!
//! Stateless translation from a named tool call to a worker command.
//! Validates required parameters before ever touching the browser.

use crate::core::{Snapshot, ToolResultPayload};
use crate::tools::browser::{WorkerCommand, WorkerHandle, WorkerStatus};

/// Dispatch a single tool call by name, returning the resulting payload.
///
/// Unknown tool names and missing required parameters are reported as
/// synthetic error payloads without enqueuing any worker command.
pub async fn dispatch(worker: &WorkerHandle, name: &str, params: &serde_json::Value) -> ToolResultPayload {
    match name {
        "click_element" => dispatch_click(worker, params).await,
        "input_text" => dispatch_input_text(worker, params).await,
        other => ToolResultPayload::error(format!("unknown tool: {other}"), None),
    }
}

async fn dispatch_click(worker: &WorkerHandle, params: &serde_json::Value) -> ToolResultPayload {
    let ref_id = match params.get("ref_id").and_then(|v| v.as_u64()) {
        Some(r) => r as u32,
        None => return ToolResultPayload::error("missing required parameter: ref_id", None),
    };

    match worker.send(WorkerCommand::ClickElement { ref_id }).await {
        Ok(resp) => payload_from_response(resp),
        Err(e) => ToolResultPayload::error(e.to_string(), None),
    }
}

async fn dispatch_input_text(worker: &WorkerHandle, params: &serde_json::Value) -> ToolResultPayload {
    let ref_id = match params.get("ref_id").and_then(|v| v.as_u64()) {
        Some(r) => r as u32,
        None => return ToolResultPayload::error("missing required parameter: ref_id", None),
    };
    let text = match params.get("text").and_then(|v| v.as_str()) {
        Some(t) => t.to_string(),
        None => return ToolResultPayload::error("missing required parameter: text", None),
    };

    match worker.send(WorkerCommand::InputText { ref_id, text }).await {
        Ok(resp) => payload_from_response(resp),
        Err(e) => ToolResultPayload::error(e.to_string(), None),
    }
}

fn payload_from_response(resp: crate::tools::browser::WorkerResponse) -> ToolResultPayload {
    let snapshot: Option<Snapshot> = resp.aria_snapshot;
    match resp.status {
        WorkerStatus::Success => {
            ToolResultPayload::success(resp.message, snapshot.unwrap_or_default())
        }
        WorkerStatus::Error => ToolResultPayload::error(resp.message, snapshot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn click_without_ref_id_does_not_reach_worker() {
        // No worker handle is constructible without a live browser in this
        // test, so we exercise only the parameter-validation short circuit.
        let params = serde_json::json!({});
        // Directly test the error path logic used by dispatch_click by
        // checking the same extraction the real dispatcher performs.
        assert!(params.get("ref_id").and_then(|v| v.as_u64()).is_none());
    }

    #[test]
    fn payload_from_error_response_carries_snapshot() {
        use crate::tools::browser::WorkerResponse;
        let resp = WorkerResponse {
            status: WorkerStatus::Error,
            message: "timeout".to_string(),
            url: None,
            aria_snapshot: Some(Snapshot::empty()),
        };
        let payload = payload_from_response(resp);
        assert!(payload.aria_snapshot.is_some());
    }
}
