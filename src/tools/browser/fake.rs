//! An in-memory stand-in for the browser worker
//!
//! Exposed so integration tests can exercise the orchestrator and dispatcher
//! without a real Chromium binary, mirroring the real worker's command/FIFO
//! contract but against a scripted in-memory page instead of a live DOM.
//! Not part of the crate's stable surface; real callers should use
//! [`super::spawn`].

use tokio::sync::mpsc;

use crate::core::{ElementRef, Snapshot};
use crate::tools::browser::worker::{WorkerCommand, WorkerHandle, WorkerResponse, WorkerStatus};

/// A scripted page: a fixed element inventory plus which ref_ids a click or
/// input should succeed against.
#[derive(Clone, Debug, Default)]
pub struct FakePage {
    pub elements: Vec<ElementRef>,
    pub url: String,
}

impl FakePage {
    pub fn new(url: impl Into<String>, elements: Vec<ElementRef>) -> Self {
        Self {
            elements,
            url: url.into(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            elements: self.elements.clone(),
        }
    }

    fn has_ref(&self, ref_id: u32) -> bool {
        self.elements.iter().any(|e| e.ref_id == ref_id)
    }
}

/// Spawn a worker-shaped task backed by `page` instead of a real browser.
/// Every command completes immediately; `ClickElement`/`InputText` succeed
/// only if `ref_id` is present in `page.elements`, matching the real
/// worker's "unresolvable ref_id times out" contract closely enough for
/// orchestrator-level tests.
pub fn spawn_fake(page: FakePage) -> WorkerHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<(WorkerCommand, tokio::sync::oneshot::Sender<WorkerResponse>)>();

    tokio::spawn(async move {
        let mut page = page;
        while let Some((command, reply)) = rx.recv().await {
            let response = match command {
                WorkerCommand::Goto { url } => {
                    page.url = url.clone();
                    WorkerResponse {
                        status: WorkerStatus::Success,
                        message: format!("navigated to {url}"),
                        url: None,
                        aria_snapshot: Some(page.snapshot()),
                    }
                }
                WorkerCommand::GetAriaSnapshot => WorkerResponse {
                    status: WorkerStatus::Success,
                    message: "snapshot captured".to_string(),
                    url: None,
                    aria_snapshot: Some(page.snapshot()),
                },
                WorkerCommand::ClickElement { ref_id } => {
                    if page.has_ref(ref_id) {
                        WorkerResponse {
                            status: WorkerStatus::Success,
                            message: format!("clicked ref_id {ref_id}"),
                            url: None,
                            aria_snapshot: Some(page.snapshot()),
                        }
                    } else {
                        WorkerResponse {
                            status: WorkerStatus::Error,
                            message: format!("click on ref_id {ref_id} timed out"),
                            url: None,
                            aria_snapshot: Some(page.snapshot()),
                        }
                    }
                }
                WorkerCommand::InputText { ref_id, text } => {
                    if page.has_ref(ref_id) {
                        WorkerResponse {
                            status: WorkerStatus::Success,
                            message: format!("input '{text}' into ref_id {ref_id}"),
                            url: None,
                            aria_snapshot: Some(page.snapshot()),
                        }
                    } else {
                        WorkerResponse {
                            status: WorkerStatus::Error,
                            message: format!("input on ref_id {ref_id} timed out"),
                            url: None,
                            aria_snapshot: Some(page.snapshot()),
                        }
                    }
                }
                WorkerCommand::GetCurrentUrl => WorkerResponse {
                    status: WorkerStatus::Success,
                    message: "current url".to_string(),
                    url: Some(page.url.clone()),
                    aria_snapshot: None,
                },
                WorkerCommand::SaveCookies => WorkerResponse {
                    status: WorkerStatus::Success,
                    message: "cookies saved".to_string(),
                    url: None,
                    aria_snapshot: None,
                },
                WorkerCommand::Quit => {
                    let _ = reply.send(WorkerResponse {
                        status: WorkerStatus::Success,
                        message: "quitting".to_string(),
                        url: None,
                        aria_snapshot: None,
                    });
                    break;
                }
            };
            let _ = reply.send(response);
        }
    });

    WorkerHandle::from_sender(tx)
}
