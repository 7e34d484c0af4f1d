//! Browser worker
//!
//! A single long-lived task owns the one Chromium browser and page in this
//! process. Every other component reaches the browser only through
//! [`WorkerHandle::send`]; the worker itself processes commands one at a
//! time from an unbounded channel, giving callers FIFO ordering without any
//! explicit locking.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::core::{AgentError, BrowserConfig as AriapilotBrowserConfig, Result, Snapshot};
use crate::tools::browser::{cookies, interactor, snapshot};

/// A command posted to the worker's inbox.
#[derive(Debug)]
pub enum WorkerCommand {
    Goto { url: String },
    GetAriaSnapshot,
    ClickElement { ref_id: u32 },
    InputText { ref_id: u32, text: String },
    GetCurrentUrl,
    SaveCookies,
    Quit,
}

/// The worker's reply to a command.
#[derive(Debug, Clone)]
pub struct WorkerResponse {
    pub status: WorkerStatus,
    pub message: String,
    pub url: Option<String>,
    pub aria_snapshot: Option<Snapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Success,
    Error,
}

impl WorkerResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: WorkerStatus::Success,
            message: message.into(),
            url: None,
            aria_snapshot: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            status: WorkerStatus::Error,
            message: message.into(),
            url: None,
            aria_snapshot: None,
        }
    }

    fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.aria_snapshot = Some(snapshot);
        self
    }

    fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }
}

type Envelope = (WorkerCommand, oneshot::Sender<WorkerResponse>);

/// A cheaply cloneable handle to the running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl WorkerHandle {
    /// Wrap an existing command channel. Used by the real [`spawn`] and by
    /// the in-memory [`super::fake`] worker used in tests.
    pub(crate) fn from_sender(tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { tx }
    }

    /// Post a command and await its paired response.
    pub async fn send(&self, command: WorkerCommand) -> Result<WorkerResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((command, reply_tx))
            .map_err(|_| AgentError::browser("worker task is no longer running"))?;
        reply_rx
            .await
            .map_err(|_| AgentError::browser("worker dropped the reply channel"))
    }
}

/// Launch the browser and spawn the worker task, returning a handle to it.
///
/// Loads cookies from `config.cookie_path` if the file exists, then
/// navigates to `config.default_url`.
pub async fn spawn(config: AriapilotBrowserConfig) -> Result<WorkerHandle> {
    let mut launch_args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--lang={}", config.locale),
    ];
    if config.ignore_https_errors {
        launch_args.push("--ignore-certificate-errors".to_string());
    }

    let mut builder = BrowserConfig::builder()
        .viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        })
        .args(launch_args);
    if !config.headless {
        builder = builder.with_head();
    }
    let browser_config = builder
        .build()
        .map_err(|e| AgentError::browser(format!("invalid browser config: {e}")))?;

    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| AgentError::browser(format!("failed to launch chromium: {e}")))?;

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!(error = %e, "chromium CDP handler event error");
            }
        }
    });

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| AgentError::browser(format!("failed to open page: {e}")))?;

    let ua_override = SetUserAgentOverrideParams::builder()
        .user_agent(config.user_agent.clone())
        .accept_language(config.locale.clone())
        .build()
        .map_err(|e| AgentError::browser(format!("invalid user-agent override: {e}")))?;
    page.execute(ua_override)
        .await
        .map_err(|e| AgentError::browser(format!("failed to set user agent/locale: {e}")))?;

    if let Err(e) = cookies::load(&page, &config.cookie_path).await {
        warn!(error = %e, "failed to load cookies, continuing without them");
    }

    if let Err(e) = timeout(
        Duration::from_millis(config.nav_timeout_ms),
        page.goto(&config.default_url),
    )
    .await
    {
        warn!(error = %e, url = %config.default_url, "initial navigation timed out");
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = WorkerHandle::from_sender(tx);

    tokio::spawn(run_loop(browser, page, rx, config));

    Ok(handle)
}

async fn run_loop(
    mut browser: Browser,
    page: Page,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    config: AriapilotBrowserConfig,
) {
    info!("browser worker started");

    while let Some((command, reply)) = rx.recv().await {
        let is_quit = matches!(command, WorkerCommand::Quit);
        let response = handle_command(&page, command, &config).await;
        let _ = reply.send(response);
        if is_quit {
            break;
        }
    }

    if let Err(e) = browser.close().await {
        error!(error = %e, "failed to close browser cleanly");
    }
    info!("browser worker stopped");
}

async fn handle_command(
    page: &Page,
    command: WorkerCommand,
    config: &AriapilotBrowserConfig,
) -> WorkerResponse {
    match command {
        WorkerCommand::Goto { url } => {
            debug!(%url, "goto");
            match timeout(Duration::from_millis(config.nav_timeout_ms), page.goto(&url)).await {
                Ok(Ok(_)) => match snapshot::capture(page).await {
                    Ok(snap) => WorkerResponse::ok(format!("navigated to {url}")).with_snapshot(snap),
                    Err(e) => WorkerResponse::err(format!("navigated but snapshot failed: {e}")),
                },
                Ok(Err(e)) => WorkerResponse::err(format!("navigation failed: {e}")),
                Err(_) => WorkerResponse::err(format!("navigation to {url} timed out")),
            }
        }
        WorkerCommand::GetAriaSnapshot => match snapshot::capture(page).await {
            Ok(snap) => WorkerResponse::ok("snapshot captured").with_snapshot(snap),
            Err(e) => WorkerResponse::err(format!("snapshot failed: {e}")),
        },
        WorkerCommand::ClickElement { ref_id } => {
            match interactor::click(page, ref_id, config.action_timeout_ms).await {
                Ok(()) => match snapshot::capture(page).await {
                    Ok(snap) => {
                        WorkerResponse::ok(format!("clicked ref_id {ref_id}")).with_snapshot(snap)
                    }
                    Err(e) => WorkerResponse::err(format!("clicked but snapshot failed: {e}")),
                },
                Err(e) => {
                    let snap = snapshot::capture(page).await.ok();
                    let mut resp = WorkerResponse::err(e.to_string());
                    if let Some(snap) = snap {
                        resp = resp.with_snapshot(snap);
                    }
                    resp
                }
            }
        }
        WorkerCommand::InputText { ref_id, text } => {
            match interactor::input_text(page, ref_id, &text, config.action_timeout_ms).await {
                Ok(()) => match snapshot::capture(page).await {
                    Ok(snap) => {
                        WorkerResponse::ok(format!("input into ref_id {ref_id}")).with_snapshot(snap)
                    }
                    Err(e) => WorkerResponse::err(format!("input succeeded but snapshot failed: {e}")),
                },
                Err(e) => {
                    let snap = snapshot::capture(page).await.ok();
                    let mut resp = WorkerResponse::err(e.to_string());
                    if let Some(snap) = snap {
                        resp = resp.with_snapshot(snap);
                    }
                    resp
                }
            }
        }
        WorkerCommand::GetCurrentUrl => match page.url().await {
            Ok(Some(url)) => WorkerResponse::ok("current url").with_url(url),
            Ok(None) => WorkerResponse::err("page has no current url"),
            Err(e) => WorkerResponse::err(format!("failed to read url: {e}")),
        },
        WorkerCommand::SaveCookies => match cookies::save(page, &config.cookie_path).await {
            Ok(()) => WorkerResponse::ok("cookies saved"),
            Err(e) => WorkerResponse::err(e.to_string()),
        },
        WorkerCommand::Quit => WorkerResponse::ok("quitting"),
    }
}
