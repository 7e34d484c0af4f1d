//! Browser automation module
//!
//! Owns a single Chromium instance in-process via `chromiumoxide`. The
//! [`worker`] submodule is the only place the live page is touched; snapshot
//! and interaction logic run as injected scripts evaluated against it.

mod cookies;
pub mod fake;
mod interactor;
mod snapshot;
pub mod worker;

pub use worker::{spawn, WorkerCommand, WorkerHandle, WorkerResponse, WorkerStatus};
