// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Isolate interface (§6): the external mechanism that spawns and supervises
//! a worker OS process. The engine core only ever talks to this trait; how a
//! worker is actually chrooted, cgrouped, or containerized is not its concern.

pub mod process;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

pub use process::ProcessIsolate;

/// Everything needed to start one worker process.
///
/// The engine's spawning state (§4.3) is responsible for building `args` as
/// `--uuid`, `--app`, `--endpoint`, `--locator`, `--protocol` before handing
/// this to [`Isolate::spawn`]; the isolate itself does not interpret them.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Errors an isolate can report. Maps to the `spawn_failed(os_error)` and
/// `locator_unavailable` worker lifecycle errors in §7.
#[derive(Debug, Error)]
pub enum IsolateError {
    #[error("failed to start process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to terminate process: {0}")]
    Terminate(#[source] std::io::Error),
}

/// Spawns worker processes. One implementation per isolation mechanism
/// (bare process, cgroup, container); the core consumes only this trait.
#[async_trait]
pub trait Isolate: Send + Sync + 'static {
    /// The handle type this isolate produces.
    type Handle: IsolateHandle;

    /// Start a worker process. Resolves once the OS process has been
    /// started (not once it has handshaken — that is a higher layer, §4.3).
    async fn spawn(&self, request: SpawnRequest) -> Result<Self::Handle, IsolateError>;
}

/// A running (or exited) worker process, owned exclusively by the
/// supervisor task that spawned it.
#[async_trait]
pub trait IsolateHandle: Send + Sync + 'static {
    /// Takes ownership of the worker's stdout stream for the Output Fetcher
    /// (§4.8). Returns `None` if already taken or if stdout was not
    /// captured; called at most once per handle.
    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;

    /// Send SIGTERM, wait up to `kill_timeout`, then SIGKILL if the process
    /// has not exited; collects the child non-blockingly either way so no
    /// zombies are left behind (§5).
    async fn terminate(&mut self, kill_timeout: Duration) -> Result<(), IsolateError>;
}
