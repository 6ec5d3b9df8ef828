// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `Isolate` for worker-lifecycle tests (§8.1), mirroring the
//! teacher's `FakeAgentAdapter` pattern: scriptable outcomes, no real
//! process ever spawned.

use super::{Isolate, IsolateError, IsolateHandle, SpawnRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;

/// What a scripted call to [`FakeIsolate::spawn`] should do.
#[derive(Debug, Clone)]
pub enum FakeIsolateScript {
    /// Spawn succeeds immediately and produces a controllable handle.
    Succeed,
    /// Spawn never resolves, to drive spawn-timeout tests (S2).
    Hang,
    /// Spawn fails with the given message, as `IsolateError::Spawn`.
    Fail(String),
}

/// The engine-facing side of a faked worker process. Cloneable; every clone
/// observes the same underlying process state.
#[derive(Clone)]
pub struct FakeHandleController {
    stdout_writer: Arc<tokio::sync::Mutex<tokio::io::DuplexStream>>,
    terminated: Arc<AtomicBool>,
    terminate_calls: Arc<AtomicU32>,
}

impl FakeHandleController {
    /// Writes one line (newline appended) onto the handle's stdout stream,
    /// as if the worker process had printed it.
    pub async fn push_stdout_line(&self, line: &str) {
        use tokio::io::AsyncWriteExt;
        let mut w = self.stdout_writer.lock().await;
        let _ = w.write_all(line.as_bytes()).await;
        let _ = w.write_all(b"\n").await;
    }

    /// Writes raw bytes (no newline appended) onto stdout.
    pub async fn push_stdout_bytes(&self, bytes: &[u8]) {
        use tokio::io::AsyncWriteExt;
        let mut w = self.stdout_writer.lock().await;
        let _ = w.write_all(bytes).await;
    }

    pub fn was_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn terminate_call_count(&self) -> u32 {
        self.terminate_calls.load(Ordering::SeqCst)
    }
}

/// A faked worker process. Implements [`IsolateHandle`]; its counterpart
/// [`FakeHandleController`] is retained by [`FakeIsolate`] for test code to
/// drive independently of the engine that owns this handle.
pub struct FakeHandle {
    stdout_reader: Option<Box<dyn AsyncRead + Unpin + Send>>,
    terminated: Arc<AtomicBool>,
    terminate_calls: Arc<AtomicU32>,
}

#[async_trait]
impl IsolateHandle for FakeHandle {
    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout_reader.take()
    }

    async fn terminate(&mut self, _kill_timeout: Duration) -> Result<(), IsolateError> {
        self.terminated.store(true, Ordering::SeqCst);
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scriptable [`Isolate`] that never touches the OS. Every spawn is
/// recorded; a queue of [`FakeIsolateScript`] values drives successive
/// calls, falling back to a default script once the queue is drained.
pub struct FakeIsolate {
    scripts: Mutex<VecDeque<FakeIsolateScript>>,
    default: FakeIsolateScript,
    spawned: Mutex<Vec<SpawnRequest>>,
    handles: Mutex<Vec<FakeHandleController>>,
}

impl FakeIsolate {
    pub fn new(default: FakeIsolateScript) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            default,
            spawned: Mutex::new(Vec::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Queues a one-shot outcome for the next call to `spawn`, taking
    /// priority over the default script.
    pub fn push_script(&self, script: FakeIsolateScript) {
        self.scripts.lock().push_back(script);
    }

    pub fn spawned_requests(&self) -> Vec<SpawnRequest> {
        self.spawned.lock().clone()
    }

    /// Returns the controller for the Nth successful spawn, in call order.
    pub fn handle(&self, index: usize) -> Option<FakeHandleController> {
        self.handles.lock().get(index).cloned()
    }

    pub fn handle_count(&self) -> usize {
        self.handles.lock().len()
    }
}

#[async_trait]
impl Isolate for FakeIsolate {
    type Handle = FakeHandle;

    async fn spawn(&self, request: SpawnRequest) -> Result<FakeHandle, IsolateError> {
        self.spawned.lock().push(request);

        let script = {
            let mut queue = self.scripts.lock();
            queue.pop_front().unwrap_or_else(|| self.default.clone())
        };

        match script {
            FakeIsolateScript::Succeed => {
                let (writer, reader) = tokio::io::duplex(4096);
                let terminated = Arc::new(AtomicBool::new(false));
                let terminate_calls = Arc::new(AtomicU32::new(0));

                self.handles.lock().push(FakeHandleController {
                    stdout_writer: Arc::new(tokio::sync::Mutex::new(writer)),
                    terminated: terminated.clone(),
                    terminate_calls: terminate_calls.clone(),
                });

                Ok(FakeHandle {
                    stdout_reader: Some(Box::new(reader)),
                    terminated,
                    terminate_calls,
                })
            }
            FakeIsolateScript::Hang => std::future::pending().await,
            FakeIsolateScript::Fail(message) => Err(IsolateError::Spawn(std::io::Error::new(
                std::io::ErrorKind::Other,
                message,
            ))),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
