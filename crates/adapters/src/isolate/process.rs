// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The default isolate: a bare child process on the local host.
//!
//! This is the minimal correct implementation of the Isolate interface
//! (§6); a cgroup- or container-backed isolate would implement the same
//! trait without the engine noticing the difference.

use super::{Isolate, IsolateError, IsolateHandle, SpawnRequest};
use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdout, Command};

/// Spawns workers as plain OS processes via `tokio::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessIsolate;

#[async_trait]
impl Isolate for ProcessIsolate {
    type Handle = ProcessHandle;

    async fn spawn(&self, request: SpawnRequest) -> Result<ProcessHandle, IsolateError> {
        let mut command = Command::new(&request.executable);
        command
            .args(&request.args)
            .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(IsolateError::Spawn)?;
        let stdout = child.stdout.take();

        Ok(ProcessHandle { child, stdout })
    }
}

/// A live (or exited) worker process owned by its supervisor task.
pub struct ProcessHandle {
    child: Child,
    stdout: Option<ChildStdout>,
}

#[async_trait]
impl IsolateHandle for ProcessHandle {
    fn take_stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout.take().map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn terminate(&mut self, kill_timeout: Duration) -> Result<(), IsolateError> {
        if let Some(pid) = self.child.id() {
            // ESRCH ("no such process") just means it already exited; not our problem.
            let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }

        match tokio::time::timeout(kill_timeout, self.child.wait()).await {
            Ok(Ok(_status)) => Ok(()),
            Ok(Err(e)) => Err(IsolateError::Terminate(e)),
            Err(_elapsed) => {
                self.child.start_kill().map_err(IsolateError::Terminate)?;
                let _ = self.child.wait().await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
