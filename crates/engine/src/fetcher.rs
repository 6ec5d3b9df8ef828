// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output Fetcher & Splitter (C8, §4.8): reads a worker's stdout into
//! complete lines and keeps the last `crashlog_limit` of them around so a
//! worker that dies abnormally leaves a trail in the logs.

use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt};
use warden_core::WorkerId;

const READ_CHUNK: usize = 4096;

/// Accumulates bytes and yields complete `\n`-terminated lines, mirroring
/// the reference architecture's line splitter.
#[derive(Debug, Default)]
pub struct Splitter {
    buffer: Vec<u8>,
}

impl Splitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consume(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Pops the next complete line, if any, leaving a trailing partial line
    /// buffered for the next `consume`.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned())
    }
}

/// Fixed-size ring of the most recent stdout lines, flushed to the logging
/// sink when a worker dies with a nonzero error (§4.8).
#[derive(Debug, Default)]
pub struct CrashlogRing {
    limit: usize,
    lines: VecDeque<String>,
}

impl CrashlogRing {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            lines: VecDeque::with_capacity(limit.min(256)),
        }
    }

    pub fn push(&mut self, line: String) {
        if self.limit == 0 {
            return;
        }
        if self.lines.len() >= self.limit {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Emits every retained line as a `tracing` event and clears the ring;
    /// called once when a worker with a nonzero exit is torn down.
    pub fn flush_to_log(&mut self, worker_id: &WorkerId) {
        for line in self.lines.drain(..) {
            tracing::warn!(worker_id = %worker_id, crashlog_line = %line, "worker crashlog");
        }
    }
}

/// Reads a worker's captured stdout to completion, pushing each complete
/// line into the handle's crashlog ring via `on_line`. Returns once EOF is
/// reached (not an error on its own, §4.8) or the read errors.
pub async fn pump<R, F>(mut reader: R, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(String),
{
    let mut splitter = Splitter::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "output fetcher read error, stopping");
                break;
            }
        };
        splitter.consume(&buf[..n]);
        while let Some(line) = splitter.next_line() {
            on_line(line);
        }
    }
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;
