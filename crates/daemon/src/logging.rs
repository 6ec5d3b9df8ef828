// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging initialization (§2.1): every lifecycle transition, queue
//! admission/rejection, and session teardown already emits a structured
//! `tracing` event from `warden-engine`; this module only wires up where
//! those events go and installs the global subscriber exactly once at
//! process start (§4.9).

use std::ffi::OsStr;
use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` (standard `EnvFilter` syntax)
/// controls verbosity, defaulting to `info`. When `log_path` is set, events
/// are written there through a non-blocking appender whose flush thread
/// lives as long as the returned guard; otherwise events go to stderr.
pub fn init(log_path: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| OsStr::new("wardend.log"));
            let (non_blocking, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            None
        }
    }
}
