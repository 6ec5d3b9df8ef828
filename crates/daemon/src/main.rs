// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! wardend: loads the daemon configuration, starts one engine per
//! configured application, and listens on each app's worker endpoint until
//! asked to shut down (§4.9).

use std::path::PathBuf;

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use warden_daemon::{listener, logging, DaemonConfig, Registry};
use warden_engine::ShutdownMode;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path_from_args();
    let log_path = std::env::var_os("WARDEND_LOG").map(PathBuf::from);
    let _log_guard = logging::init(log_path.as_deref());

    let config = DaemonConfig::load(&config_path)?;
    info!(apps = config.apps.len(), path = %config_path.display(), "loaded configuration");

    let registry = Registry::new();
    let mut listeners = Vec::new();
    for app in config.apps {
        let name = app.name.clone();
        let engine = registry.start(app);
        info!(app = %name, "started engine");
        listeners.push(tokio::spawn(listener::serve(engine)));
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    registry.shutdown_all(ShutdownMode::Graceful).await;
    for handle in listeners {
        handle.abort();
    }

    info!("daemon stopped");
    Ok(())
}

/// The config path is the sole positional argument; defaults to the
/// standard system location so `wardend` with no arguments does the
/// expected thing under a service manager.
fn config_path_from_args() -> PathBuf {
    std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/etc/warden/wardend.toml"))
}
