// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection listener (C0 ambient, §4.4/§6): binds one app's worker
//! endpoint and bridges freshly-accepted unix connections into that app's
//! [`HandshakeRegistry`](warden_engine::HandshakeRegistry) once they present
//! a `Handshake{uuid}` frame. One `serve` task runs per hosted application;
//! the engine's own `spawning`/`handshaking` states never touch a socket
//! directly (§4.3 leaves the unix endpoint as an external collaborator,
//! §1).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::split;
use tokio::net::{UnixListener, UnixStream};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use warden_adapters::framing::{self, FrameError};
use warden_adapters::isolate::Isolate;
use warden_core::{IdGen, WorkerId};
use warden_engine::protocol::{ControlMessage, Frame, FramePayload};
use warden_engine::Engine;

#[derive(Debug, Error)]
pub enum ListenError {
    #[error("failed to bind unix socket at {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
enum HandshakeError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("first frame on the connection was not a handshake")]
    UnexpectedMessage,
    #[error("no worker with uuid {0} is currently awaiting a handshake")]
    UnknownWorker(String),
}

/// How long `handshake_one` will wait for the engine to register a worker
/// id before giving up on an already-accepted connection. Generous relative
/// to normal scheduling jitter; a worker that loses this race still has its
/// own `handshake_timeout_ms` as a backstop (it will simply reconnect-less
/// and transition to `broken`).
const REGISTRATION_GRACE: Duration = Duration::from_millis(500);

/// Binds `engine`'s app endpoint and accepts worker connections until the
/// socket errors out or the task is aborted by the caller.
pub async fn serve<I, G>(engine: Arc<Engine<I, G>>) -> Result<(), ListenError>
where
    I: Isolate + 'static,
    G: IdGen + 'static,
{
    let endpoint = engine.app().endpoint.clone();
    let app = engine.app().name.clone();

    if endpoint.exists() {
        let _ = std::fs::remove_file(&endpoint);
    }
    if let Some(parent) = endpoint.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let listener = UnixListener::bind(&endpoint).map_err(|source| ListenError::Bind {
        path: endpoint.clone(),
        source,
    })?;
    info!(app = %app, endpoint = %endpoint.display(), "listening for worker connections");

    loop {
        let (stream, _addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(app = %app, error = %e, "accept failed");
                continue;
            }
        };

        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if let Err(e) = handshake_one(&engine, stream).await {
                debug!(app = %engine.app().name, error = %e, "worker connection dropped before handshake completed");
            }
        });
    }
}

/// Reads exactly one handshake frame off `stream` and hands the split
/// halves to the matching worker supervisor via `HandshakeRegistry::complete`
/// (§4.4: "the worker must connect ... and send a handshake frame bearing
/// its uuid").
async fn handshake_one<I, G>(engine: &Arc<Engine<I, G>>, stream: UnixStream) -> Result<(), HandshakeError>
where
    I: Isolate + 'static,
    G: IdGen + 'static,
{
    let (mut reader, writer) = split(stream);
    let timeout = engine.app().profile.handshake_timeout();
    let frame: Frame = framing::read_message(&mut reader, timeout).await?;

    let uuid = match frame.message {
        FramePayload::Control(ControlMessage::Handshake { uuid }) => uuid,
        _ => return Err(HandshakeError::UnexpectedMessage),
    };
    let worker_id = WorkerId::new(uuid.clone());

    let deadline = Instant::now() + REGISTRATION_GRACE;
    while !engine.handshakes().is_registered(&worker_id) {
        if Instant::now() >= deadline {
            return Err(HandshakeError::UnknownWorker(uuid));
        }
        sleep(Duration::from_millis(5)).await;
    }

    if engine.handshakes().complete(&worker_id, Box::new(reader), Box::new(writer)) {
        Ok(())
    } else {
        Err(HandshakeError::UnknownWorker(uuid))
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
