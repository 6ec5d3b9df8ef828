// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Pool (C3) entries and their supervisor task. `state` holds the
//! pure transition logic (§4.3); this module is the async glue that drives
//! it with a real isolate, a real session, and real timers.

pub mod state;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use state::{WorkerMachine, WorkerState, WorkerStats};

use crate::error::WorkerError;
use crate::fetcher::{pump, CrashlogRing};
use crate::session::{Session, SessionEvent};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use warden_adapters::isolate::{Isolate, IsolateHandle, SpawnRequest};
use warden_core::{AppName, Profile, WorkerId};

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Rendezvous point between the daemon's connection listener (which reads
/// the first frame off an incoming unix connection to learn the worker's
/// uuid) and the worker supervisor waiting in `handshaking` for exactly
/// that connection.
#[derive(Default)]
pub struct HandshakeRegistry {
    pending: SyncMutex<HashMap<WorkerId, oneshot::Sender<(BoxedReader, BoxedWriter)>>>,
}

impl HandshakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: WorkerId) -> oneshot::Receiver<(BoxedReader, BoxedWriter)> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);
        rx
    }

    pub fn cancel(&self, id: &WorkerId) {
        self.pending.lock().remove(id);
    }

    pub fn is_registered(&self, id: &WorkerId) -> bool {
        self.pending.lock().contains_key(id)
    }

    /// Called by the listener once it has read a `Handshake{uuid}` frame
    /// matching a registered worker. Returns `false` if no worker of that
    /// id is currently waiting (stale or unknown uuid).
    pub fn complete(&self, id: &WorkerId, reader: BoxedReader, writer: BoxedWriter) -> bool {
        if let Some(tx) = self.pending.lock().remove(id) {
            tx.send((reader, writer)).is_ok()
        } else {
            false
        }
    }
}

/// Outcome of supervising one worker end to end, delivered to the engine's
/// cleanup path exactly once per spawned worker (invariant 4).
#[derive(Debug)]
pub struct WorkerOutcome {
    pub id: WorkerId,
    pub final_state: &'static str,
    pub cause: Option<WorkerError>,
}

/// Commands the engine posts to a worker's supervisor. `Seal` drives
/// active -> sealing (idempotent past that point, property 7); `Shutdown`
/// force-advances straight to terminating, used by `shutdown(force)`.
#[derive(Debug, Clone, Copy)]
pub enum WorkerCommand {
    Seal,
    Shutdown,
}

/// Drives one worker through every state in §4.3: asks the isolate to
/// spawn, waits for the session handshake, pumps heartbeats and the output
/// fetcher while active, then drains and tears the process down. Reports
/// every state transition through `on_transition` (the engine updates its
/// pool map and notifies the balancer from there) and session/channel
/// traffic through the `Session` it installs.
pub async fn supervise<I, F, S>(
    id: WorkerId,
    app: AppName,
    executable: std::path::PathBuf,
    endpoint: std::path::PathBuf,
    env: Vec<(String, String)>,
    profile: Profile,
    isolate: Arc<I>,
    handshakes: Arc<HandshakeRegistry>,
    mut commands: mpsc::UnboundedReceiver<WorkerCommand>,
    mut on_transition: F,
    on_session: S,
) -> WorkerOutcome
where
    I: Isolate,
    F: FnMut(&WorkerState),
    S: FnOnce(Arc<Session>),
{
    let crashlog = Arc::new(SyncMutex::new(CrashlogRing::new(profile.crashlog_limit as usize)));

    // --- spawning ---
    tracing::info!(app = %app, worker_id = %id, "worker spawning");
    on_transition(&WorkerState::Spawning { entered_at: Instant::now() });
    let spawn_request = SpawnRequest {
        executable,
        args: vec![
            "--uuid".to_string(),
            id.as_str().to_string(),
            "--app".to_string(),
            app.as_str().to_string(),
            "--endpoint".to_string(),
            endpoint.display().to_string(),
            "--locator".to_string(),
            endpoint.display().to_string(),
            "--protocol".to_string(),
            "1".to_string(),
        ],
        env,
    };

    let mut handle = match tokio::time::timeout(profile.spawn_timeout(), isolate.spawn(spawn_request)).await {
        Ok(Ok(handle)) => handle,
        Ok(Err(e)) => {
            return fail(id, WorkerError::SpawnFailed(e.to_string()), &mut on_transition);
        }
        Err(_) => {
            return fail(id, WorkerError::SpawnTimeout, &mut on_transition);
        }
    };

    if let Some(stdout) = handle.take_stdout() {
        let crashlog_tx = crashlog_forwarder(id.clone(), Arc::clone(&crashlog));
        tokio::spawn(pump(stdout, crashlog_tx));
    }

    // --- handshaking ---
    tracing::info!(app = %app, worker_id = %id, "worker handshaking");
    on_transition(&WorkerState::Handshaking { entered_at: Instant::now() });
    let handshake_rx = handshakes.register(id.clone());
    let (reader, writer) = match tokio::time::timeout(profile.handshake_timeout(), handshake_rx).await {
        Ok(Ok(streams)) => streams,
        Ok(Err(_)) | Err(_) => {
            handshakes.cancel(&id);
            let _ = handle.terminate(profile.kill_timeout()).await;
            return fail(id, WorkerError::HandshakeTimeout, &mut on_transition);
        }
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let session = Session::new(id.clone(), writer, events_tx, profile.handshake_timeout());
    tokio::spawn(session.clone().run_reader(reader));
    on_session(session.clone());

    // --- active ---
    tracing::info!(app = %app, worker_id = %id, "worker active");
    on_transition(&WorkerState::Active { idle_since: Some(Instant::now()) });
    let active_exit = active_loop(&id, &profile, &session, &mut events_rx, &mut commands).await;

    let cause = match active_exit {
        ActiveExit::Error(err) => Some(err),
        ActiveExit::SealRequested => {
            tracing::info!(app = %app, worker_id = %id, "worker sealing");
            on_transition(&WorkerState::Sealing { entered_at: Instant::now() });
            sealing_loop(&profile, &session, &mut commands).await
        }
        ActiveExit::ShutdownRequested => None,
    };

    // --- terminating ---
    tracing::info!(app = %app, worker_id = %id, "worker terminating");
    on_transition(&WorkerState::Terminating { entered_at: Instant::now() });
    let _ = session.send_control(crate::protocol::ControlMessage::Terminate {
        code: 0,
        reason: "engine requested shutdown".to_string(),
    }).await;
    let ack = tokio::time::timeout(profile.terminate_timeout(), async {
        while let Some(event) = events_rx.recv().await {
            if matches!(event, SessionEvent::Terminated) {
                return;
            }
        }
    })
    .await;
    if ack.is_err() {
        tracing::warn!(worker_id = %id, "terminate ack timed out, proceeding to kill");
    }
    let _ = handle.terminate(profile.kill_timeout()).await;
    session.detach_all("worker terminated");
    tracing::info!(app = %app, worker_id = %id, "session torn down");
    crashlog.lock().flush_to_log(&id);

    match cause {
        Some(err) => fail(id, err, &mut on_transition),
        None => {
            tracing::info!(app = %app, worker_id = %id, "worker stopped");
            on_transition(&WorkerState::Stopped);
            WorkerOutcome {
                id,
                final_state: "stopped",
                cause: None,
            }
        }
    }
}

/// How the active (or sealing) loop ended.
enum ActiveExit {
    Error(WorkerError),
    SealRequested,
    ShutdownRequested,
}

/// Runs the heartbeat/idle loop while `active`: answers pings, watches for
/// the idle timeout, and reacts to engine commands or session loss.
async fn active_loop(
    _id: &WorkerId,
    profile: &Profile,
    session: &Arc<Session>,
    events_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    commands: &mut mpsc::UnboundedReceiver<WorkerCommand>,
) -> ActiveExit {
    let heartbeat_timeout = profile.heartbeat_timeout();
    let ping_every = heartbeat_timeout / 2;
    let mut ping_ticker = tokio::time::interval(ping_every.max(Duration::from_millis(1)));
    let mut last_pong = Instant::now();
    let mut idle_since = Some(Instant::now());

    loop {
        tokio::select! {
            _ = ping_ticker.tick() => {
                if Instant::now().duration_since(last_pong) >= heartbeat_timeout {
                    return ActiveExit::Error(WorkerError::HeartbeatTimeout);
                }
                let _ = session.send_control(crate::protocol::ControlMessage::Ping).await;
            }
            event = events_rx.recv() => {
                match event {
                    Some(SessionEvent::Pong) => last_pong = Instant::now(),
                    Some(SessionEvent::Terminated) => return ActiveExit::ShutdownRequested,
                    Some(SessionEvent::Disconnected(_)) | None => {
                        return ActiveExit::Error(WorkerError::ConnectionLost);
                    }
                }
            }
            command = commands.recv() => {
                match command {
                    Some(WorkerCommand::Seal) => return ActiveExit::SealRequested,
                    Some(WorkerCommand::Shutdown) | None => return ActiveExit::ShutdownRequested,
                }
            }
        }

        if session.channel_count() == 0 {
            let since = *idle_since.get_or_insert_with(Instant::now);
            if let Some(idle_timeout) = profile.idle_timeout() {
                if Instant::now().duration_since(since) >= idle_timeout {
                    return ActiveExit::SealRequested;
                }
            }
        } else {
            idle_since = None;
        }
    }
}

/// Runs while `sealing`: waits for the last channel to close, the seal
/// timer to fire, or a force-shutdown command, then returns (to
/// terminating).
async fn sealing_loop(
    profile: &Profile,
    session: &Arc<Session>,
    commands: &mut mpsc::UnboundedReceiver<WorkerCommand>,
) -> Option<WorkerError> {
    let deadline = tokio::time::sleep(profile.seal_timeout());
    tokio::pin!(deadline);
    let mut poll = tokio::time::interval(Duration::from_millis(20).min(profile.seal_timeout()));

    loop {
        tokio::select! {
            _ = &mut deadline => return None,
            command = commands.recv() => {
                if matches!(command, Some(WorkerCommand::Shutdown) | None) {
                    return None;
                }
            }
            _ = poll.tick() => {
                if session.channel_count() == 0 {
                    return None;
                }
            }
        }
    }
}

fn crashlog_forwarder(id: WorkerId, crashlog: Arc<SyncMutex<CrashlogRing>>) -> impl FnMut(String) {
    move |line: String| {
        tracing::trace!(worker_id = %id, %line, "worker stdout");
        crashlog.lock().push(line);
    }
}

fn fail<F: FnMut(&WorkerState)>(id: WorkerId, error: WorkerError, on_transition: &mut F) -> WorkerOutcome {
    tracing::warn!(worker_id = %id, %error, "worker broken");
    on_transition(&WorkerState::Broken(error.clone()));
    WorkerOutcome {
        id,
        final_state: "broken",
        cause: Some(error),
    }
}
