// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine (C1, §4.1): the per-application facade tying the pending queue,
//! worker pool, balancer, and session layer together. One `Engine` owns
//! exactly one hosted application; the daemon (C0) holds one per running
//! app in its registry.
//!
//! Engine-internal state (the pool map and the queue) lives behind a
//! single `parking_lot::Mutex`, mutated from whichever tokio task currently
//! needs to — the caller's `enqueue`, a worker's transition callback, or
//! the reconciliation tick below — rather than a single dedicated event
//! loop thread. This follows the reference architecture's own
//! `self.worker_states.lock()` style rather than a hand-rolled actor
//! mailbox; see DESIGN.md.

use crate::assign::assign;
use crate::balancer::{Balancer, Decision, SimpleBalancer, WorkerSnapshot};
use crate::channel::{ChannelHandle, MessageSender};
use crate::error::{AsErrorCode, EngineError};
use crate::queue::{PendingItem, PendingQueue};
use crate::session::Session;
use crate::worker::{supervise, HandshakeRegistry, WorkerCommand, WorkerMachine, WorkerOutcome, WorkerState};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use warden_adapters::isolate::Isolate;
use warden_core::{AppDescriptor, ChannelIdAllocator, Event, IdGen, WorkerId};

/// How `Engine::shutdown` should treat in-flight work (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Seal every worker; let open channels drain before terminating.
    Graceful,
    /// Terminate every worker immediately; abort open channels with
    /// `connection_lost` and fail every still-queued item with
    /// `engine_stopped`.
    Force,
}

/// One slot in the pool: lifecycle state plus what the engine needs to
/// reach the worker (its command channel) or its session (once handshook).
struct WorkerSlot {
    machine: WorkerMachine,
    session: Option<Arc<Session>>,
    commands: mpsc::UnboundedSender<WorkerCommand>,
}

#[derive(Default)]
struct EngineState {
    pool: HashMap<WorkerId, WorkerSlot>,
    queue: PendingQueue,
    stopped: bool,
}

/// Per-worker summary returned by `Engine::info` (§4.1).
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub id: WorkerId,
    pub state: &'static str,
    pub load: u32,
    pub total_served: u64,
}

/// Snapshot of one application's engine, for the daemon's status surface.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub pool_size: usize,
    pub queue_len: usize,
    pub oldest_queued_age: Option<Duration>,
    pub workers: Vec<WorkerSummary>,
}

/// Per-application host (C1). Generic over the isolate driver so the
/// engine core never depends on how a worker process is actually spawned,
/// and over the worker-id generator (`IdGen` is not object-safe, since it
/// requires `Clone`, so this is a type parameter rather than a `dyn`).
pub struct Engine<I: Isolate + 'static, G: IdGen + 'static> {
    app: AppDescriptor,
    isolate: Arc<I>,
    handshakes: Arc<HandshakeRegistry>,
    id_gen: G,
    balancer: Mutex<Box<dyn Balancer>>,
    state: Mutex<EngineState>,
    channel_ids: ChannelIdAllocator,
}

impl<I: Isolate + 'static, G: IdGen + 'static> Engine<I, G> {
    /// Builds an engine for `app` and starts its background reconciliation
    /// loop (load bookkeeping + queue draining). The returned `Arc` is the
    /// handle every caller (including the worker completion tasks this
    /// spawns) shares.
    pub fn start(app: AppDescriptor, isolate: Arc<I>, id_gen: G) -> Arc<Self> {
        let engine = Arc::new(Self {
            app,
            isolate,
            handshakes: Arc::new(HandshakeRegistry::new()),
            id_gen,
            balancer: Mutex::new(Box::new(SimpleBalancer::new())),
            state: Mutex::new(EngineState::default()),
            channel_ids: ChannelIdAllocator::new(),
        });
        tokio::spawn(Arc::clone(&engine).reconcile_loop());
        engine
    }

    pub fn handshakes(&self) -> &Arc<HandshakeRegistry> {
        &self.handshakes
    }

    pub fn app(&self) -> &AppDescriptor {
        &self.app
    }

    /// Appends an invocation to the queue (or assigns it immediately if an
    /// idle worker exists), notifying the balancer (§4.1, §4.7).
    pub async fn enqueue(self: &Arc<Self>, event: Event, upstream: MessageSender) -> Result<ChannelHandle, EngineError> {
        let (to_worker, from_client) = mpsc::unbounded_channel();
        let engine_id = self.channel_ids.alloc();
        let item = PendingItem {
            event,
            to_client: upstream,
            from_client,
            deadline: None,
        };

        let decision = {
            let mut state = self.state.lock();
            if state.stopped {
                tracing::warn!(app = %self.app.name, "enqueue rejected, engine stopped");
                return Err(EngineError::EngineStopped);
            }
            if !self.app.profile.queue_has_room(state.queue.len()) {
                tracing::warn!(app = %self.app.name, queue_len = state.queue.len(), "enqueue rejected, queue full");
                return Err(EngineError::QueueFull);
            }
            state.queue.push_back(item);
            tracing::info!(app = %self.app.name, queue_len = state.queue.len(), "item admitted to queue");
            let snapshot = self.snapshot_workers(&state);
            let queue_len = state.queue.len();
            let pool_len = state.pool.len();
            self.balancer
                .lock()
                .on_enqueue(&snapshot, queue_len, pool_len, self.app.profile.pool_limit, self.app.profile.grow_threshold)
        };

        self.act_on(decision).await;

        Ok(ChannelHandle::new(engine_id, to_worker))
    }

    /// Point-in-time view of pool and queue state (§4.1 `info`).
    pub fn info(&self) -> EngineInfo {
        let state = self.state.lock();
        let workers = state
            .pool
            .iter()
            .map(|(id, slot)| WorkerSummary {
                id: id.clone(),
                state: slot.machine.state.name(),
                load: slot.machine.load,
                total_served: slot.machine.stats.total_served,
            })
            .collect();
        EngineInfo {
            pool_size: state.pool.len(),
            queue_len: state.queue.len(),
            oldest_queued_age: state.queue.oldest_birth().map(|b| Instant::now().saturating_duration_since(b)),
            workers,
        }
    }

    /// Stops accepting new work and tears down the pool (§4.1).
    /// `Graceful` seals every worker and lets existing channels drain;
    /// `Force` terminates immediately and fails every queued item with
    /// `engine_stopped`.
    pub async fn shutdown(&self, mode: ShutdownMode) {
        tracing::info!(app = %self.app.name, ?mode, "engine shutting down");
        let commands: Vec<mpsc::UnboundedSender<WorkerCommand>> = {
            let mut state = self.state.lock();
            state.stopped = true;
            if mode == ShutdownMode::Force {
                for item in state.queue.drain() {
                    let _ = item.to_client.send(crate::channel::ChannelMessage::Error {
                        code: warden_core::ErrorCode::EngineStopped,
                        reason: "engine stopped".to_string(),
                    });
                }
            }
            state.pool.values().map(|slot| slot.commands.clone()).collect()
        };

        let command = match mode {
            ShutdownMode::Graceful => WorkerCommand::Seal,
            ShutdownMode::Force => WorkerCommand::Shutdown,
        };
        for tx in commands {
            let _ = tx.send(command);
        }
        tracing::info!(app = %self.app.name, "shutdown commands dispatched to pool");
    }

    fn snapshot_workers(&self, state: &EngineState) -> Vec<WorkerSnapshot> {
        state
            .pool
            .iter()
            .filter(|(_, slot)| matches!(slot.machine.state, WorkerState::Active { .. }))
            .map(|(id, slot)| WorkerSnapshot {
                id: id.clone(),
                load: slot.machine.load,
                concurrency: self.app.profile.concurrency,
                oldest_channel_timestamp: slot.machine.stats.oldest_channel_timestamp,
            })
            .collect()
    }

    async fn act_on(self: &Arc<Self>, decision: Decision) {
        match decision {
            Decision::Wait => {}
            Decision::SpawnOne => self.spawn_worker(),
            Decision::Assign(worker_id) => self.assign_next(worker_id).await,
        }
    }

    /// Checks the pool/queue/load invariants (§3 invariants 2-4) that must
    /// hold at every reconcile tick. Returns a description of the first
    /// violation found, if any; a violation is fatal to the engine (§7).
    fn detect_invariant_violation(&self) -> Option<String> {
        let state = self.state.lock();
        let profile = &self.app.profile;
        if state.pool.len() > profile.pool_limit as usize {
            return Some(format!("pool size {} exceeds pool_limit {}", state.pool.len(), profile.pool_limit));
        }
        if profile.queue_limit > 0 && state.queue.len() > profile.queue_limit as usize {
            return Some(format!("queue length {} exceeds queue_limit {}", state.queue.len(), profile.queue_limit));
        }
        for (id, slot) in state.pool.iter() {
            if slot.machine.load > profile.concurrency {
                return Some(format!("worker {id} load {} exceeds concurrency {}", slot.machine.load, profile.concurrency));
            }
        }
        None
    }

    /// Pops the oldest queued item and wires it onto `worker_id`'s session.
    /// A no-op if the worker has since gone away or the queue emptied out
    /// from under us (both benign races the reconciler will retry).
    async fn assign_next(self: &Arc<Self>, worker_id: WorkerId) {
        let (session, item) = {
            let mut state = self.state.lock();
            let Some(slot) = state.pool.get_mut(&worker_id) else { return };
            let Some(session) = slot.session.clone() else { return };
            if !slot.machine.can_accept_channel(self.app.profile.concurrency) {
                return;
            }
            let Some(item) = state.queue.pop_front() else { return };
            slot.machine.on_channel_started(Instant::now());
            (session, item)
        };

        assign(session, item, Instant::now()).await;
    }

    fn spawn_worker(self: &Arc<Self>) {
        let id = WorkerId::new(self.id_gen.next());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        {
            let mut state = self.state.lock();
            state.pool.insert(
                id.clone(),
                WorkerSlot {
                    machine: WorkerMachine::new(Instant::now()),
                    session: None,
                    commands: commands_tx,
                },
            );
        }

        let engine = Arc::clone(self);
        let worker_id = id.clone();
        tokio::spawn(async move {
            let engine_for_transitions = Arc::clone(&engine);
            let transition_id = worker_id.clone();
            let engine_for_session = Arc::clone(&engine);
            let session_id = worker_id.clone();

            let outcome = supervise(
                worker_id.clone(),
                engine.app.name.clone(),
                engine.app.executable.clone(),
                engine.app.endpoint.clone(),
                engine.app.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                engine.app.profile,
                Arc::clone(&engine.isolate),
                Arc::clone(&engine.handshakes),
                commands_rx,
                move |state| {
                    let became_active = matches!(state, WorkerState::Active { .. });
                    if let Some(slot) = engine_for_transitions.state.lock().pool.get_mut(&transition_id) {
                        slot.machine.state = state.clone();
                    }
                    if became_active {
                        // A freshly active worker has load zero but isn't visible to
                        // `act_on` until the next `enqueue`/`reconcile_loop` tick
                        // unless we nudge the balancer here ourselves.
                        let engine = Arc::clone(&engine_for_transitions);
                        let id = transition_id.clone();
                        tokio::spawn(async move {
                            let queue_len = engine.state.lock().queue.len();
                            let decision = engine.balancer.lock().on_worker_spawned(id, queue_len);
                            engine.act_on(decision).await;
                        });
                    }
                },
                move |session| {
                    if let Some(slot) = engine_for_session.state.lock().pool.get_mut(&session_id) {
                        slot.session = Some(session);
                    }
                },
            )
            .await;

            engine.on_worker_done(outcome).await;
        });
    }

    async fn on_worker_done(self: &Arc<Self>, outcome: WorkerOutcome) {
        let decision = {
            let mut state = self.state.lock();
            state.pool.remove(&outcome.id);
            let queue_len = state.queue.len();
            let pool_len = state.pool.len();
            if queue_len > 0 {
                self.balancer.lock().on_worker_died(pool_len, self.app.profile.pool_limit, queue_len, self.app.profile.grow_threshold)
            } else {
                Decision::Wait
            }
        };
        self.act_on(decision).await;
    }

    /// Periodically reconciles worker load against each session's live
    /// channel count (channels close asynchronously from the session's
    /// reader task, which has no direct path back into engine state) and
    /// redrains the queue when that frees capacity.
    async fn reconcile_loop(self: Arc<Self>) {
        let mut tick = tokio::time::interval(Duration::from_millis(25));
        loop {
            tick.tick().await;
            if self.state.lock().stopped {
                return;
            }

            if let Some(reason) = self.detect_invariant_violation() {
                let err = EngineError::Invariant(reason);
                tracing::error!(app = %self.app.name, error = %err, "internal invariant violated, forcing shutdown");
                self.shutdown(ShutdownMode::Force).await;
                return;
            }

            let expired: Vec<PendingItem> = self.state.lock().queue.evict_expired(Instant::now());
            if !expired.is_empty() {
                let code = EngineError::DeadlineExpired.as_error_code();
                for item in expired {
                    tracing::warn!(app = %self.app.name, "pending item's deadline expired before assignment");
                    let _ = item.to_client.send(crate::channel::ChannelMessage::Error {
                        code,
                        reason: EngineError::DeadlineExpired.to_string(),
                    });
                }
            }

            let freed = {
                let mut state = self.state.lock();
                let mut freed = false;
                for slot in state.pool.values_mut() {
                    if let Some(session) = &slot.session {
                        let live = session.channel_count() as u32;
                        while slot.machine.load > live {
                            slot.machine.on_channel_finished(Instant::now());
                            freed = true;
                        }
                    }
                }
                freed
            };

            if freed {
                let decision = {
                    let state = self.state.lock();
                    if state.queue.is_empty() {
                        Decision::Wait
                    } else {
                        let snapshot = self.snapshot_workers(&state);
                        self.balancer.lock().on_capacity_freed(&snapshot, state.queue.len())
                    }
                };
                self.act_on(decision).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
