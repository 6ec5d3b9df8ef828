// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker State Machine (C4, §4.3): the lifecycle of one worker, expressed
//! as a tagged variant owned by the worker pool's slot rather than the
//! inheritance hierarchy the reference architecture used. Each variant
//! records when it was entered so timeouts can be checked against the
//! owning engine's clock; replacing the variant is the only way to
//! transition, which is what gives invariant 5 (only legal transitions,
//! `broken`/`stopped` terminal) for free.

use crate::error::WorkerError;
use std::time::Instant;
use warden_core::Profile;

/// One worker's position in the lifecycle of §4.3.
#[derive(Debug, Clone)]
pub enum WorkerState {
    Spawning { entered_at: Instant },
    Handshaking { entered_at: Instant },
    Active { idle_since: Option<Instant> },
    Sealing { entered_at: Instant },
    Terminating { entered_at: Instant },
    Stopped,
    Broken(WorkerError),
}

impl WorkerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Stopped | WorkerState::Broken(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorkerState::Spawning { .. } => "spawning",
            WorkerState::Handshaking { .. } => "handshaking",
            WorkerState::Active { .. } => "active",
            WorkerState::Sealing { .. } => "sealing",
            WorkerState::Terminating { .. } => "terminating",
            WorkerState::Stopped => "stopped",
            WorkerState::Broken(_) => "broken",
        }
    }

    /// The timeout that applies to the current state, if any, and whether
    /// `now` has crossed it (§4.3's per-state timers).
    pub fn timed_out(&self, profile: &Profile, now: Instant) -> Option<WorkerError> {
        match self {
            WorkerState::Spawning { entered_at } => {
                (now.duration_since(*entered_at) >= profile.spawn_timeout())
                    .then_some(WorkerError::SpawnTimeout)
            }
            WorkerState::Handshaking { entered_at } => {
                (now.duration_since(*entered_at) >= profile.handshake_timeout())
                    .then_some(WorkerError::HandshakeTimeout)
            }
            WorkerState::Sealing { entered_at } => {
                (now.duration_since(*entered_at) >= profile.seal_timeout())
                    .then_some(WorkerError::SealTimeout)
            }
            WorkerState::Terminating { entered_at } => {
                (now.duration_since(*entered_at) >= profile.terminate_timeout())
                    .then_some(WorkerError::TerminateTimeout)
            }
            WorkerState::Active { .. } | WorkerState::Stopped | WorkerState::Broken(_) => None,
        }
    }
}

/// Current operational state plus the bookkeeping the engine needs for
/// `info()` and for assignment decisions (minus the
/// isolate handle / session / fetcher, which the owning module composes
/// alongside this).
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    pub total_served: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub oldest_channel_timestamp: Option<Instant>,
}

/// Pure state-machine core: legal transitions only, no I/O. The async
/// supervisor (`worker::supervise`) drives this with real timers and
/// session events; unit tests drive it directly.
#[derive(Debug, Clone)]
pub struct WorkerMachine {
    pub state: WorkerState,
    pub load: u32,
    pub stats: WorkerStats,
}

impl WorkerMachine {
    pub fn new(now: Instant) -> Self {
        Self {
            state: WorkerState::Spawning { entered_at: now },
            load: 0,
            stats: WorkerStats::default(),
        }
    }

    pub fn can_accept_channel(&self, concurrency: u32) -> bool {
        matches!(self.state, WorkerState::Active { .. }) && self.load < concurrency
    }

    /// Whether an idle-timeout-configured worker has been idle (load zero)
    /// long enough to drain itself (Active -> Sealing, §4.3).
    pub fn should_seal_for_idle(&self, profile: &Profile, now: Instant) -> bool {
        match (&self.state, profile.idle_timeout()) {
            (WorkerState::Active { idle_since: Some(since) }, Some(idle_timeout)) => {
                now.duration_since(*since) >= idle_timeout
            }
            _ => false,
        }
    }

    /// spawning -> handshaking, once the isolate has produced a process.
    pub fn on_spawned(&mut self, now: Instant) {
        if let WorkerState::Spawning { .. } = self.state {
            self.state = WorkerState::Handshaking { entered_at: now };
        }
    }

    /// handshaking -> active, on a valid handshake frame (§4.3).
    pub fn on_handshaken(&mut self) {
        if let WorkerState::Handshaking { .. } = self.state {
            self.state = WorkerState::Active { idle_since: Some(Instant::now()) };
        }
    }

    pub fn on_channel_started(&mut self, now: Instant) {
        self.load += 1;
        if let WorkerState::Active { idle_since } = &mut self.state {
            *idle_since = None;
        }
        self.stats
            .oldest_channel_timestamp
            .get_or_insert(now);
    }

    pub fn on_channel_finished(&mut self, now: Instant) {
        self.load = self.load.saturating_sub(1);
        self.stats.total_served += 1;
        if self.load == 0 {
            if let WorkerState::Active { idle_since } = &mut self.state {
                *idle_since = Some(now);
            }
        }
    }

    /// active -> sealing. A no-op outside `active` (property 7: idempotent).
    pub fn seal(&mut self, now: Instant) {
        if matches!(self.state, WorkerState::Active { .. }) {
            self.state = WorkerState::Sealing { entered_at: now };
        }
    }

    /// sealing -> terminating, either because the last channel closed or
    /// the seal timer fired.
    pub fn begin_terminating(&mut self, now: Instant) {
        if matches!(self.state, WorkerState::Sealing { .. } | WorkerState::Active { .. }) {
            self.state = WorkerState::Terminating { entered_at: now };
        }
    }

    pub fn stop(&mut self) {
        if !self.state.is_terminal() {
            self.state = WorkerState::Stopped;
        }
    }

    pub fn fail(&mut self, error: WorkerError) {
        if !self.state.is_terminal() {
            self.state = WorkerState::Broken(error);
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
