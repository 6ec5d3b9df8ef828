// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-stable error codes (§7).
//!
//! `ErrorCode` is what actually crosses the wire on `error(code, reason)`
//! frames (§6) and what gets attached to a terminal worker state (§4.3).
//! Richer, crate-local error enums (see `warden-engine::error`) wrap a
//! human-readable cause but always carry one of these codes so a client on
//! the other end of the channel can match on a stable integer rather than
//! parse a string.

use serde::{Deserialize, Serialize};

/// Client-visible and worker-lifecycle error codes (§7).
///
/// Numeric values are part of the wire protocol and must never be reassigned
/// once shipped; new codes are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    /// The pending queue was at `queue_limit` capacity.
    QueueFull = 1,
    /// `enqueue` was called after `shutdown`.
    EngineStopped = 2,
    /// A `deadline` attached to a `PendingItem` elapsed before assignment.
    DeadlineExpired = 3,
    /// The worker itself reported a failure for this invocation.
    InvocationFailed = 4,
    /// The isolate did not produce a running process within `spawn_timeout_ms`.
    SpawnTimeout = 5,
    /// The process connected but never completed the handshake in time.
    HandshakeTimeout = 6,
    /// No `pong` arrived within `heartbeat_timeout_ms`.
    HeartbeatTimeout = 7,
    /// A worker stayed `sealing` longer than `seal_timeout_ms`.
    SealTimeout = 8,
    /// A worker did not ack `terminate` within `terminate_timeout_ms`.
    TerminateTimeout = 9,
    /// The app's unix endpoint could not be resolved or bound.
    LocatorUnavailable = 10,
    /// The isolate failed to start the OS process at all.
    SpawnFailed = 11,
    /// The session's transport was closed or errored.
    ConnectionLost = 12,
    /// The worker process exited on its own outside of a requested termination.
    CommittedSuicide = 13,
}

impl ErrorCode {
    /// Short machine-stable name, for logging and for the numeric reason text
    /// sent alongside the code on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::QueueFull => "queue_full",
            ErrorCode::EngineStopped => "engine_stopped",
            ErrorCode::DeadlineExpired => "deadline_expired",
            ErrorCode::InvocationFailed => "invocation_failed",
            ErrorCode::SpawnTimeout => "spawn_timeout",
            ErrorCode::HandshakeTimeout => "handshake_timeout",
            ErrorCode::HeartbeatTimeout => "heartbeat_timeout",
            ErrorCode::SealTimeout => "seal_timeout",
            ErrorCode::TerminateTimeout => "terminate_timeout",
            ErrorCode::LocatorUnavailable => "locator_unavailable",
            ErrorCode::SpawnFailed => "spawn_failed",
            ErrorCode::ConnectionLost => "connection_lost",
            ErrorCode::CommittedSuicide => "committed_suicide",
        }
    }

    /// Whether this code denotes a worker lifecycle failure (transitions the
    /// worker to a terminal state and fans out to every open channel), as
    /// opposed to a client-visible protocol error local to one enqueue/channel.
    pub fn is_worker_lifecycle(self) -> bool {
        matches!(
            self,
            ErrorCode::SpawnTimeout
                | ErrorCode::HandshakeTimeout
                | ErrorCode::HeartbeatTimeout
                | ErrorCode::SealTimeout
                | ErrorCode::TerminateTimeout
                | ErrorCode::LocatorUnavailable
                | ErrorCode::SpawnFailed
                | ErrorCode::ConnectionLost
                | ErrorCode::CommittedSuicide
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "codes_tests.rs"]
mod tests;
