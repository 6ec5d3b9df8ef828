// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-application tuning knobs (§3 Profile).
//!
//! A `Profile` is immutable for the lifetime of the engine it configures.
//! Validation happens once, at construction, so a misconfigured app fails
//! fast with a typed error instead of misbehaving at runtime.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operational limits and timeouts for one hosted application.
///
/// Every duration field is milliseconds, matching the wire/config
/// convention used throughout §3-§5; callers that want a typed
/// `std::time::Duration` should go through the `*_duration()` accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Maximum number of concurrent workers (invariant 3, §3).
    pub pool_limit: u32,
    /// Maximum queued-but-unassigned invocations; 0 means unbounded (invariant 4).
    pub queue_limit: u32,
    pub spawn_timeout_ms: u64,
    pub handshake_timeout_ms: u64,
    pub heartbeat_timeout_ms: u64,
    /// 0 disables idle draining.
    pub idle_timeout_ms: u64,
    pub terminate_timeout_ms: u64,
    pub seal_timeout_ms: u64,
    /// Lines of stdout/stderr retained in the crashlog ring (§4.8).
    pub crashlog_limit: u32,
    /// Channels one worker may serve simultaneously (invariant 2).
    pub concurrency: u32,
    /// Queue-to-pool ratio above which the balancer spawns a new worker (§4.6).
    pub grow_threshold: f64,
    /// SIGTERM -> SIGKILL grace period when terminating the OS process.
    pub kill_timeout_ms: u64,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            pool_limit: 1,
            queue_limit: 0,
            spawn_timeout_ms: 5_000,
            handshake_timeout_ms: 5_000,
            heartbeat_timeout_ms: 10_000,
            idle_timeout_ms: 0,
            terminate_timeout_ms: 5_000,
            seal_timeout_ms: 5_000,
            crashlog_limit: 50,
            concurrency: 1,
            grow_threshold: 1.0,
            kill_timeout_ms: 5_000,
        }
    }
}

/// Why a `Profile` was rejected at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("pool_limit must be at least 1")]
    ZeroPoolLimit,
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("grow_threshold must be positive, got {0}")]
    NonPositiveGrowThreshold(String),
    #[error("{field} must be nonzero")]
    ZeroTimeout { field: &'static str },
}

impl Profile {
    /// Validate invariants that the rest of the engine assumes hold for the
    /// lifetime of this profile. Called once when an application starts.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.pool_limit == 0 {
            return Err(ProfileError::ZeroPoolLimit);
        }
        if self.concurrency == 0 {
            return Err(ProfileError::ZeroConcurrency);
        }
        if !(self.grow_threshold > 0.0) {
            return Err(ProfileError::NonPositiveGrowThreshold(
                self.grow_threshold.to_string(),
            ));
        }
        for (field, value) in [
            ("spawn_timeout_ms", self.spawn_timeout_ms),
            ("handshake_timeout_ms", self.handshake_timeout_ms),
            ("heartbeat_timeout_ms", self.heartbeat_timeout_ms),
            ("terminate_timeout_ms", self.terminate_timeout_ms),
            ("seal_timeout_ms", self.seal_timeout_ms),
            ("kill_timeout_ms", self.kill_timeout_ms),
        ] {
            if value == 0 {
                return Err(ProfileError::ZeroTimeout { field });
            }
        }
        Ok(())
    }

    pub fn spawn_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.spawn_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn heartbeat_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_timeout_ms)
    }

    /// `None` when idle draining is disabled (`idle_timeout_ms == 0`).
    pub fn idle_timeout(&self) -> Option<std::time::Duration> {
        (self.idle_timeout_ms > 0).then(|| std::time::Duration::from_millis(self.idle_timeout_ms))
    }

    pub fn terminate_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.terminate_timeout_ms)
    }

    pub fn seal_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.seal_timeout_ms)
    }

    pub fn kill_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.kill_timeout_ms)
    }

    /// Whether the queue has room for one more item given its current length.
    pub fn queue_has_room(&self, current_len: usize) -> bool {
        self.queue_limit == 0 || (current_len as u64) < self.queue_limit as u64
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
