// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Balancer (C7, §4.6): a pluggable policy object deciding when to assign,
//! spawn, or wait. The engine calls the hooks below at the moments §4.6
//! names; `SimpleBalancer` is the default "least-loaded" policy.

use std::time::Instant;
use warden_core::WorkerId;

/// A candidate worker the balancer may assign a pending item to.
#[derive(Debug, Clone)]
pub struct WorkerSnapshot {
    pub id: WorkerId,
    pub load: u32,
    pub concurrency: u32,
    pub oldest_channel_timestamp: Option<Instant>,
}

impl WorkerSnapshot {
    fn has_capacity(&self) -> bool {
        self.load < self.concurrency
    }
}

/// A decision the balancer reaches after observing the engine's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Assign the front of the queue to this worker.
    Assign(WorkerId),
    /// Spawn a new worker; the queue is left as-is for now.
    SpawnOne,
    /// Nothing to do.
    Wait,
}

/// Policy hooks (§4.6). Implementations are not required to be `Send` free
/// of interior mutability concerns beyond what the engine already
/// serializes them behind.
pub trait Balancer: Send {
    /// Called after the queue has grown by one; decides whether to assign
    /// immediately, spawn, or wait.
    fn on_enqueue(&mut self, workers: &[WorkerSnapshot], queue_len: usize, pool_len: usize, pool_limit: u32, grow_threshold: f64) -> Decision;

    /// Called once a worker reaches `active`, or a channel finishes,
    /// freeing capacity; same decision shape as `on_enqueue`.
    fn on_capacity_freed(&mut self, workers: &[WorkerSnapshot], queue_len: usize) -> Decision;

    /// Called when a worker transitions to a terminal state while the
    /// queue is non-empty; may request a replacement spawn.
    fn on_worker_died(&mut self, pool_len: usize, pool_limit: u32, queue_len: usize, grow_threshold: f64) -> Decision;

    /// Called once a freshly spawned worker reaches `active` with load
    /// zero; the worker itself is the candidate, so the balancer only
    /// needs to decide whether the queue has anything for it.
    fn on_worker_spawned(&mut self, id: WorkerId, queue_len: usize) -> Decision;
}

/// Default policy (§4.6): least-loaded assignment, ties broken by the
/// worker whose oldest open channel is oldest (keeps long-lived workers
/// fresh); spawns when empty or when queue pressure exceeds
/// `grow_threshold * pool size`.
#[derive(Debug, Default)]
pub struct SimpleBalancer;

impl SimpleBalancer {
    pub fn new() -> Self {
        Self
    }

    fn pick_least_loaded(workers: &[WorkerSnapshot]) -> Option<WorkerId> {
        workers
            .iter()
            .filter(|w| w.has_capacity())
            .min_by(|a, b| {
                a.load.cmp(&b.load).then_with(|| {
                    match (a.oldest_channel_timestamp, b.oldest_channel_timestamp) {
                        (Some(x), Some(y)) => x.cmp(&y),
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    }
                })
            })
            .map(|w| w.id.clone())
    }

    fn should_grow(pool_len: usize, pool_limit: u32, queue_len: usize, grow_threshold: f64) -> bool {
        if pool_len >= pool_limit as usize {
            return false;
        }
        pool_len == 0 || (queue_len as f64) > (pool_len as f64) * grow_threshold
    }
}

impl Balancer for SimpleBalancer {
    fn on_enqueue(
        &mut self,
        workers: &[WorkerSnapshot],
        queue_len: usize,
        pool_len: usize,
        pool_limit: u32,
        grow_threshold: f64,
    ) -> Decision {
        if let Some(id) = Self::pick_least_loaded(workers) {
            return Decision::Assign(id);
        }
        if Self::should_grow(pool_len, pool_limit, queue_len, grow_threshold) {
            return Decision::SpawnOne;
        }
        Decision::Wait
    }

    fn on_capacity_freed(&mut self, workers: &[WorkerSnapshot], queue_len: usize) -> Decision {
        if queue_len == 0 {
            return Decision::Wait;
        }
        match Self::pick_least_loaded(workers) {
            Some(id) => Decision::Assign(id),
            None => Decision::Wait,
        }
    }

    fn on_worker_died(&mut self, pool_len: usize, pool_limit: u32, queue_len: usize, grow_threshold: f64) -> Decision {
        if queue_len > 0 && Self::should_grow(pool_len, pool_limit, queue_len, grow_threshold) {
            Decision::SpawnOne
        } else {
            Decision::Wait
        }
    }

    fn on_worker_spawned(&mut self, id: WorkerId, queue_len: usize) -> Decision {
        if queue_len > 0 {
            Decision::Assign(id)
        } else {
            Decision::Wait
        }
    }
}

#[cfg(test)]
#[path = "balancer_tests.rs"]
mod tests;
