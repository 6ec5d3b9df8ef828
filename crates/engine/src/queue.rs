// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending Queue (C2, §4.2): a bounded FIFO of invocations not yet assigned
//! to a worker.

use crate::channel::{MessageReceiver, MessageSender};
use std::collections::VecDeque;
use std::time::Instant;
use warden_core::Event;

/// One invocation waiting for a worker. `to_client` is delivered worker
/// responses once assigned; `from_client` carries request chunks the
/// caller pushed before (or after) assignment, forwarded onto the worker's
/// session in order once a worker claims this item.
pub struct PendingItem {
    pub event: Event,
    pub to_client: MessageSender,
    pub from_client: MessageReceiver,
    pub deadline: Option<Instant>,
}

impl PendingItem {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}

/// FIFO of [`PendingItem`]s; push at the back, the balancer pulls from the
/// front (§4.2). Bounded by `Profile::queue_limit`; enforcing the bound is
/// the caller's (`Engine::enqueue`'s) responsibility, not this type's.
#[derive(Default)]
pub struct PendingQueue {
    items: VecDeque<PendingItem>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, item: PendingItem) {
        self.items.push_back(item);
    }

    pub fn pop_front(&mut self) -> Option<PendingItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Birth time of the longest-waiting item, for `info()` metrics.
    pub fn oldest_birth(&self) -> Option<Instant> {
        self.items.front().map(|item| item.event.birth)
    }

    /// Drains every item, e.g. for `shutdown(force)` (§4.1).
    pub fn drain(&mut self) -> impl Iterator<Item = PendingItem> + '_ {
        self.items.drain(..)
    }

    /// Removes and returns every item whose deadline has passed, preserving
    /// FIFO order among the items that remain (invariant 7, §8 property 7).
    pub fn evict_expired(&mut self, now: Instant) -> Vec<PendingItem> {
        let mut expired = Vec::new();
        let mut kept = VecDeque::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if item.is_expired(now) {
                expired.push(item);
            } else {
                kept.push_back(item);
            }
        }
        self.items = kept;
        expired
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
