// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The invocation an engine is asked to route (§3 Event).

use std::time::Instant;

/// One invocation a client wants served by some worker of an application.
///
/// `birth` is a monotonic timestamp used only to compute age for metrics and
/// for the balancer's least-recently-used tiebreak (§4.6); it is never
/// serialized or sent to a worker.
#[derive(Debug, Clone)]
pub struct Event {
    /// Opaque operation name the worker dispatches on. Never interpreted by
    /// the core (§1 non-goals: "does not interpret payload bytes").
    pub name: String,
    pub birth: Instant,
    pub trace_id: Option<String>,
    /// Optional sticky-routing tag; a balancer is free to prefer a worker
    /// that previously served the same tag, though the default policy (§4.6)
    /// ignores it.
    pub tag: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, birth: Instant) -> Self {
        Self {
            name: name.into(),
            birth,
            trace_id: None,
            tag: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.birth)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
