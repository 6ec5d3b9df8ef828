// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn snap(id: &str, load: u32, concurrency: u32, age_ms: u64) -> WorkerSnapshot {
    WorkerSnapshot {
        id: WorkerId::new(id),
        load,
        concurrency,
        oldest_channel_timestamp: Some(Instant::now() - Duration::from_millis(age_ms)),
    }
}

#[test]
fn enqueue_spawns_when_pool_is_empty() {
    let mut balancer = SimpleBalancer::new();
    let decision = balancer.on_enqueue(&[], 1, 0, 3, 1.0);
    assert_eq!(decision, Decision::SpawnOne);
}

#[test]
fn enqueue_assigns_the_least_loaded_worker() {
    let mut balancer = SimpleBalancer::new();
    let workers = vec![snap("w1", 1, 2, 100), snap("w2", 0, 2, 100)];
    let decision = balancer.on_enqueue(&workers, 1, 2, 2, 1.0);
    assert_eq!(decision, Decision::Assign(WorkerId::new("w2")));
}

#[test]
fn ties_are_broken_by_oldest_channel_timestamp() {
    let mut balancer = SimpleBalancer::new();
    // both idle (load 0), w1's oldest channel is older -> prefer w1
    let workers = vec![snap("w1", 0, 2, 500), snap("w2", 0, 2, 10)];
    let decision = balancer.on_enqueue(&workers, 1, 2, 2, 1.0);
    assert_eq!(decision, Decision::Assign(WorkerId::new("w1")));
}

#[test]
fn enqueue_waits_when_pool_is_full_and_no_capacity() {
    let mut balancer = SimpleBalancer::new();
    let workers = vec![snap("w1", 2, 2, 100)];
    let decision = balancer.on_enqueue(&workers, 3, 1, 1, 1.0);
    assert_eq!(decision, Decision::Wait);
}

#[test]
fn enqueue_grows_pool_when_queue_pressure_exceeds_threshold() {
    let mut balancer = SimpleBalancer::new();
    let workers = vec![snap("w1", 2, 2, 100)];
    // pool_len=1, queue_len=2, grow_threshold=1.0 -> 2 > 1*1.0
    let decision = balancer.on_enqueue(&workers, 2, 1, 3, 1.0);
    assert_eq!(decision, Decision::SpawnOne);
}

#[test]
fn capacity_freed_assigns_from_queue_when_nonempty() {
    let mut balancer = SimpleBalancer::new();
    let workers = vec![snap("w1", 0, 1, 100)];
    assert_eq!(balancer.on_capacity_freed(&workers, 1), Decision::Assign(WorkerId::new("w1")));
    assert_eq!(balancer.on_capacity_freed(&workers, 0), Decision::Wait);
}

#[test]
fn worker_died_with_pending_queue_below_growth_spawns_replacement() {
    let mut balancer = SimpleBalancer::new();
    assert_eq!(balancer.on_worker_died(0, 2, 3, 1.0), Decision::SpawnOne);
    assert_eq!(balancer.on_worker_died(2, 2, 3, 1.0), Decision::Wait);
}
