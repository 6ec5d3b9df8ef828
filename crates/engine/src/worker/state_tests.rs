// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use warden_core::Profile;

fn profile() -> Profile {
    Profile {
        spawn_timeout_ms: 100,
        handshake_timeout_ms: 100,
        seal_timeout_ms: 100,
        terminate_timeout_ms: 100,
        idle_timeout_ms: 100,
        ..Profile::default()
    }
}

#[test]
fn happy_path_walks_every_state_in_order() {
    let now = Instant::now();
    let mut machine = WorkerMachine::new(now);
    assert_eq!(machine.state.name(), "spawning");

    machine.on_spawned(now);
    assert_eq!(machine.state.name(), "handshaking");

    machine.on_handshaken();
    assert_eq!(machine.state.name(), "active");

    machine.seal(now);
    assert_eq!(machine.state.name(), "sealing");

    machine.begin_terminating(now);
    assert_eq!(machine.state.name(), "terminating");

    machine.stop();
    assert_eq!(machine.state.name(), "stopped");
    assert!(machine.state.is_terminal());
}

#[test]
fn spawn_timeout_is_detected_once_elapsed() {
    let past = Instant::now() - Duration::from_millis(200);
    let machine = WorkerMachine::new(past);
    let err = machine.state.timed_out(&profile(), Instant::now());
    assert!(matches!(err, Some(WorkerError::SpawnTimeout)));
}

#[test]
fn no_timeout_reported_before_threshold() {
    let machine = WorkerMachine::new(Instant::now());
    assert!(machine.state.timed_out(&profile(), Instant::now()).is_none());
}

#[test]
fn seal_is_idempotent_on_a_sealing_worker() {
    let now = Instant::now();
    let mut machine = WorkerMachine::new(now);
    machine.on_spawned(now);
    machine.on_handshaken();
    machine.seal(now);
    let WorkerState::Sealing { entered_at: first } = machine.state else {
        panic!("expected sealing");
    };

    std::thread::sleep(Duration::from_millis(5));
    machine.seal(Instant::now());
    let WorkerState::Sealing { entered_at: second } = machine.state else {
        panic!("expected still sealing");
    };
    assert_eq!(first, second, "calling seal() again must not reset the timer");
}

#[test]
fn seal_is_a_no_op_on_a_terminal_worker() {
    let now = Instant::now();
    let mut machine = WorkerMachine::new(now);
    machine.fail(WorkerError::SpawnTimeout);
    machine.seal(now);
    assert!(matches!(machine.state, WorkerState::Broken(_)));
}

#[test]
fn channel_load_tracks_active_invocations() {
    let now = Instant::now();
    let mut machine = WorkerMachine::new(now);
    machine.on_spawned(now);
    machine.on_handshaken();

    machine.on_channel_started(now);
    assert_eq!(machine.load, 1);
    assert!(!machine.can_accept_channel(1));
    assert!(machine.can_accept_channel(2));

    machine.on_channel_finished(now);
    assert_eq!(machine.load, 0);
    assert_eq!(machine.stats.total_served, 1);
}

#[test]
fn idle_worker_is_flagged_for_seal_after_idle_timeout() {
    let now = Instant::now();
    let mut machine = WorkerMachine::new(now);
    machine.on_spawned(now);
    machine.on_handshaken();

    let past = now - Duration::from_millis(200);
    if let WorkerState::Active { idle_since } = &mut machine.state {
        *idle_since = Some(past);
    }
    assert!(machine.should_seal_for_idle(&profile(), Instant::now()));
}

#[test]
fn fail_is_terminal_and_further_transitions_are_ignored() {
    let now = Instant::now();
    let mut machine = WorkerMachine::new(now);
    machine.fail(WorkerError::HandshakeTimeout);
    machine.on_handshaken();
    assert!(matches!(machine.state, WorkerState::Broken(WorkerError::HandshakeTimeout)));
}
