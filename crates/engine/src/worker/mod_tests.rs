// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{ControlMessage, Frame, FramePayload};
use warden_adapters::framing;
use warden_adapters::isolate::fake::{FakeIsolate, FakeIsolateScript};
use warden_core::AppName;

fn fast_profile() -> Profile {
    Profile {
        pool_limit: 1,
        concurrency: 1,
        spawn_timeout_ms: 200,
        handshake_timeout_ms: 200,
        heartbeat_timeout_ms: 200,
        seal_timeout_ms: 150,
        terminate_timeout_ms: 200,
        kill_timeout_ms: 200,
        idle_timeout_ms: 0,
        ..Profile::default()
    }
}

async fn connect_fake_worker(handshakes: Arc<HandshakeRegistry>, id: WorkerId) -> tokio::io::DuplexStream {
    while !handshakes.is_registered(&id) {
        tokio::task::yield_now().await;
    }
    let (worker_side, engine_side) = tokio::io::duplex(8192);
    let (er, ew) = tokio::io::split(engine_side);
    assert!(handshakes.complete(&id, Box::new(er), Box::new(ew)));
    worker_side
}

#[tokio::test]
async fn spawn_timeout_reports_broken_with_spawn_timeout_cause() {
    let isolate = Arc::new(FakeIsolate::new(FakeIsolateScript::Hang));
    let handshakes = Arc::new(HandshakeRegistry::new());
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let transitions = Arc::new(SyncMutex::new(Vec::new()));
    let transitions2 = transitions.clone();

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        supervise(
            WorkerId::new("w1"),
            AppName::new("echoer"),
            "/fake/worker".into(),
            "/tmp/echoer.sock".into(),
            Vec::new(),
            fast_profile(),
            isolate,
            handshakes,
            cmd_rx,
            move |state| transitions2.lock().push(state.name().to_string()),
            |_session| {},
        ),
    )
    .await
    .expect("supervise must not hang past spawn_timeout");

    assert!(matches!(outcome.cause, Some(WorkerError::SpawnTimeout)));
    assert_eq!(transitions.lock().as_slice(), &["spawning", "broken"]);
}

#[tokio::test]
async fn handshake_timeout_reports_broken_and_terminates_the_process() {
    let isolate = Arc::new(FakeIsolate::new(FakeIsolateScript::Succeed));
    let handshakes = Arc::new(HandshakeRegistry::new());
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        supervise(
            WorkerId::new("w1"),
            AppName::new("echoer"),
            "/fake/worker".into(),
            "/tmp/echoer.sock".into(),
            Vec::new(),
            fast_profile(),
            isolate.clone(),
            handshakes,
            cmd_rx,
            |_| {},
            |_session| {},
        ),
    )
    .await
    .expect("supervise must not hang past handshake_timeout");

    assert!(matches!(outcome.cause, Some(WorkerError::HandshakeTimeout)));
    assert!(isolate.handle(0).unwrap().was_terminated());
}

#[tokio::test]
async fn happy_path_handshakes_answers_heartbeats_and_shuts_down_cleanly() {
    let isolate = Arc::new(FakeIsolate::new(FakeIsolateScript::Succeed));
    let handshakes = Arc::new(HandshakeRegistry::new());
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let id = WorkerId::new("w1");

    let worker_task = tokio::spawn(connect_fake_worker(handshakes.clone(), id.clone()));

    let supervise_task = tokio::spawn(supervise(
        id,
        AppName::new("echoer"),
        "/fake/worker".into(),
        "/tmp/echoer.sock".into(),
        Vec::new(),
        fast_profile(),
        isolate,
        handshakes,
        cmd_rx,
        |_| {},
        |_session| {},
    ));

    let mut worker_side = worker_task.await.unwrap();

    // Answer one heartbeat ping to prove the active loop is live.
    let bytes = framing::read_frame(&mut worker_side).await.unwrap();
    let frame: Frame = framing::decode(&bytes).unwrap();
    assert!(matches!(frame.message, FramePayload::Control(ControlMessage::Ping)));
    let pong = framing::encode(&Frame::new(0, FramePayload::Control(ControlMessage::Pong))).unwrap();
    framing::write_frame(&mut worker_side, &pong).await.unwrap();

    // Engine requests shutdown; worker acks the terminate RPC.
    cmd_tx.send(WorkerCommand::Shutdown).unwrap();
    let bytes = framing::read_frame(&mut worker_side).await.unwrap();
    let frame: Frame = framing::decode(&bytes).unwrap();
    assert!(matches!(frame.message, FramePayload::Control(ControlMessage::Terminate { .. })));
    let terminated = framing::encode(&Frame::new(0, FramePayload::Control(ControlMessage::Terminated))).unwrap();
    framing::write_frame(&mut worker_side, &terminated).await.unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(2), supervise_task)
        .await
        .expect("supervise must finish")
        .unwrap();

    assert_eq!(outcome.final_state, "stopped");
    assert!(outcome.cause.is_none());
}

#[tokio::test]
async fn withheld_pongs_trip_the_heartbeat_timeout_and_tear_the_worker_down() {
    let isolate = Arc::new(FakeIsolate::new(FakeIsolateScript::Succeed));
    let handshakes = Arc::new(HandshakeRegistry::new());
    let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let id = WorkerId::new("w1");

    let worker_task = tokio::spawn(connect_fake_worker(handshakes.clone(), id.clone()));

    let started = Instant::now();
    let supervise_task = tokio::spawn(supervise(
        id,
        AppName::new("echoer"),
        "/fake/worker".into(),
        "/tmp/echoer.sock".into(),
        Vec::new(),
        fast_profile(),
        isolate,
        handshakes,
        cmd_rx,
        |_| {},
        |_session| {},
    ));

    // Never answer the pings this worker is sent; the active loop must
    // declare a heartbeat timeout on its own once `heartbeat_timeout_ms`
    // elapses without a pong.
    let _worker_side = worker_task.await.unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(2), supervise_task)
        .await
        .expect("supervise must not hang past heartbeat_timeout")
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(200), "must wait at least heartbeat_timeout_ms");
    assert_eq!(outcome.final_state, "broken");
    assert!(matches!(outcome.cause, Some(WorkerError::HeartbeatTimeout)));
}
