// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::AsyncReadExt;

fn request(program: &str, args: &[&str]) -> SpawnRequest {
    SpawnRequest {
        executable: program.into(),
        args: args.iter().map(|s| s.to_string()).collect(),
        env: Vec::new(),
    }
}

#[tokio::test]
async fn spawn_captures_stdout() {
    let isolate = ProcessIsolate;
    let mut handle = isolate
        .spawn(request("/bin/echo", &["hello-worker"]))
        .await
        .expect("spawn should succeed");

    let mut stdout = handle.take_stdout().expect("stdout should be captured");
    let mut buf = String::new();
    stdout.read_to_string(&mut buf).await.expect("read stdout");
    assert_eq!(buf.trim(), "hello-worker");

    handle
        .terminate(Duration::from_millis(200))
        .await
        .expect("terminate an already-exited process is a no-op");
}

#[tokio::test]
async fn take_stdout_returns_none_on_second_call() {
    let isolate = ProcessIsolate;
    let mut handle = isolate.spawn(request("/bin/true", &[])).await.unwrap();
    assert!(handle.take_stdout().is_some());
    assert!(handle.take_stdout().is_none());
}

#[tokio::test]
async fn terminate_kills_a_long_running_process_after_grace_period() {
    let isolate = ProcessIsolate;
    let mut handle = isolate
        .spawn(request("/bin/sleep", &["30"]))
        .await
        .expect("spawn sleep");

    let start = std::time::Instant::now();
    handle
        .terminate(Duration::from_millis(100))
        .await
        .expect("terminate should escalate to SIGKILL and succeed");
    // sleep ignores nothing in particular, but we should not have waited
    // anywhere near the full 30s sleep duration.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn spawn_of_missing_executable_reports_isolate_error() {
    let isolate = ProcessIsolate;
    let err = isolate
        .spawn(request("/no/such/executable-warden-test", &[]))
        .await
        .expect_err("missing executable must fail to spawn");
    assert!(matches!(err, IsolateError::Spawn(_)));
}
