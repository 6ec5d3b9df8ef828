// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_adapters::isolate::fake::{FakeIsolate, FakeIsolateScript};
use warden_core::{Profile, SequentialIdGen};

fn fake_registry() -> Registry<FakeIsolate, SequentialIdGen> {
    Registry::with(Arc::new(FakeIsolate::new(FakeIsolateScript::Succeed)), SequentialIdGen::new("w"))
}

fn app(name: &str) -> AppDescriptor {
    AppDescriptor::new(name, "/fake/worker", format!("/tmp/{name}.sock"), Profile::default())
}

#[test]
fn starting_an_app_makes_it_discoverable_by_name() {
    let registry = fake_registry();
    registry.start(app("echoer"));

    assert_eq!(registry.names(), vec![AppName::new("echoer")]);
    assert!(registry.get(&AppName::new("echoer")).is_some());
    assert!(registry.get(&AppName::new("missing")).is_none());
}

#[test]
fn info_all_aggregates_every_hosted_app() {
    let registry = fake_registry();
    registry.start(app("echoer"));
    registry.start(app("uppercaser"));

    let info = registry.info_all();
    assert_eq!(info.len(), 2);
    assert!(info.contains_key(&AppName::new("echoer")));
    assert!(info.contains_key(&AppName::new("uppercaser")));
    for snapshot in info.values() {
        assert_eq!(snapshot.pool_size, 0);
        assert_eq!(snapshot.queue_len, 0);
    }
}

#[test]
fn starting_the_same_name_twice_replaces_the_previous_engine() {
    let registry = fake_registry();
    let first = registry.start(app("echoer"));
    let second = registry.start(app("echoer"));

    assert_eq!(registry.names().len(), 1);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn shutdown_all_stops_every_hosted_app() {
    let registry = fake_registry();
    registry.start(app("echoer"));
    registry.start(app("uppercaser"));

    registry.shutdown_all(ShutdownMode::Force).await;

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let err = registry
        .get(&AppName::new("echoer"))
        .unwrap()
        .enqueue(warden_core::Event::new("noop", std::time::Instant::now()), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, warden_engine::EngineError::EngineStopped));
}
