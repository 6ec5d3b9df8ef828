// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::sync::mpsc;

fn item(name: &str) -> PendingItem {
    let (to_client, _to_client_rx) = mpsc::unbounded_channel();
    let (_from_client_tx, from_client) = mpsc::unbounded_channel();
    PendingItem {
        event: Event::new(name, Instant::now()),
        to_client,
        from_client,
        deadline: None,
    }
}

#[test]
fn fifo_ordering_is_preserved() {
    let mut queue = PendingQueue::new();
    queue.push_back(item("a"));
    queue.push_back(item("b"));
    queue.push_back(item("c"));

    assert_eq!(queue.pop_front().unwrap().event.name, "a");
    assert_eq!(queue.pop_front().unwrap().event.name, "b");
    assert_eq!(queue.len(), 1);
}

#[test]
fn oldest_birth_tracks_the_front_item() {
    let mut queue = PendingQueue::new();
    assert!(queue.oldest_birth().is_none());
    let before = Instant::now();
    queue.push_back(item("a"));
    assert!(queue.oldest_birth().unwrap() >= before);
}

#[test]
fn drain_empties_the_queue_in_order() {
    let mut queue = PendingQueue::new();
    queue.push_back(item("a"));
    queue.push_back(item("b"));
    let names: Vec<_> = queue.drain().map(|i| i.event.name.clone()).collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert!(queue.is_empty());
}

#[test]
fn expired_item_is_detected_via_deadline() {
    let mut it = item("a");
    it.deadline = Some(Instant::now() - std::time::Duration::from_millis(1));
    assert!(it.is_expired(Instant::now()));
}

#[test]
fn evict_expired_removes_only_expired_items_and_keeps_fifo_order() {
    let mut queue = PendingQueue::new();
    let mut a = item("a");
    a.deadline = Some(Instant::now() - std::time::Duration::from_millis(1));
    let b = item("b");
    let mut c = item("c");
    c.deadline = Some(Instant::now() - std::time::Duration::from_millis(1));
    queue.push_back(a);
    queue.push_back(b);
    queue.push_back(c);

    let expired = queue.evict_expired(Instant::now());
    assert_eq!(expired.iter().map(|i| i.event.name.clone()).collect::<Vec<_>>(), vec!["a", "c"]);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.pop_front().unwrap().event.name, "b");
}
