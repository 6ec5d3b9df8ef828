// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn age_reflects_elapsed_time_since_birth() {
    let birth = Instant::now();
    let event = Event::new("echo", birth);
    let later = birth + std::time::Duration::from_millis(50);
    assert_eq!(event.age(later), std::time::Duration::from_millis(50));
}

#[test]
fn age_saturates_rather_than_panics_if_now_precedes_birth() {
    let birth = Instant::now();
    let event = Event::new("echo", birth);
    let earlier = birth - std::time::Duration::from_millis(10);
    assert_eq!(event.age(earlier), std::time::Duration::ZERO);
}

#[test]
fn builders_set_optional_fields() {
    let event = Event::new("echo", Instant::now())
        .with_trace_id("t-1")
        .with_tag("sticky");
    assert_eq!(event.trace_id.as_deref(), Some("t-1"));
    assert_eq!(event.tag.as_deref(), Some("sticky"));
}

#[test]
fn name_is_opaque_and_preserved_verbatim() {
    let event = Event::new("weird/name with spaces", Instant::now());
    assert_eq!(event.name, "weird/name with spaces");
}
