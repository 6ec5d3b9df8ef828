// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn lifecycle_codes_are_classified_correctly() {
    assert!(ErrorCode::SpawnTimeout.is_worker_lifecycle());
    assert!(ErrorCode::ConnectionLost.is_worker_lifecycle());
    assert!(!ErrorCode::QueueFull.is_worker_lifecycle());
    assert!(!ErrorCode::EngineStopped.is_worker_lifecycle());
}

#[test]
fn display_matches_as_str() {
    assert_eq!(ErrorCode::QueueFull.to_string(), "queue_full");
    assert_eq!(ErrorCode::ConnectionLost.to_string(), "connection_lost");
}

#[test]
fn serde_roundtrip_preserves_variant() {
    let code = ErrorCode::HandshakeTimeout;
    let json = serde_json::to_string(&code).unwrap();
    let back: ErrorCode = serde_json::from_str(&json).unwrap();
    assert_eq!(back, code);
}
