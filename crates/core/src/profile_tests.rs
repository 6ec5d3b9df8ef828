// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_profile_validates() {
    assert!(Profile::default().validate().is_ok());
}

#[test]
fn zero_pool_limit_is_rejected() {
    let profile = Profile {
        pool_limit: 0,
        ..Profile::default()
    };
    assert_eq!(profile.validate(), Err(ProfileError::ZeroPoolLimit));
}

#[test]
fn zero_concurrency_is_rejected() {
    let profile = Profile {
        concurrency: 0,
        ..Profile::default()
    };
    assert_eq!(profile.validate(), Err(ProfileError::ZeroConcurrency));
}

#[test]
fn non_positive_grow_threshold_is_rejected() {
    let profile = Profile {
        grow_threshold: 0.0,
        ..Profile::default()
    };
    assert!(profile.validate().is_err());

    let negative = Profile {
        grow_threshold: -1.0,
        ..Profile::default()
    };
    assert!(negative.validate().is_err());
}

#[test]
fn zero_timeout_is_rejected() {
    let profile = Profile {
        spawn_timeout_ms: 0,
        ..Profile::default()
    };
    assert_eq!(
        profile.validate(),
        Err(ProfileError::ZeroTimeout {
            field: "spawn_timeout_ms"
        })
    );
}

#[test]
fn queue_limit_zero_means_unbounded() {
    let profile = Profile {
        queue_limit: 0,
        ..Profile::default()
    };
    assert!(profile.queue_has_room(10_000));
}

#[test]
fn queue_limit_bounds_room() {
    let profile = Profile {
        queue_limit: 2,
        ..Profile::default()
    };
    assert!(profile.queue_has_room(0));
    assert!(profile.queue_has_room(1));
    assert!(!profile.queue_has_room(2));
}

#[test]
fn idle_timeout_none_when_zero() {
    let profile = Profile {
        idle_timeout_ms: 0,
        ..Profile::default()
    };
    assert_eq!(profile.idle_timeout(), None);
}

#[test]
fn idle_timeout_some_when_nonzero() {
    let profile = Profile {
        idle_timeout_ms: 1_000,
        ..Profile::default()
    };
    assert_eq!(profile.idle_timeout(), Some(std::time::Duration::from_secs(1)));
}

#[test]
fn serde_roundtrip_preserves_fields() {
    let profile = Profile {
        pool_limit: 3,
        concurrency: 2,
        ..Profile::default()
    };
    let toml = toml::to_string(&profile).unwrap();
    let back: Profile = toml::from_str(&toml).unwrap();
    assert_eq!(back, profile);
}

#[test]
fn partial_toml_fills_in_defaults() {
    let partial: Profile = toml::from_str("pool_limit = 5\n").unwrap();
    assert_eq!(partial.pool_limit, 5);
    assert_eq!(partial.concurrency, Profile::default().concurrency);
}
