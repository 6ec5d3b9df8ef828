// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-adapters: the two external seams the engine core depends on
//! (§6 Isolate interface, §4.4 Session transport) plus msgpack wire framing.
//!
//! Everything here is an implementation detail the engine is deliberately
//! generic over: swap [`isolate::ProcessIsolate`] for a container driver, or
//! the framing helpers for a different socket type, and `warden-engine`
//! does not change.

pub mod framing;
pub mod isolate;

pub use framing::{FrameError, MAX_FRAME_SIZE};
pub use isolate::{Isolate, IsolateError, IsolateHandle, SpawnRequest};

#[cfg(any(test, feature = "test-support"))]
pub use isolate::fake::{FakeHandle, FakeIsolate, FakeIsolateScript};
