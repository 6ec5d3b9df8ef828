// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-engine: the per-application runtime core (§4).
//!
//! [`Engine`] (C1) is the facade every other crate talks to. It composes
//! the [`queue`] (C2), the [`worker`] pool (C3/C4), [`session`] transports
//! (C5), [`channel`]s (C6), the [`balancer`] (C7), and the stdout
//! [`fetcher`] (C8) behind one per-application handle.

pub mod assign;
pub mod balancer;
pub mod channel;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod worker;

pub use channel::{ChannelHandle, ChannelMessage};
pub use engine::{Engine, EngineInfo, ShutdownMode, WorkerSummary};
pub use error::{AsErrorCode, ChannelError, EngineError, SessionError, WorkerError};
pub use worker::{HandshakeRegistry, WorkerCommand, WorkerMachine, WorkerState, WorkerStats};
