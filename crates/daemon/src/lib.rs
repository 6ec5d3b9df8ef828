// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wardend: the multi-tenant daemon host (C0, §4.9). Binds one
//! [`warden_engine::Engine`] per configured application, loads the layered
//! TOML configuration that describes those applications, and bridges
//! incoming worker connections to each engine's handshake registry.
//!
//! This crate owns none of the core hosting logic (§1: queue, pool, state
//! machine, balancer all live in `warden-engine`); it is deliberately a
//! thin binding layer, per §2.1's "the shell is explicitly allowed to be
//! small relative to the core."

pub mod config;
pub mod listener;
pub mod logging;
pub mod registry;

pub use config::{ConfigError, DaemonConfig};
pub use listener::ListenError;
pub use registry::{AppEngine, Registry};
