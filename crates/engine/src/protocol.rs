// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker control and RPC protocol (§6). Message ids are part of the wire
//! contract and must not be reassigned; both enums encode their `id` via
//! `#[serde(tag = "id")]` so the msgpack payload carries it explicitly
//! rather than relying on map key order.

use serde::{Deserialize, Serialize};

/// The fixed control channel every session carries in addition to its
/// dynamically allocated RPC channels (§4.4).
pub const CONTROL_CHANNEL: u64 = 0;

/// Control-plane messages (§6 table), exchanged on [`CONTROL_CHANNEL`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "id")]
pub enum ControlMessage {
    #[serde(rename = "1")]
    Handshake { uuid: String },
    #[serde(rename = "2")]
    Ping,
    #[serde(rename = "3")]
    Pong,
    #[serde(rename = "4")]
    Terminate { code: u32, reason: String },
    #[serde(rename = "5")]
    Terminated,
}

/// Per-channel RPC messages (§6), carried on any channel-id greater than
/// zero. `Invoke` opens a channel; `Error`/`Choke` close one direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "id")]
pub enum RpcMessage {
    #[serde(rename = "invoke")]
    Invoke { event: String },
    #[serde(rename = "chunk")]
    Chunk { bytes: Vec<u8> },
    #[serde(rename = "error")]
    Error { code: u32, reason: String },
    #[serde(rename = "choke")]
    Choke,
}

/// One frame on the wire: which channel it belongs to, plus its payload.
/// The channel-id is framed alongside the message rather than inside it so
/// the session reader can demultiplex without deserializing the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub channel: u64,
    pub message: T,
}

impl<T> Envelope<T> {
    pub fn new(channel: u64, message: T) -> Self {
        Self { channel, message }
    }
}

/// Either half of the protocol, as actually carried on the wire: a session
/// mixes control frames (channel 0) and RPC frames (any other channel) on
/// the same framed stream, so the reader must be able to decode either
/// without knowing in advance which it is about to see.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FramePayload {
    Control(ControlMessage),
    Rpc(RpcMessage),
}

pub type Frame = Envelope<FramePayload>;

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
