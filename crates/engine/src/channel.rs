// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel (C6, §4.5): one bidirectional RPC stream multiplexed over a
//! worker's session, carrying exactly one client invocation. The two
//! directions close independently; only once both have closed does the
//! channel leave the session's map.

use crate::error::ChannelError;
use std::time::Instant;
use tokio::sync::mpsc;
use warden_core::{ChannelId, ErrorCode, WorkerId};

/// A message flowing in either direction of a channel: request chunks from
/// the client towards the worker, or response chunks from the worker back
/// to the client. Both directions share this vocabulary (§4.5).
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Chunk(Vec<u8>),
    Choke,
    Error { code: ErrorCode, reason: String },
}

impl ChannelMessage {
    /// Whether delivering this message closes the direction it travels on.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelMessage::Choke | ChannelMessage::Error { .. })
    }
}

/// Sender into which the engine (or a channel's peer) delivers messages.
pub type MessageSender = mpsc::UnboundedSender<ChannelMessage>;
pub type MessageReceiver = mpsc::UnboundedReceiver<ChannelMessage>;

/// Returned by `Engine::enqueue` (§4.1): the handle through which the
/// caller pushes request chunks towards the worker, mirroring the worker's
/// response stream delivered on the `upstream` sender supplied at enqueue
/// time.
pub struct ChannelHandle {
    pub(crate) id: ChannelId,
    pub(crate) to_worker: MessageSender,
}

impl ChannelHandle {
    pub(crate) fn new(id: ChannelId, to_worker: MessageSender) -> Self {
        Self { id, to_worker }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn push_chunk(&self, bytes: Vec<u8>) -> Result<(), ChannelError> {
        self.to_worker
            .send(ChannelMessage::Chunk(bytes))
            .map_err(|_| ChannelError::UpstreamGone)
    }

    pub fn choke(&self) -> Result<(), ChannelError> {
        self.to_worker
            .send(ChannelMessage::Choke)
            .map_err(|_| ChannelError::UpstreamGone)
    }

    pub fn error(&self, code: ErrorCode, reason: impl Into<String>) -> Result<(), ChannelError> {
        self.to_worker
            .send(ChannelMessage::Error {
                code,
                reason: reason.into(),
            })
            .map_err(|_| ChannelError::UpstreamGone)
    }
}

/// Which directions of a channel have closed (§4.5's close bitmask).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseBits {
    /// The client -> worker direction has sent its terminal message.
    pub client_closed: bool,
    /// The worker -> client direction has sent its terminal message.
    pub worker_closed: bool,
}

impl CloseBits {
    pub fn both_closed(self) -> bool {
        self.client_closed && self.worker_closed
    }
}

/// One live entry in a `Session`'s channel map: the client-facing sender
/// the worker's frames are relayed onto, plus bookkeeping for §4.5/§4.7.
pub struct ActiveChannel {
    pub id: ChannelId,
    pub worker_id: WorkerId,
    pub to_client: MessageSender,
    pub close: CloseBits,
    pub started_at: Instant,
}

impl ActiveChannel {
    pub fn new(id: ChannelId, worker_id: WorkerId, to_client: MessageSender, now: Instant) -> Self {
        Self {
            id,
            worker_id,
            to_client,
            close: CloseBits::default(),
            started_at: now,
        }
    }

    /// Delivers one worker -> client message. Marks the direction closed if
    /// the message is terminal. Returns whether the channel is now fully
    /// closed and should be reaped.
    pub fn deliver_from_worker(&mut self, message: ChannelMessage) -> Result<bool, ChannelError> {
        let terminal = message.is_terminal();
        self.to_client
            .send(message)
            .map_err(|_| ChannelError::UpstreamGone)?;
        if terminal {
            self.close.worker_closed = true;
        }
        Ok(self.close.both_closed())
    }

    /// Records that the client -> worker direction closed (a choke/error
    /// frame was forwarded onto the session). Returns whether the channel
    /// is now fully closed.
    pub fn mark_client_closed(&mut self) -> bool {
        self.close.client_closed = true;
        self.close.both_closed()
    }

    /// Forces both directions closed, e.g. on session teardown (§4.4),
    /// delivering a `connection_lost` error to the client if still open.
    pub fn abort(&mut self, code: ErrorCode, reason: impl Into<String>) {
        if !self.close.worker_closed {
            let _ = self.to_client.send(ChannelMessage::Error {
                code,
                reason: reason.into(),
            });
        }
        self.close = CloseBits {
            client_closed: true,
            worker_closed: true,
        };
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
