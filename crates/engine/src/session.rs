// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session (C5, §4.4): one framed transport to a worker, multiplexing the
//! control channel (0) and any number of RPC channels. The reader task
//! (`Session::run_reader`) demultiplexes; everything else serializes
//! writes and mutates the channel map under a lock, matching the
//! reference architecture's locked-map style rather than a hand-rolled
//! actor mailbox (see DESIGN.md).

use crate::channel::{ActiveChannel, ChannelMessage, MessageSender};
use crate::error::SessionError;
use crate::protocol::{ControlMessage, Frame, FramePayload, RpcMessage, CONTROL_CHANNEL};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use warden_adapters::framing;
use warden_core::{ChannelId, ChannelIdAllocator, WorkerId};

/// Events the session's reader (or heartbeat timer) raises for the worker
/// supervisor to act on; the session itself never transitions worker state.
#[derive(Debug)]
pub enum SessionEvent {
    Pong,
    Terminated,
    Disconnected(SessionError),
}

type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;
type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// One worker's live transport. Shared between whatever spawned the reader
/// task and the supervisor that injects channels onto it.
pub struct Session {
    worker_id: WorkerId,
    writer: tokio::sync::Mutex<BoxedWriter>,
    channels: Mutex<HashMap<ChannelId, ActiveChannel>>,
    allocator: ChannelIdAllocator,
    events: mpsc::UnboundedSender<SessionEvent>,
    write_timeout: std::time::Duration,
}

impl Session {
    pub fn new(
        worker_id: WorkerId,
        writer: BoxedWriter,
        events: mpsc::UnboundedSender<SessionEvent>,
        write_timeout: std::time::Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            worker_id,
            writer: tokio::sync::Mutex::new(writer),
            channels: Mutex::new(HashMap::new()),
            allocator: ChannelIdAllocator::new(),
            events,
            write_timeout,
        })
    }

    /// Allocates a fresh channel-id and registers its client-facing sender
    /// (§4.7 step 1-2). Returns the id the caller should `invoke` on.
    pub fn inject(&self, to_client: MessageSender, now: Instant) -> ChannelId {
        let id = self.allocator.alloc();
        let channel = ActiveChannel::new(id, self.worker_id.clone(), to_client, now);
        self.channels.lock().insert(id, channel);
        id
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    async fn write_frame(&self, frame: Frame) -> Result<(), SessionError> {
        let payload = framing::encode(&frame)?;
        let mut writer = self.writer.lock().await;
        tokio::time::timeout(self.write_timeout, framing::write_frame(&mut *writer, &payload))
            .await
            .map_err(|_| SessionError::ConnectionLost)??;
        Ok(())
    }

    pub async fn send_control(&self, message: ControlMessage) -> Result<(), SessionError> {
        self.write_frame(Frame::new(CONTROL_CHANNEL, FramePayload::Control(message)))
            .await
    }

    pub async fn send_invoke(&self, channel: ChannelId, event: String) -> Result<(), SessionError> {
        self.write_frame(Frame::new(channel.0, FramePayload::Rpc(RpcMessage::Invoke { event })))
            .await
    }

    /// Forwards one client -> worker message onto the session, marking the
    /// channel's client direction closed if it was terminal, and reaping
    /// the channel if the worker side had already closed (§4.7 step 4-5).
    pub async fn send_client_message(&self, channel: ChannelId, message: ChannelMessage) -> Result<(), SessionError> {
        let rpc = match &message {
            ChannelMessage::Chunk(bytes) => RpcMessage::Chunk { bytes: bytes.clone() },
            ChannelMessage::Choke => RpcMessage::Choke,
            ChannelMessage::Error { code, reason } => RpcMessage::Error {
                code: *code as u32,
                reason: reason.clone(),
            },
        };
        self.write_frame(Frame::new(channel.0, FramePayload::Rpc(rpc))).await?;

        if message.is_terminal() {
            let fully_closed = {
                let mut channels = self.channels.lock();
                match channels.get_mut(&channel) {
                    Some(active) => active.mark_client_closed(),
                    None => return Err(SessionError::UnknownChannel(channel.0)),
                }
            };
            if fully_closed {
                self.channels.lock().remove(&channel);
            }
        }
        Ok(())
    }

    /// Detaches every open channel with `connection_lost`, e.g. on reader
    /// EOF/error (§4.4). Idempotent: a second call sees an empty map.
    pub fn detach_all(&self, reason: &str) {
        let mut channels = self.channels.lock();
        for (_, mut active) in channels.drain() {
            active.abort(warden_core::ErrorCode::ConnectionLost, reason.to_string());
        }
    }

    /// Drives the reader side: decodes frames until EOF/error, routing
    /// control frames to `events` and RPC frames to the matching
    /// `ActiveChannel`. Consumes `self` by `Arc` so it can run as an
    /// independently spawned task alongside the handle that owns writes.
    pub async fn run_reader(self: Arc<Self>, mut reader: BoxedReader) {
        loop {
            let bytes = match framing::read_frame(&mut reader).await {
                Ok(bytes) => bytes,
                Err(warden_adapters::FrameError::ConnectionClosed) => {
                    self.detach_all("connection closed");
                    let _ = self.events.send(SessionEvent::Disconnected(SessionError::ConnectionLost));
                    return;
                }
                Err(e) => {
                    tracing::warn!(worker_id = %self.worker_id, error = %e, "session read error");
                    self.detach_all("read error");
                    let _ = self.events.send(SessionEvent::Disconnected(SessionError::Frame(e)));
                    return;
                }
            };

            let frame: Frame = match framing::decode(&bytes) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(worker_id = %self.worker_id, error = %e, "dropping undecodable frame");
                    continue;
                }
            };

            self.dispatch_frame(frame).await;
        }
    }

    async fn dispatch_frame(&self, frame: Frame) {
        match frame.message {
            FramePayload::Control(ControlMessage::Pong) => {
                let _ = self.events.send(SessionEvent::Pong);
            }
            FramePayload::Control(ControlMessage::Terminated) => {
                let _ = self.events.send(SessionEvent::Terminated);
            }
            FramePayload::Control(other) => {
                tracing::trace!(worker_id = %self.worker_id, ?other, "ignoring unexpected control frame from worker");
            }
            FramePayload::Rpc(rpc) => self.route_rpc(ChannelId(frame.channel), rpc),
        }
    }

    fn route_rpc(&self, channel_id: ChannelId, rpc: RpcMessage) {
        let message = match rpc {
            RpcMessage::Chunk { bytes } => ChannelMessage::Chunk(bytes),
            RpcMessage::Choke => ChannelMessage::Choke,
            RpcMessage::Error { code, reason } => ChannelMessage::Error {
                code: warden_core::ErrorCode::InvocationFailed,
                reason: format!("{reason} (worker code {code})"),
            },
            RpcMessage::Invoke { .. } => {
                tracing::trace!(worker_id = %self.worker_id, %channel_id, "ignoring invoke from worker, not a valid direction");
                return;
            }
        };

        let fully_closed = {
            let mut channels = self.channels.lock();
            match channels.get_mut(&channel_id) {
                Some(active) => match active.deliver_from_worker(message) {
                    Ok(closed) => closed,
                    Err(_) => {
                        tracing::debug!(worker_id = %self.worker_id, %channel_id, "client upstream gone, dropping channel");
                        true
                    }
                },
                None => {
                    tracing::trace!(worker_id = %self.worker_id, %channel_id, "frame for unknown channel, dropped");
                    return;
                }
            }
        };
        if fully_closed {
            self.channels.lock().remove(&channel_id);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
