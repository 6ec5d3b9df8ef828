// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered error taxonomy (§7): one `thiserror` enum per boundary, each
//! carrying the layer below it via `#[from]` rather than stringly-typed
//! text. `ErrorCode` (warden-core) is the wire-stable identifier every
//! variant maps to via [`AsErrorCode`].

use warden_core::ErrorCode;

/// Anything in this crate that ultimately resolves to a wire-stable code.
pub trait AsErrorCode {
    fn as_error_code(&self) -> ErrorCode;
}

/// Errors local to one channel (§4.5). Never propagate beyond the channel
/// that raised them.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel is already closed in this direction")]
    AlreadyClosed,

    #[error("client upstream receiver has been dropped")]
    UpstreamGone,

    #[error("invocation failed: {reason}")]
    InvocationFailed { code: ErrorCode, reason: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AsErrorCode for ChannelError {
    fn as_error_code(&self) -> ErrorCode {
        match self {
            ChannelError::AlreadyClosed | ChannelError::UpstreamGone => ErrorCode::InvocationFailed,
            ChannelError::InvocationFailed { code, .. } => *code,
            ChannelError::Session(e) => e.as_error_code(),
        }
    }
}

/// Errors at the session (transport) level (§4.4). Fan out to every channel
/// the session was carrying.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("framing error: {0}")]
    Frame(#[from] warden_adapters::FrameError),

    #[error("heartbeat timed out")]
    HeartbeatTimeout,

    #[error("connection lost")]
    ConnectionLost,

    #[error("channel {0} not found on this session")]
    UnknownChannel(u64),
}

impl AsErrorCode for SessionError {
    fn as_error_code(&self) -> ErrorCode {
        match self {
            SessionError::HeartbeatTimeout => ErrorCode::HeartbeatTimeout,
            SessionError::Frame(_) | SessionError::ConnectionLost | SessionError::UnknownChannel(_) => {
                ErrorCode::ConnectionLost
            }
        }
    }
}

/// Worker lifecycle errors (§4.3, §7). Each transitions the worker to a
/// terminal state and is recorded as the precipitating cause.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerError {
    #[error("spawn timed out")]
    SpawnTimeout,
    #[error("handshake timed out")]
    HandshakeTimeout,
    #[error("heartbeat timed out")]
    HeartbeatTimeout,
    #[error("seal timed out")]
    SealTimeout,
    #[error("terminate timed out")]
    TerminateTimeout,
    #[error("locator unavailable")]
    LocatorUnavailable,
    #[error("failed to spawn process: {0}")]
    SpawnFailed(String),
    #[error("connection lost")]
    ConnectionLost,
    #[error("worker committed suicide")]
    CommittedSuicide,
}

impl AsErrorCode for WorkerError {
    fn as_error_code(&self) -> ErrorCode {
        match self {
            WorkerError::SpawnTimeout => ErrorCode::SpawnTimeout,
            WorkerError::HandshakeTimeout => ErrorCode::HandshakeTimeout,
            WorkerError::HeartbeatTimeout => ErrorCode::HeartbeatTimeout,
            WorkerError::SealTimeout => ErrorCode::SealTimeout,
            WorkerError::TerminateTimeout => ErrorCode::TerminateTimeout,
            WorkerError::LocatorUnavailable => ErrorCode::LocatorUnavailable,
            WorkerError::SpawnFailed(_) => ErrorCode::SpawnFailed,
            WorkerError::ConnectionLost => ErrorCode::ConnectionLost,
            WorkerError::CommittedSuicide => ErrorCode::CommittedSuicide,
        }
    }
}

/// Engine-level, client-visible errors (§7) plus internal invariant
/// violations, which are fatal to the engine rather than to one caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("queue is full")]
    QueueFull,
    #[error("engine has been shut down")]
    EngineStopped,
    #[error("deadline expired before assignment")]
    DeadlineExpired,
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl AsErrorCode for EngineError {
    fn as_error_code(&self) -> ErrorCode {
        match self {
            EngineError::QueueFull => ErrorCode::QueueFull,
            EngineError::EngineStopped => ErrorCode::EngineStopped,
            EngineError::DeadlineExpired => ErrorCode::DeadlineExpired,
            EngineError::Worker(e) => e.as_error_code(),
            EngineError::Channel(e) => e.as_error_code(),
            EngineError::Invariant(_) => ErrorCode::InvocationFailed,
        }
    }
}
