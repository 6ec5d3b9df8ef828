// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignment (§4.7): the handoff of one `PendingItem` onto a chosen
//! worker's session. Injects the channel, sends `invoke`, then spawns the
//! forwarding task that pumps the client's outgoing chunks onto the wire
//! until the client side closes or the session rejects the write.
//!
//! The [`ChannelHandle`](crate::channel::ChannelHandle) for this invocation
//! was already handed to the caller back in `Engine::enqueue`; `assign`
//! only wires up the worker side and reports the allocated id so the
//! engine can track which worker is serving which channel.

use crate::queue::PendingItem;
use crate::session::Session;
use std::sync::Arc;
use std::time::Instant;
use warden_core::ChannelId;

/// Injects `item` onto `session`: allocates a channel, sends the worker an
/// `invoke` frame for `item.event.name`, and spawns a task that forwards
/// `item.from_client` onto the session for the life of the invocation. That
/// task exits once the client side sends a terminal message or its sender
/// is dropped; a message arriving after a terminal one (a caller bug) is
/// never observed, since `from_client` is exhausted by then.
///
/// Returns the channel id the worker now owns, for the engine's own
/// worker-load bookkeeping.
pub async fn assign(session: Arc<Session>, mut item: PendingItem, now: Instant) -> ChannelId {
    let id = session.inject(item.to_client, now);

    if let Err(e) = session.send_invoke(id, item.event.name.clone()).await {
        tracing::warn!(%id, error = %e, "failed to send invoke, worker session already gone");
        return id;
    }

    tokio::spawn(async move {
        while let Some(message) = item.from_client.recv().await {
            let terminal = message.is_terminal();
            if let Err(e) = session.send_client_message(id, message).await {
                tracing::debug!(%id, error = %e, "dropping client message, session gone");
                return;
            }
            if terminal {
                return;
            }
        }
    });

    id
}

#[cfg(test)]
#[path = "assign_tests.rs"]
mod tests;
