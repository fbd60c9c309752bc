//! The outbound half of a connection, abstracted away from any particular
//! transport so the core never has to know about WebSockets, axum, or
//! anything else transport-specific.

use async_trait::async_trait;
use protocol::ServerMessage;

/// A failure writing to a subscriber's outbound sink.
#[derive(Debug, thiserror::Error)]
#[error("sink send failed: {0}")]
pub struct SinkError(pub String);

/// The outbound message sink of one connection.
///
/// Implementations carry a bounded write timeout internally — the core
/// only requires that a failed or timed-out send surfaces as
/// [`SinkError`] rather than blocking forever.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    /// Sends one framed message to this connection's client.
    async fn send(&self, message: ServerMessage) -> Result<(), SinkError>;

    /// Best-effort close, used when this connection is superseded by a
    /// newer one for the same player, or scheduled for disconnect after a
    /// failed send. Never fails outwardly — a close that can't complete
    /// cleanly is still a close.
    async fn close(&self);
}
