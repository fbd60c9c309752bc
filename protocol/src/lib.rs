//! The wire envelope shared between the game server and its clients.
//!
//! Both directions use a self-describing, tagged JSON envelope rather than
//! a fixed binary layout: the server is long-lived and the set of
//! game-specific payloads it carries (`Intent::data`, `Tick::state`) is
//! defined by whatever game-logic module is loaded, so the envelope only
//! fixes the shape the framework itself is responsible for.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message sent from a client to the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe the sending connection to a zone, replacing any prior
    /// subscription.
    Subscribe {
        /// The zone to subscribe to.
        zone_id: i64,
    },
    /// Submit an opaque intent targeting the connection's currently
    /// subscribed zone.
    Intent {
        /// The game-defined payload. The framework never inspects this.
        data: Value,
    },
}

/// A message sent from the server to a client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledges a successful `subscribe`.
    Subscribed {
        /// The zone the connection is now subscribed to.
        zone_id: i64,
    },
    /// Acknowledges a durably enqueued intent. Sent only after the intent
    /// has been placed in the zone's intent queue.
    IntentReceived,
    /// One tick's worth of filtered state for this subscriber.
    Tick {
        /// The framework-wide monotonic tick counter.
        tick_number: u64,
        /// Whatever `GameLogic::get_player_state` returned for this
        /// subscriber, this tick. Shape is module-defined.
        state: Value,
    },
    /// A non-fatal error report. The connection is not closed because of
    /// this message alone.
    Error {
        /// Human-readable description of what went wrong.
        message: String,
    },
}
