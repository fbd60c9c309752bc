use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{ConnectionId, PlayerId, ZoneId};

/// An opaque player-originated command targeting one zone.
///
/// Created on ingress, buffered in that zone's intent queue, and drained
/// at most once — at the next tick of that zone — after which it is
/// discarded. The framework never inspects `body`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// The player who submitted this intent.
    pub player_id: PlayerId,
    /// The connection it arrived on, kept for provenance only.
    pub connection_id: ConnectionId,
    /// The zone this intent targets.
    pub zone_id: ZoneId,
    /// The game-defined payload.
    pub body: Value,
}
