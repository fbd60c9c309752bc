use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, EntityDeltas};

/// Returned by the game-logic module for one (zone, tick).
///
/// `extras` must never carry an entity snapshot — entity authority
/// belongs to the framework, which builds the authoritative snapshot
/// itself from `deltas` (see [`BaseState`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickResult {
    /// Entity creates/updates/deletes to apply.
    pub deltas: EntityDeltas,
    /// Opaque module-defined payload, fed into `base_state.extras`.
    pub extras: Value,
}

/// The framework-composed per-zone, per-tick state handed to
/// `GameLogic::get_player_state` for per-subscriber filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseState {
    /// The process-wide monotonic tick counter.
    pub tick_number: u64,
    /// The authoritative post-apply entity list for this zone.
    pub entities: Vec<Entity>,
    /// The module's opaque extras for this tick.
    pub extras: Value,
}
