use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, ZoneId};

/// A positioned object inside exactly one zone.
///
/// An entity belongs to its zone for its whole lifetime; moving it to a
/// different zone requires a delete in the old zone and a create in the
/// new one, never an in-place zone change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier, assigned by the persistence gateway on creation.
    pub id: EntityId,
    /// The zone this entity belongs to.
    pub zone_id: ZoneId,
    /// X position, in grid cells, within the owning zone.
    pub x: i32,
    /// Y position, in grid cells, within the owning zone.
    pub y: i32,
    /// Footprint width. Combined with `x`, must stay within zone bounds.
    pub width: i32,
    /// Footprint height. Combined with `y`, must stay within zone bounds.
    pub height: i32,
    /// Opaque, framework-uninterpreted metadata.
    #[serde(with = "crate::zone::serde_bytes_compat")]
    pub metadata: Vec<u8>,
    /// Creation timestamp, set once by the gateway.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp, bumped on every applied update.
    pub updated_at: DateTime<Utc>,
}

/// A single entity creation requested by a [`crate::tick::TickResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCreate {
    /// Position and footprint of the new entity.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Opaque metadata to store with the new entity.
    pub metadata: Vec<u8>,
}

/// A single entity field update requested by a [`crate::tick::TickResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityUpdate {
    /// Which entity to update.
    pub id: EntityId,
    /// New position/footprint, if changed.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// New metadata, if changed. `None` leaves metadata untouched.
    pub metadata: Option<Vec<u8>>,
}

/// The three delta sets a game-logic module returns for one (zone, tick).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDeltas {
    /// New entities to create in the zone.
    pub creates: Vec<EntityCreate>,
    /// Existing entities to update.
    pub updates: Vec<EntityUpdate>,
    /// Existing entities to delete, by id.
    pub deletes: Vec<EntityId>,
}

impl EntityDeltas {
    /// True if this delta set changes nothing.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}
