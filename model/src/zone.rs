use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ZoneId;

/// A uniquely named rectangular simulation region.
///
/// Zones are created and destroyed out of band through the administrative
/// path; the core never moves or resizes one. `name` is enforced unique by
/// the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Stable identifier, assigned by the persistence gateway on creation.
    pub id: ZoneId,
    /// Globally unique display name.
    pub name: String,
    /// Width of the zone in grid cells. Always positive.
    pub width: i32,
    /// Height of the zone in grid cells. Always positive.
    pub height: i32,
    /// Opaque, framework-uninterpreted metadata.
    #[serde(with = "serde_bytes_compat")]
    pub metadata: Vec<u8>,
    /// Creation timestamp, set once by the gateway.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Zone {
    /// Checks whether a footprint of `(width, height)` placed at `(x, y)`
    /// lies entirely within this zone's bounds.
    pub fn contains_footprint(&self, x: i32, y: i32, width: i32, height: i32) -> bool {
        x >= 0 && y >= 0 && x + width <= self.width && y + height <= self.height
    }
}

/// Opaque metadata is carried as plain bytes. Using a dedicated module
/// keeps the choice isolated should a more compact byte-array encoding be
/// needed later, without touching every call site.
pub(crate) mod serde_bytes_compat {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serde_bytes::serialize(bytes, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        serde_bytes::deserialize(deserializer)
    }
}
