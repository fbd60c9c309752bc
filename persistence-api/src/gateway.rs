use async_trait::async_trait;
use game_model::{Entity, EntityDeltas, Zone, ZoneId};

use crate::error::PersistenceError;

/// A scoped transactional session over a single zone.
///
/// Acquisition (via [`Gateway::begin_zone_session`]) is paired with
/// guaranteed release: callers must end every session with exactly one of
/// [`ZoneSession::commit`] or [`ZoneSession::rollback`]. A rollback — or a
/// session dropped without either call — never affects sibling sessions
/// for other zones; there are no cross-zone transactions.
#[async_trait]
pub trait ZoneSession: Send {
    /// Loads this session's zone as it stands at the start of the
    /// transaction.
    async fn load_zone(&mut self) -> Result<Zone, PersistenceError>;

    /// Lists this zone's entities as they stand at the start of the
    /// transaction.
    async fn list_entities(&mut self) -> Result<Vec<Entity>, PersistenceError>;

    /// Applies a set of entity creates/updates/deletes. Does not commit —
    /// commit is a separate, explicit step at the zone-processing boundary.
    ///
    /// Returns the newly created entities, in `deltas.creates` order, with
    /// their gateway-assigned ids filled in. The snapshot builder merges
    /// these directly into the pre-tick entity list instead of re-reading
    /// the zone, so the post-apply snapshot never lags a tick behind.
    async fn apply_deltas(
        &mut self,
        deltas: &EntityDeltas,
    ) -> Result<Vec<Entity>, PersistenceError>;

    /// Commits all work performed in this session.
    async fn commit(self: Box<Self>) -> Result<(), PersistenceError>;

    /// Rolls back all work performed in this session. Never poisons any
    /// other zone's session.
    async fn rollback(self: Box<Self>) -> Result<(), PersistenceError>;
}

/// Transactional read/write access to zones and entities, scoped one zone
/// at a time.
///
/// Any transactional store with snapshot-read semantics can satisfy this
/// contract — the framework only relies on atomic multi-row writes within
/// a single zone, unique enforcement of zone names, and the ability to
/// read a consistent snapshot inside a transaction.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Opens a new transactional session scoped to `zone_id`.
    async fn begin_zone_session(
        &self,
        zone_id: ZoneId,
    ) -> Result<Box<dyn ZoneSession>, PersistenceError>;

    /// Creates a new zone. Administrative path only; never called by the
    /// tick pipeline. Returns [`PersistenceError::Conflict`] if `name` is
    /// already taken.
    async fn create_zone(
        &self,
        name: &str,
        width: i32,
        height: i32,
        metadata: Vec<u8>,
    ) -> Result<Zone, PersistenceError>;
}
