//! The pluggable game-logic contract: the one trait every zone's rule
//! resolution and per-player redaction goes through.
//!
//! A single trait, a handful of lifecycle methods, an implementation
//! loaded once and held behind an `Arc<dyn GameLogic>` — the same shape
//! `game-interface`'s `GameStateInterface` has over its own pluggable
//! `Arc<dyn DbInterface>` backend (see DESIGN.md), re-scoped to this
//! framework's zones/ticks instead of that engine's rooms.

use async_trait::async_trait;
use game_model::{BaseState, Entity, Intent, PlayerId, TickResult, Zone, ZoneId};
use persistence_api::{Gateway, PersistenceError};
use std::sync::Arc;

use crate::error::GameLogicError;

/// The read-only capability set handed to [`GameLogic::on_init`].
///
/// Deliberately excludes write access: the contract only promises
/// entity authority through the deltas a module returns from `on_tick`,
/// never through side channels during initialization.
#[derive(Clone)]
pub struct FrameworkHandle {
    gateway: Arc<dyn Gateway>,
}

impl FrameworkHandle {
    /// Wraps a gateway into a read-only handle.
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Reads a zone's current attributes through the same transactional
    /// read path the tick pipeline uses — a scoped session opened and
    /// rolled back, never a bare untransacted lookup.
    pub async fn read_zone(&self, zone_id: ZoneId) -> Result<Zone, PersistenceError> {
        let mut session = self.gateway.begin_zone_session(zone_id).await?;
        let zone = session.load_zone().await?;
        session.rollback().await?;
        Ok(zone)
    }

    /// Reads a zone's current entities as a snapshot.
    pub async fn read_entities(&self, zone_id: ZoneId) -> Result<Vec<Entity>, PersistenceError> {
        let mut session = self.gateway.begin_zone_session(zone_id).await?;
        let entities = session.list_entities().await?;
        session.rollback().await?;
        Ok(entities)
    }
}

/// The polymorphic game-logic module.
///
/// Loaded once at startup and invoked only by the `GameLogicAdapter` —
/// nothing else in the framework calls a module method directly.
#[async_trait]
pub trait GameLogic: Send + Sync + 'static {
    /// One-time setup, called before the tick engine starts.
    async fn on_init(&self, framework: FrameworkHandle) -> Result<(), GameLogicError>;

    /// Resolves one zone's rules for one tick. The framework treats this
    /// as a pure function of its arguments; any side effects beyond the
    /// returned [`TickResult`] are not contracted.
    async fn on_tick(
        &self,
        zone_id: ZoneId,
        entities: &[Entity],
        intents: &[Intent],
        tick_number: u64,
    ) -> Result<TickResult, GameLogicError>;

    /// Per-subscriber redaction / fog-of-war. The sole place per-player
    /// visibility is enforced. Read-only with respect to simulation state
    /// by contract — the `&self` receiver lets the type system carry that
    /// promise instead of documentation alone. May be called concurrently
    /// for different subscribers and must tolerate that.
    fn get_player_state(
        &self,
        zone_id: ZoneId,
        player_id: PlayerId,
        base_state: &BaseState,
    ) -> Result<serde_json::Value, GameLogicError>;
}
