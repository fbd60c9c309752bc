//! Thin administrative surface: pause/resume/step on the tick engine,
//! and read-only zone/registry inspection routed through the same
//! transactional read path the tick pipeline itself uses — the admin
//! surface never gets a shortcut around the gateway's transaction
//! scoping just because it's a trusted caller.

use std::sync::Arc;

use game_model::{ConnectionId, Entity, PlayerId, Zone, ZoneId};
use persistence_api::PersistenceError;

use crate::game_logic::FrameworkHandle;
use crate::registry::SubscriptionRegistry;
use crate::tick_engine::{EngineState, TickEngine};

/// A subscriber entry in an administrative registry snapshot.
#[derive(Debug, Clone)]
pub struct SubscriberSnapshot {
    pub player_id: PlayerId,
    pub connection_id: ConnectionId,
}

/// Read-only and control-plane operations for operators, gated
/// upstream by an `AdminAuth` implementation the bootstrap binary
/// supplies.
pub struct AdminHandle {
    engine: Arc<TickEngine>,
    framework: FrameworkHandle,
    registry: Arc<SubscriptionRegistry>,
}

impl AdminHandle {
    pub fn new(
        engine: Arc<TickEngine>,
        framework: FrameworkHandle,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        Self {
            engine,
            framework,
            registry,
        }
    }

    /// Pauses the tick engine.
    pub async fn pause(&self) {
        self.engine.pause().await;
    }

    /// Resumes the tick engine.
    pub async fn resume(&self) {
        self.engine.resume().await;
    }

    /// Requests a single tick while paused.
    pub async fn step(&self) {
        self.engine.step().await;
    }

    /// The engine's current run state.
    pub async fn engine_state(&self) -> EngineState {
        self.engine.state().await
    }

    /// The current process-wide tick counter.
    pub fn tick_number(&self) -> u64 {
        self.engine.tick_number()
    }

    /// Reads a zone's attributes through the same read path the tick
    /// pipeline uses.
    pub async fn inspect_zone(&self, zone_id: ZoneId) -> Result<Zone, PersistenceError> {
        self.framework.read_zone(zone_id).await
    }

    /// Reads a zone's current entities as a snapshot.
    pub async fn inspect_entities(&self, zone_id: ZoneId) -> Result<Vec<Entity>, PersistenceError> {
        self.framework.read_entities(zone_id).await
    }

    /// A snapshot of `zone_id`'s current subscribers.
    pub async fn inspect_subscribers(&self, zone_id: ZoneId) -> Vec<SubscriberSnapshot> {
        self.registry
            .subscribers_of(zone_id)
            .await
            .into_iter()
            .map(|(player_id, connection_id, _sink)| SubscriberSnapshot {
                player_id,
                connection_id,
            })
            .collect()
    }

    /// A snapshot of every zone with at least one subscriber.
    pub async fn inspect_subscribed_zones(&self) -> Vec<ZoneId> {
        self.registry.subscribed_zone_ids().await
    }
}
