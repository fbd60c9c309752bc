use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use game_model::{Entity, EntityDeltas, Zone, ZoneId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::PersistenceError;
use crate::gateway::{Gateway, ZoneSession};

struct Store {
    zones: HashMap<ZoneId, Zone>,
    entities: HashMap<ZoneId, HashMap<game_model::EntityId, Entity>>,
    next_zone_id: i64,
    next_entity_id: i64,
}

/// A non-durable, in-process [`Gateway`] for tests and the fixture
/// game-logic examples. Not a production backend — see
/// `persistence-sqlx` for one.
///
/// Unlike the sqlx backend, a single global lock serializes every
/// transaction regardless of zone, trading the "zones proceed
/// independently" scalability contract for a trivially correct rollback
/// implementation. That trade is acceptable here because nothing but
/// tests ever constructs this type.
pub struct InMemoryGateway {
    store: Arc<Mutex<Store>>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Creates an empty gateway with no zones.
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store {
                zones: HashMap::new(),
                entities: HashMap::new(),
                next_zone_id: 1,
                next_entity_id: 1,
            })),
        }
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn begin_zone_session(
        &self,
        zone_id: ZoneId,
    ) -> Result<Box<dyn ZoneSession>, PersistenceError> {
        let guard = self.store.clone().lock_owned().await;
        if !guard.zones.contains_key(&zone_id) {
            return Err(PersistenceError::NotFound(format!("{zone_id}")));
        }
        let zone_snapshot = guard.zones.get(&zone_id).cloned();
        let entities_snapshot = guard.entities.get(&zone_id).cloned().unwrap_or_default();
        Ok(Box::new(InMemoryZoneSession {
            zone_id,
            guard,
            zone_snapshot,
            entities_snapshot,
        }))
    }

    async fn create_zone(
        &self,
        name: &str,
        width: i32,
        height: i32,
        metadata: Vec<u8>,
    ) -> Result<Zone, PersistenceError> {
        if width <= 0 || height <= 0 {
            return Err(PersistenceError::Conflict(
                "zone width and height must be positive".to_string(),
            ));
        }
        let mut store = self.store.lock().await;
        if store.zones.values().any(|z| z.name == name) {
            return Err(PersistenceError::Conflict(format!(
                "zone name {name} already exists"
            )));
        }
        let id = ZoneId(store.next_zone_id);
        store.next_zone_id += 1;
        let now = Utc::now();
        let zone = Zone {
            id,
            name: name.to_string(),
            width,
            height,
            metadata,
            created_at: now,
            updated_at: now,
        };
        store.zones.insert(id, zone.clone());
        store.entities.insert(id, HashMap::new());
        Ok(zone)
    }
}

struct InMemoryZoneSession {
    zone_id: ZoneId,
    guard: OwnedMutexGuard<Store>,
    /// Snapshot taken at session start, restored verbatim on rollback.
    zone_snapshot: Option<Zone>,
    entities_snapshot: HashMap<game_model::EntityId, Entity>,
}

#[async_trait]
impl ZoneSession for InMemoryZoneSession {
    async fn load_zone(&mut self) -> Result<Zone, PersistenceError> {
        self.guard
            .zones
            .get(&self.zone_id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(format!("{}", self.zone_id)))
    }

    async fn list_entities(&mut self) -> Result<Vec<Entity>, PersistenceError> {
        Ok(self
            .guard
            .entities
            .get(&self.zone_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn apply_deltas(
        &mut self,
        deltas: &EntityDeltas,
    ) -> Result<Vec<Entity>, PersistenceError> {
        let now = Utc::now();
        let zone_width = self
            .guard
            .zones
            .get(&self.zone_id)
            .map(|z| z.width)
            .unwrap_or(0);
        let zone_height = self
            .guard
            .zones
            .get(&self.zone_id)
            .map(|z| z.height)
            .unwrap_or(0);
        let mut created = Vec::with_capacity(deltas.creates.len());
        for create in &deltas.creates {
            if create.x < 0
                || create.y < 0
                || create.x + create.width > zone_width
                || create.y + create.height > zone_height
            {
                return Err(PersistenceError::Conflict(
                    "entity create out of zone bounds".to_string(),
                ));
            }
            let id = game_model::EntityId(self.guard.next_entity_id);
            self.guard.next_entity_id += 1;
            let entity = Entity {
                id,
                zone_id: self.zone_id,
                x: create.x,
                y: create.y,
                width: create.width,
                height: create.height,
                metadata: create.metadata.clone(),
                created_at: now,
                updated_at: now,
            };
            self.guard
                .entities
                .entry(self.zone_id)
                .or_default()
                .insert(id, entity.clone());
            created.push(entity);
        }

        let entities = self.guard.entities.entry(self.zone_id).or_default();
        for update in &deltas.updates {
            let Some(entity) = entities.get_mut(&update.id) else {
                return Err(PersistenceError::NotFound(format!("{}", update.id)));
            };
            if update.x < 0
                || update.y < 0
                || update.x + update.width > zone_width
                || update.y + update.height > zone_height
            {
                return Err(PersistenceError::Conflict(
                    "entity update out of zone bounds".to_string(),
                ));
            }
            entity.x = update.x;
            entity.y = update.y;
            entity.width = update.width;
            entity.height = update.height;
            if let Some(metadata) = &update.metadata {
                entity.metadata = metadata.clone();
            }
            entity.updated_at = now;
        }

        for delete in &deltas.deletes {
            entities.remove(delete);
        }

        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), PersistenceError> {
        // Changes were applied directly to the guarded store; dropping the
        // guard here releases the lock and keeps them.
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), PersistenceError> {
        if let Some(zone) = self.zone_snapshot.take() {
            self.guard.zones.insert(self.zone_id, zone);
        } else {
            self.guard.zones.remove(&self.zone_id);
        }
        self.guard
            .entities
            .insert(self.zone_id, std::mem::take(&mut self.entities_snapshot));
        Ok(())
    }
}
