use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_model::{Entity, EntityDeltas, Zone, ZoneId};
use sqlx::any::{Any, AnyPool};
use sqlx::{Row, Transaction};

use persistence_api::{Gateway, PersistenceError, ZoneSession};

use crate::error::map_sqlx_error;

/// A production [`Gateway`] over `sqlx::AnyPool` — SQLite in tests and
/// development, Postgres or MySQL in production, with no code change:
/// the gateway contract only ever asks for atomic multi-row writes
/// within one zone, unique zone names, and snapshot reads inside a
/// transaction, which every `sqlx` driver under `Any` provides.
pub struct SqlxGateway {
    pool: AnyPool,
}

impl SqlxGateway {
    /// Wraps an already-connected pool. Callers are responsible for
    /// having installed the driver (`sqlx::any::install_default_drivers`)
    /// and for running the schema migration from the schema this crate
    /// was written against.
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

fn row_to_zone(row: &sqlx::any::AnyRow) -> Result<Zone, PersistenceError> {
    Ok(Zone {
        id: ZoneId(row.try_get("id").map_err(map_sqlx_error)?),
        name: row.try_get("name").map_err(map_sqlx_error)?,
        width: row.try_get("width").map_err(map_sqlx_error)?,
        height: row.try_get("height").map_err(map_sqlx_error)?,
        metadata: row.try_get("metadata").map_err(map_sqlx_error)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_error)?,
    })
}

fn row_to_entity(row: &sqlx::any::AnyRow) -> Result<Entity, PersistenceError> {
    Ok(Entity {
        id: game_model::EntityId(row.try_get("id").map_err(map_sqlx_error)?),
        zone_id: ZoneId(row.try_get("zone_id").map_err(map_sqlx_error)?),
        x: row.try_get("x").map_err(map_sqlx_error)?,
        y: row.try_get("y").map_err(map_sqlx_error)?,
        width: row.try_get("width").map_err(map_sqlx_error)?,
        height: row.try_get("height").map_err(map_sqlx_error)?,
        metadata: row.try_get("metadata").map_err(map_sqlx_error)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_error)?,
    })
}

#[async_trait]
impl Gateway for SqlxGateway {
    async fn begin_zone_session(
        &self,
        zone_id: ZoneId,
    ) -> Result<Box<dyn ZoneSession>, PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let exists = sqlx::query("SELECT id FROM zones WHERE id = ?")
            .bind(zone_id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if exists.is_none() {
            return Err(PersistenceError::NotFound(format!("{zone_id}")));
        }
        Ok(Box::new(SqlxZoneSession { zone_id, tx: Some(tx) }))
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
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let now: DateTime<Utc> = Utc::now();
        let id_row = sqlx::query("SELECT COALESCE(MAX(id), 0) + 1 AS next_id FROM zones")
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let id: i64 = id_row.try_get("next_id").map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO zones (id, name, width, height, metadata, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(width)
        .bind(height)
        .bind(metadata.clone())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(Zone {
            id: ZoneId(id),
            name: name.to_string(),
            width,
            height,
            metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

struct SqlxZoneSession {
    zone_id: ZoneId,
    tx: Option<Transaction<'static, Any>>,
}

impl SqlxZoneSession {
    fn tx_mut(&mut self) -> Result<&mut Transaction<'static, Any>, PersistenceError> {
        self.tx
            .as_mut()
            .ok_or_else(|| PersistenceError::Fatal("session already closed".to_string()))
    }
}

#[async_trait]
impl ZoneSession for SqlxZoneSession {
    async fn load_zone(&mut self) -> Result<Zone, PersistenceError> {
        let zone_id = self.zone_id;
        let tx = self.tx_mut()?;
        let row = sqlx::query("SELECT * FROM zones WHERE id = ?")
            .bind(zone_id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| PersistenceError::NotFound(format!("{zone_id}")))?;
        row_to_zone(&row)
    }

    async fn list_entities(&mut self) -> Result<Vec<Entity>, PersistenceError> {
        let zone_id = self.zone_id;
        let tx = self.tx_mut()?;
        let rows = sqlx::query("SELECT * FROM entities WHERE zone_id = ?")
            .bind(zone_id.0)
            .fetch_all(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(row_to_entity).collect()
    }

    async fn apply_deltas(
        &mut self,
        deltas: &EntityDeltas,
    ) -> Result<Vec<Entity>, PersistenceError> {
        let zone_id = self.zone_id;
        let now: DateTime<Utc> = Utc::now();
        let tx = self.tx_mut()?;

        // Entity bounds are checked against the zone's own dimensions,
        // read inside this same transaction, so a concurrent zone resize
        // (were one ever added) could never be raced against.
        let zone_row = sqlx::query("SELECT width, height FROM zones WHERE id = ?")
            .bind(zone_id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| PersistenceError::NotFound(format!("{zone_id}")))?;
        let zone_width: i32 = zone_row.try_get("width").map_err(map_sqlx_error)?;
        let zone_height: i32 = zone_row.try_get("height").map_err(map_sqlx_error)?;

        // Ids come from the backend's own auto-increment column rather than
        // a hand-computed MAX(id)+1: two zones ticking concurrently each
        // hold their own transaction and would otherwise race to read the
        // same MAX(id) before either commits, colliding on the id they both
        // assign.
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
            let result = sqlx::query(
                "INSERT INTO entities \
                 (zone_id, x, y, width, height, metadata, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(zone_id.0)
            .bind(create.x)
            .bind(create.y)
            .bind(create.width)
            .bind(create.height)
            .bind(create.metadata.clone())
            .bind(now)
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;
            let id = game_model::EntityId(result.last_insert_id().ok_or_else(|| {
                PersistenceError::Fatal(
                    "backend did not report a last-insert id for the new entity".to_string(),
                )
            })?);
            created.push(Entity {
                id,
                zone_id,
                x: create.x,
                y: create.y,
                width: create.width,
                height: create.height,
                metadata: create.metadata.clone(),
                created_at: now,
                updated_at: now,
            });
        }

        for update in &deltas.updates {
            if update.x < 0
                || update.y < 0
                || update.x + update.width > zone_width
                || update.y + update.height > zone_height
            {
                return Err(PersistenceError::Conflict(
                    "entity update out of zone bounds".to_string(),
                ));
            }
            if let Some(metadata) = &update.metadata {
                sqlx::query(
                    "UPDATE entities SET x = ?, y = ?, width = ?, height = ?, metadata = ?, \
                     updated_at = ? WHERE id = ? AND zone_id = ?",
                )
                .bind(update.x)
                .bind(update.y)
                .bind(update.width)
                .bind(update.height)
                .bind(metadata.clone())
                .bind(now)
                .bind(update.id.0)
                .bind(zone_id.0)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
            } else {
                sqlx::query(
                    "UPDATE entities SET x = ?, y = ?, width = ?, height = ?, updated_at = ? \
                     WHERE id = ? AND zone_id = ?",
                )
                .bind(update.x)
                .bind(update.y)
                .bind(update.width)
                .bind(update.height)
                .bind(now)
                .bind(update.id.0)
                .bind(zone_id.0)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
            }
        }

        for delete in &deltas.deletes {
            sqlx::query("DELETE FROM entities WHERE id = ? AND zone_id = ?")
                .bind(delete.0)
                .bind(zone_id.0)
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        Ok(created)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), PersistenceError> {
        let tx = self.tx.take().ok_or_else(|| {
            PersistenceError::Fatal("session already closed".to_string())
        })?;
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), PersistenceError> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        tx.rollback().await.map_err(map_sqlx_error)
    }
}
