//! Framework-owned domain types shared by the core, the persistence
//! gateway, and any game-logic module: zones, entities, intents, and the
//! tick result/base-state pair. Nothing in this crate talks to a network
//! or a database — it only describes the shapes those layers exchange.

pub mod entity;
pub mod ids;
pub mod intent;
pub mod tick;
pub mod zone;

pub use entity::{Entity, EntityCreate, EntityDeltas, EntityUpdate};
pub use ids::{ConnectionId, EntityId, PlayerId, ZoneId};
pub use intent::Intent;
pub use tick::{BaseState, TickResult};
pub use zone::Zone;
