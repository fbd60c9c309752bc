//! The transactional contract the tick engine, the snapshot builder, and
//! the administrative surface all use to read and write zones and
//! entities, plus a non-durable in-memory implementation for tests.
//!
//! A production backend (e.g. `persistence-sqlx`) lives in its own crate
//! so that pulling in a concrete database driver never becomes a
//! transitive dependency of the tick engine itself.

pub mod error;
pub mod gateway;
pub mod in_memory;

pub use error::PersistenceError;
pub use gateway::{Gateway, ZoneSession};
pub use in_memory::InMemoryGateway;
