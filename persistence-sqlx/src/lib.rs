//! The production [`Gateway`] backend: `sqlx::AnyPool` against the
//! zones/entities schema, matching the teacher's db-trait/db-backend
//! crate split so callers depend only on `persistence-api` and pull
//! this crate in solely for its `SqlxGateway::new` constructor.

mod error;
mod gateway;

pub use gateway::SqlxGateway;
