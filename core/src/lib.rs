//! The tick-based authoritative game server framework's core: the
//! tick engine, zone/entity data model plumbing, subscription and
//! broadcast layer, and intent queue, wired around a pluggable
//! `GameLogic` module and a `persistence-api::Gateway` backend.
//!
//! This crate owns no transport and no persistence implementation —
//! those are external collaborators (`persistence-sqlx`, and whatever
//! WebSocket binary the bootstrap process builds) wired in by the
//! caller through [`game_logic::FrameworkHandle`] and
//! [`persistence_api::Gateway`].

pub mod admin;
pub mod adapter;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod game_logic;
pub mod intent_queue;
pub mod module_registry;
pub mod registry;
pub mod sink;
pub mod snapshot;
pub mod tick_engine;

pub use adapter::GameLogicAdapter;
pub use admin::AdminHandle;
pub use auth::{AdminAuth, Authenticator};
pub use config::{Config, ConfigError};
pub use connection::run_connection;
pub use error::{ConflictError, FrameworkError, GameLogicError, ProtocolError};
pub use game_logic::{FrameworkHandle, GameLogic};
pub use intent_queue::IntentQueue;
pub use module_registry::ModuleRegistry;
pub use registry::SubscriptionRegistry;
pub use sink::{OutboundSink, SinkError};
pub use tick_engine::{EngineState, TickEngine};
