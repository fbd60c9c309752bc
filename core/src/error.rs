//! The six-class error taxonomy every subsystem translates its failures
//! into at its smallest enclosing scope — per-zone, per-subscriber,
//! per-connection — before anything crosses that scope's boundary.

use persistence_api::PersistenceError;
use thiserror::Error;

/// Raised by a `GameLogic` implementation, or by the adapter on its
/// behalf when a module call panics.
#[derive(Debug, Error)]
pub enum GameLogicError {
    /// The module rejected its input or raised during resolution.
    #[error("game logic error: {0}")]
    Failed(String),
    /// The module call unwound via panic. Caught at the adapter boundary
    /// because the module is polymorphic, third-party code.
    #[error("game logic module panicked: {0}")]
    Panicked(String),
}

/// Raised by the external `Authenticator` boundary.
#[derive(Debug, Error)]
#[error("authentication failed: {0}")]
pub struct AuthError(pub String);

/// Malformed client input or an invalid protocol-level state transition.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The message could not be parsed as a `ClientMessage`.
    #[error("unparseable message: {0}")]
    Unparseable(String),
    /// The message was well-formed but illegal in the connection's
    /// current state (e.g. an intent with no prior subscription).
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),
}

/// A stale-identity or uniqueness violation at a subsystem boundary.
#[derive(Debug, Error)]
pub enum ConflictError {
    /// A `disconnect`/`subscribe` call's connection id did not match the
    /// currently registered connection for that player.
    #[error("stale connection id for player")]
    StaleConnection,
    /// An administrative create hit an existing unique name.
    #[error("{0}")]
    Persistence(#[from] PersistenceError),
}

/// The framework-wide error taxonomy. Every subsystem failure is
/// translated into exactly one of these six classes before it crosses a
/// scope boundary; nothing propagates unclassified.
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// Class 1 — malformed client input or configuration.
    #[error("validation error: {0}")]
    Validation(String),
    /// Class 2 — unique constraint violations, stale connection-id ops.
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),
    /// Class 3 — I/O error inside a zone transaction.
    #[error("transient storage error: {0}")]
    Transient(PersistenceError),
    /// Class 4 — the game module raised during `on_tick` or
    /// `get_player_state`.
    #[error("module error: {0}")]
    Module(#[from] GameLogicError),
    /// Class 5 — unparseable client message or invalid state transition.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Class 6 — loss of the persistence connection at startup, or a
    /// tick-engine invariant violation. The process should shut down.
    #[error("fatal error: {0}")]
    Fatal(String),
}

/// Classifies a gateway failure into its taxonomy arm rather than
/// collapsing every `PersistenceError` into *Transient*: a unique
/// constraint violation is a *Conflict*, not a retry candidate.
impl From<PersistenceError> for FrameworkError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Conflict(_) => {
                FrameworkError::Conflict(ConflictError::Persistence(err))
            }
            PersistenceError::Fatal(message) => FrameworkError::Fatal(message),
            PersistenceError::NotFound(_) | PersistenceError::Transient(_) => {
                FrameworkError::Transient(err)
            }
        }
    }
}
