use thiserror::Error;

/// Failures surfaced by the persistence gateway.
///
/// Feeds directly into the framework's error taxonomy: [`PersistenceError::Conflict`]
/// maps onto the *Conflict* class, [`PersistenceError::Transient`] and
/// [`PersistenceError::NotFound`] onto *Transient storage*, and
/// [`PersistenceError::Fatal`] onto *Fatal*.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A unique constraint was violated (e.g. duplicate zone name).
    #[error("conflict: {0}")]
    Conflict(String),
    /// The requested zone or entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A connection or I/O error occurred inside the transaction scope.
    /// The caller rolls back and may retry on the next tick.
    #[error("transient storage error: {0}")]
    Transient(String),
    /// Loss of the persistence connection at startup, or another
    /// unrecoverable condition. The process should shut down.
    #[error("fatal persistence error: {0}")]
    Fatal(String),
}
