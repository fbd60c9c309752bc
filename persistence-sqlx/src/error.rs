use persistence_api::PersistenceError;

/// Classifies a raw `sqlx::Error` into the gateway's closed taxonomy.
///
/// Unique-constraint violations become [`PersistenceError::Conflict`];
/// a missing row a caller expected becomes [`PersistenceError::NotFound`];
/// everything else — connection loss, timeouts, driver errors — is
/// [`PersistenceError::Transient`], since the tick engine's response to
/// any of those is the same: roll back this zone, retry next tick.
pub fn map_sqlx_error(err: sqlx::Error) -> PersistenceError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return PersistenceError::Conflict(db_err.message().to_string());
        }
    }
    match err {
        sqlx::Error::RowNotFound => PersistenceError::NotFound("row not found".to_string()),
        other => PersistenceError::Transient(other.to_string()),
    }
}
