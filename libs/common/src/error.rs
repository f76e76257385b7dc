//! Error types for the shared database layer

use thiserror::Error;

/// Failures produced while setting up or talking to the backing store
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The connection pool could not be established
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Applying the embedded schema migrations failed
    #[error("Database migration error: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// The environment did not yield a usable configuration
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
