//! Error types for ormlet

use thiserror::Error;

/// Result type alias for ormlet operations
pub type Result<T> = std::result::Result<T, OrmError>;

/// Unified error type for all ormlet operations
#[derive(Error, Debug)]
pub enum OrmError {
    /// Malformed entity declaration (missing or duplicate primary key,
    /// duplicate field, invalid identifier). Raised at registration time.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Pool bootstrap is missing a required parameter or carries an invalid one.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A caller passed an argument the mapping engine cannot use.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A result column could not be converted into a value.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Failure reported by the database driver, passed through unchanged.
    #[cfg(feature = "mysql-errors")]
    #[error("Driver error: {0}")]
    Driver(#[from] sqlx::Error),
}

impl OrmError {
    /// Returns true for errors raised while declaring models or bootstrapping
    /// the pool. These abort startup and are never recovered.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OrmError::Schema(_) | OrmError::Configuration(_))
    }

    /// Returns true if the error came from the database driver
    pub fn is_driver_error(&self) -> bool {
        #[cfg(feature = "mysql-errors")]
        {
            matches!(self, OrmError::Driver(_))
        }
        #[cfg(not(feature = "mysql-errors"))]
        {
            false
        }
    }

    /// Returns true if this error is potentially retryable.
    ///
    /// The mapping engine never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        #[cfg(feature = "mysql-errors")]
        {
            matches!(
                self,
                OrmError::Driver(sqlx::Error::PoolTimedOut) | OrmError::Driver(sqlx::Error::Io(_))
            )
        }
        #[cfg(not(feature = "mysql-errors"))]
        {
            false
        }
    }
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Serialization(err.to_string())
    }
}
