//! Store errors

use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique key (username, email) is already taken
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Backend failure (connection, timeout, corruption)
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
