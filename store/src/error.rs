//! Error types for the persistence layer.

/// Errors returned by the tables and the database handle.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<newsnow_common::UnknownAccountType> for StoreError {
    fn from(e: newsnow_common::UnknownAccountType) -> Self {
        StoreError::InvalidAccountType(e.0)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
