//! Error types for the parish calendar.

use thiserror::Error;

use crate::store::Collection;

/// Errors that can occur outside the (infallible) occurrence expander.
#[derive(Error, Debug)]
pub enum ParishError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Store error for '{collection}': {message}")]
    Store {
        collection: Collection,
        message: String,
    },

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("Assistant quota exhausted: {0}")]
    Quota(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ParishError {
    pub fn store(collection: Collection, message: impl Into<String>) -> Self {
        ParishError::Store {
            collection,
            message: message.into(),
        }
    }
}

/// Result type alias for parish operations.
pub type ParishResult<T> = Result<T, ParishError>;
