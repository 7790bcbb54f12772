//! Error types for HBNB

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HbnbError>;

#[derive(Error, Debug)]
pub enum HbnbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A uniqueness constraint would be violated
    #[error("{0}")]
    Conflict(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for HbnbError {
    fn from(e: serde_json::Error) -> Self {
        HbnbError::Serialization(e.to_string())
    }
}
