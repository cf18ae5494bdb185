use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("Invalid match strategy: {0}")]
    InvalidMatchStrategy(String),

    #[error("Corrupt stored record: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
