//! Error types for Custodia.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Session, profile, or event source failed to resolve. Maps to 403.
    #[error("Access denied")]
    AccessDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
