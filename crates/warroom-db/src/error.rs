//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Duplicate key.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Domain rule violated (missing game, wrong status, taken nation...).
    #[error(transparent)]
    Game(#[from] warroom_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-checkable code for this error
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Database(_) => "database",
            Error::Serialization(_) => "serialization",
            Error::DuplicateKey(_) => "duplicate_key",
            Error::Game(err) => err.kind(),
            Error::Io(_) => "io",
        }
    }

    /// The domain error, if this is one
    pub fn as_game_error(&self) -> Option<&warroom_core::Error> {
        match self {
            Error::Game(err) => Some(err),
            _ => None,
        }
    }
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;
