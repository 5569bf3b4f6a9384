//! Library error type

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by storage, configuration and vocabulary parsing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the database directory failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable config file or unusable setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text outside a closed vocabulary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored row that no longer maps onto the domain types
    #[error("Internal error: {0}")]
    Internal(String),
}
