//! Common error types for ECHO

use thiserror::Error;

/// Common result type for ECHO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the proxy and the journey client
#[derive(Error, Debug)]
pub enum Error {
    /// Document store operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input, rejected before any write
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Write attempted by a guest identity
    #[error("Login required: {0}")]
    LoginRequired(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
