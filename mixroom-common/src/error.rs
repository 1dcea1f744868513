//! Common error types for mixroom

use thiserror::Error;

/// Common result type for mixroom operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across mixroom services
#[derive(Error, Debug)]
pub enum Error {
    /// Outbound HTTP error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
