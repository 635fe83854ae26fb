//! Error types for the application layer.

use thiserror::Error;

/// Errors raised outside the GPU path: configuration, files and windowing.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed, serialized or failed validation
    #[error("Config error: {0}")]
    Config(String),

    /// Window or event loop creation failed
    #[error("Window error: {0}")]
    Window(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using the core Error type.
pub type Result<T> = std::result::Result<T, Error>;
