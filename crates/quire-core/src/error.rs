//! Error types for quire-core

use thiserror::Error;

use crate::api::ApiError;
use crate::sync::FetchError;

/// Result type alias using quire-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quire-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote API error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Loading a child list failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A child operation was issued before any parent was opened
    #[error("No parent record is open")]
    NoActiveParent,
}
