use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quire_core::Error),
    #[error(transparent)]
    Api(#[from] quire_core::api::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Description cannot be empty")]
    EmptyDescription,
    #[error("{0} ID cannot be empty")]
    EmptyIdentifier(&'static str),
    #[error("Nothing to change; pass --title and/or --content")]
    NothingToEdit,
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("{0} is busy with another request; try again")]
    Busy(String),
    #[error("{0}")]
    MutationFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Session expired. Update QUIRE_API_TOKEN or run `quire config init --token <TOKEN>`.")]
    SessionExpired,
}
