//! REST API collaborator.
//!
//! [`ApiClient`] speaks the workspace API over HTTP. The sync engine only
//! depends on the [`ChildRemote`] / [`ParentRemote`] traits so tests can swap
//! in an in-memory server.

mod client;
mod remote;

use thiserror::Error;

pub use client::ApiClient;
pub use remote::{ChildRemote, ParentRemote};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session expired")]
    Unauthorized,
    #[error("API error: {message} ({status})")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// Whether this failure means the session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
