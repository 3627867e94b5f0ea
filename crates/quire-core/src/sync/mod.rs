//! Optimistic sync engine for child records.
//!
//! A [`MutationCoordinator`] applies each create/update/delete/toggle locally,
//! issues the remote call, and then confirms or rolls back against the
//! *current* store contents. [`ChildListView`] wraps it for one open parent,
//! guarding fetches and handing each settled child list to the
//! [`ParentNotifier`] exactly once.

mod coordinator;
mod notifier;
mod pending;
mod store;
mod view;

#[cfg(test)]
mod testing;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::api::{ApiError, ApiResult};

pub use coordinator::MutationCoordinator;
pub use notifier::{FetchGuard, ParentNotifier};
pub use pending::PendingSet;
pub use store::EntityStore;
pub use view::ChildListView;

/// Loading the child list failed. The store keeps its previous contents.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to load: {0}")]
    Api(#[from] ApiError),
    #[error("Loading timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl FetchError {
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(error) if error.is_unauthorized())
    }
}

/// A remote mutation failed; local state has been rolled back.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Request timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl MutationError {
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(error) if error.is_unauthorized())
    }
}

/// Why a mutation was refused without contacting the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Another call for the same id is still in flight.
    Pending,
    /// The id is not in the store.
    Missing,
}

/// How a mutation settled.
#[derive(Debug)]
pub enum Outcome {
    /// The server confirmed and the store holds the authoritative record.
    Applied,
    /// Refused up front; nothing changed and no request was sent.
    Rejected(Rejection),
    /// The server confirmed, but the target had already left the store.
    Skipped,
    /// The server call failed and local changes were rolled back.
    Failed(MutationError),
}

/// Result of a mutation at the point it settled.
///
/// `children` is the reconciled list at settlement; callers decide whether to
/// forward it to the parent.
#[derive(Debug)]
pub struct Settlement<C> {
    pub outcome: Outcome,
    pub children: Vec<C>,
}

impl<C> Settlement<C> {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.outcome, Outcome::Applied)
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self.outcome, Outcome::Rejected(_))
    }

    #[must_use]
    pub const fn error(&self) -> Option<&MutationError> {
        match &self.outcome {
            Outcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the parent should hear about this settlement.
    ///
    /// Rejections and race skips leave the store as it was.
    #[must_use]
    pub const fn should_notify(&self) -> bool {
        matches!(self.outcome, Outcome::Applied | Outcome::Failed(_))
    }

    #[must_use]
    pub const fn session_expired(&self) -> bool {
        match &self.outcome {
            Outcome::Failed(error) => error.is_session_expired(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient user-facing notification (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Await `call`, giving up after `limit`.
async fn within<T, E>(
    limit: Duration,
    call: impl Future<Output = ApiResult<T>>,
    timed_out: fn(Duration) -> E,
) -> Result<T, E>
where
    E: From<ApiError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(E::from),
        Err(_) => Err(timed_out(limit)),
    }
}
