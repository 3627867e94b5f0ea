//! Delivery of reconciled children to the owning parent, and fetch guarding.

use tokio::sync::mpsc;

use crate::models::{ParentId, ParentRecord};

/// Hands the owning collaborator an updated parent after each settlement.
///
/// One call to [`ParentNotifier::settle`] is one delivery; the receiving side
/// never sees intermediate optimistic states.
#[derive(Debug)]
pub struct ParentNotifier<P> {
    parent: Option<P>,
    sender: mpsc::UnboundedSender<P>,
}

impl<P: ParentRecord> ParentNotifier<P> {
    /// Create a notifier and the receiver the parent view listens on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<P>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                parent: None,
                sender,
            },
            receiver,
        )
    }

    /// Replace the parent snapshot that future deliveries are built from.
    pub fn set_parent(&mut self, parent: P) {
        self.parent = Some(parent);
    }

    pub const fn parent(&self) -> Option<&P> {
        self.parent.as_ref()
    }

    /// Build `parent` with `children` and deliver it.
    ///
    /// Returns the delivered record, or `None` when no parent is set.
    pub fn settle(&mut self, children: Vec<P::Child>) -> Option<P> {
        let updated = self.parent.as_ref()?.with_children(children);
        self.parent = Some(updated.clone());
        if self.sender.send(updated.clone()).is_err() {
            tracing::debug!("Parent receiver dropped; update for {} not delivered", updated.id());
        }
        Some(updated)
    }
}

/// Remembers which parent's children were last fetched successfully.
///
/// A parent update carrying the same id must not trigger another fetch; only
/// a different target or an explicit retry does.
#[derive(Debug, Clone, Default)]
pub struct FetchGuard {
    last_fetched: Option<ParentId>,
}

impl FetchGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_fetch(&self, parent_id: &ParentId) -> bool {
        self.last_fetched.as_ref() != Some(parent_id)
    }

    pub fn record(&mut self, parent_id: ParentId) {
        self.last_fetched = Some(parent_id);
    }

    /// Forget the last fetch so the next check asks for one.
    pub fn invalidate(&mut self) {
        self.last_fetched = None;
    }
}
