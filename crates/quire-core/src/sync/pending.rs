//! Ids with a remote call in flight.

use std::collections::HashSet;

use crate::models::ChildId;

/// Set of ids awaiting remote confirmation.
///
/// An id in this set must not be touched by user interaction until the call
/// that marked it settles.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    ids: HashSet<ChildId>,
}

impl PendingSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: ChildId) {
        self.ids.insert(id);
    }

    pub fn unmark(&mut self, id: &ChildId) {
        self.ids.remove(id);
    }

    pub fn is_pending(&self, id: &ChildId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
