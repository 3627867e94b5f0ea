//! Ordered in-memory children of the open parent.

use crate::models::{ChildId, ChildRecord};

/// Ordered children of a single parent.
///
/// Lookups that miss are no-ops rather than errors: a confirmation can land
/// after a rollback or reload already removed its target.
#[derive(Debug, Clone)]
pub struct EntityStore<C> {
    entries: Vec<C>,
}

impl<C> Default for EntityStore<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C: ChildRecord> EntityStore<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly fetched list, dropping whatever was there.
    pub fn replace_all(&mut self, entries: Vec<C>) {
        self.entries = entries;
    }

    /// Append an unconfirmed entity. Refuses to shadow an existing id.
    pub fn apply_optimistic(&mut self, entity: C) -> bool {
        if self.contains(entity.id()) {
            return false;
        }
        self.entries.push(entity);
        true
    }

    /// Swap the entity at `id` for `confirmed`, keeping its position.
    ///
    /// If `confirmed` is already present under its own id (a reload raced the
    /// confirmation), the stale entry at `id` is dropped instead of creating a
    /// duplicate. Returns `false` when `id` is absent.
    pub fn replace(&mut self, id: &ChildId, confirmed: C) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        if confirmed.id() != id {
            if let Some(existing) = self.position(confirmed.id()) {
                self.entries[existing] = confirmed;
                self.entries.remove(index);
                return true;
            }
        }

        self.entries[index] = confirmed;
        true
    }

    /// Remove by id. Returns `false` when already gone.
    pub fn remove(&mut self, id: &ChildId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.entries.remove(index);
        true
    }

    /// Shallow-merge `patch` into the entity at `id`.
    pub fn patch(&mut self, id: &ChildId, patch: &C::Patch) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.entries[index].apply_patch(patch);
        true
    }

    pub fn get(&self, id: &ChildId) -> Option<&C> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn contains(&self, id: &ChildId) -> bool {
        self.position(id).is_some()
    }

    pub fn as_slice(&self) -> &[C] {
        &self.entries
    }

    pub fn snapshot(&self) -> Vec<C> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &ChildId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == id)
    }
}
