//! The pending-change queue.
//!
//! Buffers mutations until the backend confirms a push. FIFO, no
//! deduplication: several updates to the same recipe before a sync all stay
//! queued, and the backend applies them last-one-wins.

use crate::models::PendingChange;
use crate::store::{LocalStore, StoreError};

/// Append-only buffer of unsynced mutations, persisted through the local
/// store.
#[derive(Clone)]
pub struct ChangeQueue {
    store: LocalStore,
}

impl ChangeQueue {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Appends a change, preserving insertion order.
    pub fn append(&self, change: PendingChange) -> Result<(), StoreError> {
        let mut changes = self.store.load_pending()?;
        changes.push(change);
        self.store.save_pending(&changes)
    }

    /// Returns the current contents without clearing them. Used to build
    /// the sync payload.
    pub fn drain(&self) -> Result<Vec<PendingChange>, StoreError> {
        self.store.load_pending()
    }

    /// Empties the queue. Called only after the coordinator confirms
    /// delivery; clearing is all-or-nothing.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.save_pending(&[])
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.store.load_pending()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.store.load_pending()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipe;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn test_queue() -> ChangeQueue {
        ChangeQueue::new(LocalStore::new(Arc::new(MemoryStorage::new())))
    }

    #[test]
    fn test_append_preserves_order() {
        let queue = test_queue();
        let recipe = Recipe::new("Mythic Soda", "Brew");
        queue.append(PendingChange::add(recipe.clone(), 1)).unwrap();
        queue.append(PendingChange::update(recipe, 2)).unwrap();
        queue.append(PendingChange::delete("1", 3)).unwrap();

        let changes = queue.drain().unwrap();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].action(), "add");
        assert_eq!(changes[1].action(), "update");
        assert_eq!(changes[2].action(), "delete");
    }

    #[test]
    fn test_drain_does_not_clear() {
        let queue = test_queue();
        queue.append(PendingChange::delete("x", 1)).unwrap();
        assert_eq!(queue.drain().unwrap().len(), 1);
        assert_eq!(queue.drain().unwrap().len(), 1);
    }

    #[test]
    fn test_no_deduplication() {
        let queue = test_queue();
        let recipe = Recipe::new("Same", "Potion");
        queue.append(PendingChange::update(recipe.clone(), 1)).unwrap();
        queue.append(PendingChange::update(recipe, 2)).unwrap();
        assert_eq!(queue.len().unwrap(), 2);
    }

    #[test]
    fn test_clear_empties_queue() {
        let queue = test_queue();
        queue.append(PendingChange::delete("x", 1)).unwrap();
        queue.clear().unwrap();
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn test_queue_survives_reopen() {
        let backend = Arc::new(MemoryStorage::new());
        let queue = ChangeQueue::new(LocalStore::new(backend.clone()));
        queue.append(PendingChange::delete("x", 1)).unwrap();

        let reopened = ChangeQueue::new(LocalStore::new(backend));
        assert_eq!(reopened.len().unwrap(), 1);
    }
}
