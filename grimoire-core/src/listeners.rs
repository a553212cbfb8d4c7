//! Synchronous fan-out of collection-changed events.
//!
//! Each repository instance owns its own registry, so isolated instances
//! can coexist in tests. Callbacks receive a snapshot of the full updated
//! collection, in registration order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::warn;

use crate::models::Recipe;

type Callback = Arc<dyn Fn(&[Recipe]) + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    listeners: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

/// Registry of collection-changed observers.
///
/// Cheap to clone; clones share the same listener set.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<RegistryInner>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback and returns the handle that removes it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Recipe]) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.push((id, Arc::new(callback)));
        }
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Invokes every registered callback with the updated collection.
    ///
    /// The listener list is snapshotted before iterating, so callbacks may
    /// unsubscribe (themselves or others) mid-pass. A panicking callback is
    /// isolated and logged; the remaining callbacks still run.
    pub fn notify(&self, recipes: &[Recipe]) {
        let snapshot: Vec<Callback> = match self.inner.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, cb)| cb.clone()).collect(),
            Err(_) => return,
        };

        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(recipes))).is_err() {
                warn!("recipe listener panicked; continuing with remaining listeners");
            }
        }
    }

    /// Number of currently registered listeners.
    pub fn len(&self) -> usize {
        self.inner.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its callback when `unsubscribe` is called.
///
/// Dropping the subscription without unsubscribing leaves the callback
/// registered for the registry's lifetime.
pub struct Subscription {
    id: u64,
    inner: Weak<RegistryInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut listeners) = inner.listeners.lock() {
                listeners.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_reaches_all_listeners_in_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = order.clone();
        let _s1 = registry.subscribe(move |_| o1.lock().unwrap().push(1));
        let o2 = order.clone();
        let _s2 = registry.subscribe(move |_| o2.lock().unwrap().push(2));

        registry.notify(&[]);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_callback_receives_collection() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        let _sub = registry.subscribe(move |recipes| {
            *s.lock().unwrap() = recipes.to_vec();
        });

        let recipes = vec![Recipe::new("Moon Milk", "Elixir")];
        registry.notify(&recipes);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(seen.lock().unwrap()[0].name, "Moon Milk");
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let sub = registry.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&[]);
        sub.unsubscribe();
        registry.notify(&[]);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _bad = registry.subscribe(|_| panic!("listener failure"));
        let c = count.clone();
        let _good = registry.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&[]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_during_notify_is_safe() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        // The first listener removes the second mid-pass; the snapshot
        // means the second still fires for this notify, but not the next.
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_for_cb = slot.clone();
        let _remover = registry.subscribe(move |_| {
            if let Some(sub) = slot_for_cb.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });

        let c = count.clone();
        let target = registry.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        *slot.lock().unwrap() = Some(target);

        registry.notify(&[]);
        registry.notify(&[]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
