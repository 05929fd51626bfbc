//! Change listeners
//!
//! Observer registry for the hierarchy store. Listeners take no arguments: they
//! are told *that* something changed and read the current state themselves.
//!
//! Listeners run synchronously, in registration order, with no lock held. A
//! panicking listener is caught and logged so the remaining listeners still
//! run. A listener must not call back into the store that notified it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // A listener panic never happens under the lock, so poisoning carries no
    // torn state worth refusing
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ordered set of change listeners
#[derive(Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; it stays registered until the returned
    /// [`Subscription`] is explicitly unsubscribed
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        tracing::debug!("Listener {} subscribed ({} total)", id, registry.listeners.len());

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener once, in registration order
    pub fn notify(&self) {
        let listeners: Vec<(u64, Listener)> = lock(&self.inner).listeners.clone();

        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                tracing::error!("Listener {} panicked during change notification", id);
            }
        }
    }
}

/// Handle returned by [`ListenerRegistry::subscribe`]
///
/// Dropping the handle does not unsubscribe.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the listener. A no-op when the store is already gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.retain(|(id, _)| *id != self.id);
            tracing::debug!("Listener {} unsubscribed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_notify_runs_listeners_in_registration_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            let _ = registry.subscribe(move || order.lock().unwrap().push(n));
        }

        registry.notify();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let subscription = registry.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify();
        subscription.unsubscribe();
        registry.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let _ = registry.subscribe(|| panic!("listener failure"));
        let counter = calls.clone();
        let _ = registry.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify();
        registry.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped_is_noop() {
        let registry = ListenerRegistry::new();
        let subscription = registry.subscribe(|| {});
        drop(registry);

        subscription.unsubscribe();
    }
}
