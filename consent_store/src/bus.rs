//! Subscriber registries for consent and presentation changes.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use consent_core::{ConsentAction, ConsentRecord, Presentation};
use parking_lot::Mutex;
use tracing::warn;

pub type ConsentListener = dyn Fn(&ConsentRecord, ConsentAction) + Send + Sync;
pub type PresentationListener = dyn Fn(Presentation) + Send + Sync;

struct Registry<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<T>)>,
}

/// Registration-ordered subscriber list.
pub struct Listeners<T: ?Sized> {
    name: &'static str,
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: ?Sized> std::fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("name", &self.name)
            .field("len", &self.inner.lock().entries.len())
            .finish()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Listeners<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Registry {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    pub fn add(&self, listener: Arc<T>) -> Subscription {
        let id = {
            let mut reg = self.inner.lock();
            let id = reg.next_id;
            reg.next_id += 1;
            reg.entries.push((id, listener));
            id
        };
        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            unregister: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().entries.retain(|(i, _)| *i != id);
                }
            })),
        }
    }

    /// Returns whether `id` was registered.
    pub fn remove(&self, id: u64) -> bool {
        let mut reg = self.inner.lock();
        let before = reg.entries.len();
        reg.entries.retain(|(i, _)| *i != id);
        reg.entries.len() != before
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every subscriber in registration order.
    ///
    /// Runs over a snapshot, so subscribers may unsubscribe during delivery.
    /// A panicking subscriber is logged and skipped. Returns how many panicked.
    pub fn notify_each(&self, mut deliver: impl FnMut(&T)) -> usize {
        let snapshot: Vec<(u64, Arc<T>)> = self.inner.lock().entries.clone();
        let mut failed = 0;
        for (id, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| deliver(listener.as_ref()))).is_err() {
                failed += 1;
                warn!(registry = self.name, subscriber = id, "subscriber panicked; continuing");
            }
        }
        failed
    }
}

/// Handle returned by a subscribe call.
///
/// Dropping it leaves the subscriber registered; call `unsubscribe` to remove it.
pub struct Subscription {
    id: u64,
    unregister: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn unsubscribe(mut self) {
        if let Some(f) = self.unregister.take() {
            f();
        }
    }
}
