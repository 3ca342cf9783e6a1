//! Single-threaded publish/subscribe primitives.
//!
//! `Listeners` is a callback registry, `Subscription` is the guard that removes
//! a callback when dropped, and `Latest` is a most-recent-value cell that
//! notifies its listeners on every push.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::math::RigidTransform;

struct Entry<T> {
    id: u64,
    callback: RefCell<Box<dyn FnMut(&T)>>,
    /// Newest value that arrived while `callback` was running
    pending: RefCell<Option<T>>,
}

struct Registry<T> {
    next_id: u64,
    entries: Vec<Rc<Entry<T>>>,
}

/// A set of callbacks invoked in subscription order.
pub struct Listeners<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: Clone + 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback. It stays registered until the returned
    /// `Subscription` is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Rc::new(Entry {
                id,
                callback: RefCell::new(Box::new(callback)),
                pending: RefCell::new(None),
            }));
            id
        };

        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.borrow_mut().entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Invoke every registered callback with `value`.
    ///
    /// Callbacks may subscribe or unsubscribe while being notified; changes take
    /// effect from the next emit. A callback that is already running further up
    /// the stack is not re-entered: the value is parked and the callback runs
    /// again with the newest parked value once its current call returns.
    pub fn emit(&self, value: &T) {
        let entries: Vec<Rc<Entry<T>>> = self.registry.borrow().entries.clone();

        for entry in entries {
            match entry.callback.try_borrow_mut() {
                Ok(mut f) => {
                    f(value);
                    loop {
                        let parked = entry.pending.borrow_mut().take();
                        match parked {
                            Some(next) => f(&next),
                            None => break,
                        }
                    }
                }
                Err(_) => {
                    log::debug!("Deferring re-entrant listener");
                    *entry.pending.borrow_mut() = Some(value.clone());
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard for a registered callback; dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct LatestInner<T> {
    value: Cell<T>,
    listeners: Listeners<T>,
}

/// Most-recent-value stream.
///
/// Each push overwrites the previous sample and notifies subscribers. There is
/// no queue: a consumer only ever sees the latest value. Cloning yields another
/// handle to the same stream.
pub struct Latest<T: Copy + 'static> {
    inner: Rc<LatestInner<T>>,
}

impl<T: Copy + 'static> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Copy + 'static> Latest<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(LatestInner {
                value: Cell::new(initial),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Replace the current sample and notify subscribers
    pub fn push(&self, value: T) {
        self.inner.value.set(value);
        self.inner.listeners.emit(&value);
    }

    pub fn latest(&self) -> T {
        self.inner.value.get()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        self.inner.listeners.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

/// Stream of rigid poses (world pose or orientation samples)
pub type PoseStream = Latest<RigidTransform>;

impl Default for PoseStream {
    fn default() -> Self {
        Self::new(RigidTransform::IDENTITY)
    }
}
