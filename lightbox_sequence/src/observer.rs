// Copyright 2026 the Lightbox Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Explicit observer registration with RAII unsubscription.
//!
//! Observers are plain closures. [`ObserverList::notify`] snapshots the
//! registered callbacks and releases its lock before calling any of them, so
//! an observer may subscribe, unsubscribe or trigger another notification
//! without deadlocking.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slots<T: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// A list of callbacks notified with a borrowed value.
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use lightbox_sequence::ObserverList;
///
/// let list: ObserverList<u32> = ObserverList::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = seen.clone();
/// let sub = list.subscribe(move |v| {
///     counter.fetch_add(*v as usize, Ordering::SeqCst);
/// });
///
/// list.notify(&3);
/// drop(sub);
/// list.notify(&4);
/// assert_eq!(seen.load(Ordering::SeqCst), 3);
/// ```
pub struct ObserverList<T: ?Sized + 'static> {
    slots: Arc<Mutex<Slots<T>>>,
}

impl<T: ?Sized + 'static> ObserverList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `callback`; it stays registered until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut slots = self.slots.lock();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Arc::new(callback)));
            id
        };
        let weak: Weak<Mutex<Slots<T>>> = Arc::downgrade(&self.slots);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(slots) = weak.upgrade() {
                    slots.lock().entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Calls every registered observer with `value`, in registration order.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .slots
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized + 'static> Default for ObserverList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.len())
            .finish_non_exhaustive()
    }
}

/// Keeps an observer registered; dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keeps the observer registered for as long as the list lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
