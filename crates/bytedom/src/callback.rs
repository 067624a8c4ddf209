//! Event callbacks, addressed by a one-byte index.
//!
//! A [`CallbackStore`] belongs to one [`Session`](crate::Session) and lives
//! exactly as long as it (and any listener handles still holding it). The
//! encoder registers callbacks when `on(..)` is called; EVENT_LISTENER
//! bakes the returned index into the program; the host later fires an
//! [`EventHandler`] which resolves the index back to the callback.
//!
//! The store is single-threaded and reentrant: a callback may register new
//! callbacks while it runs.

use crate::Map;
use crate::error::{Error, Result};
use bytedom_log::trace;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A zero-argument event callback.
pub type Callback = Rc<dyn Fn()>;

#[derive(Default)]
struct Slots {
    callbacks: Map<u8, Callback>,
    // u16 so that exhaustion after index 255 is observable
    next: u16,
}

/// Shared, append-only map from callback index to callback.
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct CallbackStore {
    slots: Rc<RefCell<Slots>>,
}

impl CallbackStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `callback` under a fresh index. Registering the same callback
    /// twice yields two indices.
    pub fn register(&self, callback: Callback) -> Result<u8> {
        let mut slots = self.slots.borrow_mut();
        let index = u8::try_from(slots.next).map_err(|_| Error::CallbackIndexExhausted)?;
        slots.next += 1;
        slots.callbacks.insert(index, callback);
        trace!("registered callback #{index}");
        Ok(index)
    }

    #[must_use]
    pub fn get(&self, index: u8) -> Option<Callback> {
        self.slots.borrow().callbacks.get(&index).cloned()
    }

    /// Invokes the callback at `index`. Returns false, doing nothing, when
    /// no callback is registered there.
    pub fn invoke(&self, index: u8) -> bool {
        // Clone out first: the callback may register into this store.
        let Some(callback) = self.get(index) else {
            trace!("no callback at #{index}");
            return false;
        };
        callback();
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if both handles refer to the same store.
    #[must_use]
    pub fn same_store(&self, other: &CallbackStore) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }
}

impl fmt::Debug for CallbackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.borrow();
        f.debug_struct("CallbackStore")
            .field("len", &slots.callbacks.len())
            .field("next", &slots.next)
            .finish()
    }
}

/// The listener the VM hands to the host for EVENT_LISTENER.
#[derive(Clone)]
pub struct EventHandler {
    index: u8,
    store: CallbackStore,
}

impl EventHandler {
    pub(crate) fn new(index: u8, store: CallbackStore) -> Self {
        Self { index, store }
    }

    #[must_use]
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Runs the callback this listener points at, if it still exists.
    pub fn invoke(&self) -> bool {
        self.store.invoke(self.index)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
