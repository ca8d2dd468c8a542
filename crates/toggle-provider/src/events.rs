//! Lifecycle events and change observers.

use std::sync::{Arc, Mutex, PoisonError};

/// Notifications published by a [`crate::ToggleProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleEvent {
    /// `init` finished; lookups are now served.
    Ready,
    /// A backend call failed. The last known state keeps being served.
    Error(String),
    /// A refresh replaced the cached state with a different one.
    Changed,
    /// The client registration was accepted by the backend.
    Registered,
    /// The first successful fetch of this lifecycle completed.
    Synchronized,
}

pub(crate) type ChangeHandler = Arc<dyn Fn() + Send + Sync>;

/// Ordered set of change callbacks.
#[derive(Default)]
pub(crate) struct Observers {
    handlers: Mutex<Vec<ChangeHandler>>,
}

impl Observers {
    pub(crate) fn register(&self, handler: ChangeHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Invoke every handler once. The list is copied first so handlers may
    /// register further observers.
    pub(crate) fn notify(&self) {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler();
        }
    }

    pub(crate) fn clear(&self) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
