//! Shared, swap-on-refresh flag cache and the read handle handed to callers.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::feature::FlagSnapshot;
use crate::metrics::{MetricsBucket, UsageCounters};

/// Holds the current [`FlagSnapshot`] behind an `Arc` so readers grab it
/// under a short read lock while refreshes swap in a new one.
#[derive(Debug)]
pub(crate) struct FlagCache {
    snapshot: RwLock<Arc<FlagSnapshot>>,
    usage: Option<Mutex<UsageCounters>>,
}

impl FlagCache {
    pub(crate) fn new(initial: FlagSnapshot, track_usage: bool) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(initial)),
            usage: track_usage.then(|| Mutex::new(UsageCounters::new())),
        }
    }

    pub(crate) fn current(&self) -> Arc<FlagSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub(crate) fn is_enabled(&self, name: &str) -> bool {
        let enabled = self.current().is_enabled(name);
        if let Some(usage) = &self.usage {
            usage
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(name, enabled);
        }
        enabled
    }

    /// Install `next` and report whether it differs from what was cached.
    pub(crate) fn replace(&self, next: FlagSnapshot) -> bool {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if **guard == next {
            return false;
        }
        *guard = Arc::new(next);
        true
    }

    /// Close the current usage bucket, if usage is tracked.
    pub(crate) fn drain_usage(&self) -> Option<MetricsBucket> {
        self.usage
            .as_ref()
            .map(|usage| usage.lock().unwrap_or_else(PoisonError::into_inner).drain())
    }
}

/// Cheap, cloneable read access to a provider's live flag state.
///
/// Obtained from [`crate::ToggleProvider::toggles`] once the provider is
/// ready, and typically passed to a document filter as its predicate:
///
/// ```ignore
/// let toggles = provider.toggles()?;
/// let pruned = toggle_filter::filter_document(&spec, |name| toggles.is_enabled(name));
/// ```
///
/// The handle follows every refresh while the provider is running. After the
/// provider is destroyed it keeps answering from the last state it saw.
#[derive(Clone)]
pub struct ToggleHandle {
    cache: Arc<FlagCache>,
}

impl ToggleHandle {
    pub(crate) fn new(cache: Arc<FlagCache>) -> Self {
        Self { cache }
    }

    /// Resolve a feature against the current state. Unknown names are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.cache.is_enabled(name)
    }

    /// Private copy of the current state.
    pub fn snapshot(&self) -> FlagSnapshot {
        self.cache.current().as_ref().clone()
    }
}

impl fmt::Debug for ToggleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleHandle")
            .field("features", &self.cache.current().len())
            .finish()
    }
}
