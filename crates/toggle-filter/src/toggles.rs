//! Static toggle sets for filtering without a live flag backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An in-memory map of feature names to their enabled state.
///
/// Serializes as a plain JSON object (`{"feature": true}`). Features that are
/// not in the set are disabled.
///
/// # Examples
///
/// ```
/// use toggle_filter::ToggleSet;
///
/// let toggles = ToggleSet::new().enable("new-ui").disable("legacy-api");
/// assert!(toggles.is_enabled("new-ui"));
/// assert!(!toggles.is_enabled("legacy-api"));
/// assert!(!toggles.is_enabled("never-heard-of-it"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToggleSet {
    toggles: HashMap<String, bool>,
}

impl ToggleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a feature as enabled.
    pub fn enable(mut self, name: impl Into<String>) -> Self {
        self.set(name, true);
        self
    }

    /// Mark a feature as disabled.
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.set(name, false);
        self
    }

    /// Set a feature's state, replacing any earlier value.
    pub fn set(&mut self, name: impl Into<String>, enabled: bool) {
        self.toggles.insert(name.into(), enabled);
    }

    /// Resolve a feature. Unknown names are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.toggles.get(name).copied().unwrap_or(false)
    }

    /// Whether the set has an explicit entry for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.toggles.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.toggles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.toggles.iter().map(|(name, enabled)| (name.as_str(), *enabled))
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for ToggleSet {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<(S, bool)> for ToggleSet {
    fn extend<I: IntoIterator<Item = (S, bool)>>(&mut self, iter: I) {
        for (name, enabled) in iter {
            self.set(name, enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_entries_win() {
        let set: ToggleSet = [("a", true), ("a", false)].into_iter().collect();
        assert!(!set.is_enabled("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn deserializes_from_object() {
        let set: ToggleSet = serde_json::from_str(r#"{"a":true,"b":false}"#).unwrap();
        assert!(set.is_enabled("a"));
        assert!(!set.is_enabled("b"));
        assert!(set.contains("b"));
        assert!(!set.contains("c"));
    }
}
