//! Feature descriptors and the flag state snapshot built from them.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One feature as delivered by the backend or a bootstrap file.
///
/// Only `name` and `enabled` drive lookups; the remaining fields are kept for
/// callers that want to display them. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDescriptor {
    pub name: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl FeatureDescriptor {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            description: None,
            project: None,
        }
    }
}

/// Body of `GET /client/features`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturesResponse {
    #[serde(default)]
    pub version: u32,
    pub features: Vec<FeatureDescriptor>,
}

/// Point-in-time view of every known feature's enabled state.
///
/// Built from a feature list; when a name repeats, the last entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSnapshot {
    flags: HashMap<String, bool>,
}

impl FlagSnapshot {
    /// Resolve a feature. Unknown names are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(name, enabled)| (name.as_str(), *enabled))
    }
}

impl FromIterator<FeatureDescriptor> for FlagSnapshot {
    fn from_iter<I: IntoIterator<Item = FeatureDescriptor>>(iter: I) -> Self {
        Self {
            flags: iter
                .into_iter()
                .map(|feature| (feature.name, feature.enabled))
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BootstrapDocument {
    List(Vec<FeatureDescriptor>),
    Response(FeaturesResponse),
}

/// Parse bootstrap data: either a bare feature array or a
/// `{"features": [...]}` object in the backend's response shape.
///
/// # Examples
///
/// ```
/// use toggle_provider::parse_bootstrap;
///
/// let bare = parse_bootstrap(r#"[{"name":"f1","enabled":true}]"#).unwrap();
/// let wrapped = parse_bootstrap(r#"{"version":1,"features":[{"name":"f1","enabled":true}]}"#).unwrap();
/// assert_eq!(bare, wrapped);
/// ```
pub fn parse_bootstrap(json: &str) -> Result<Vec<FeatureDescriptor>> {
    let features = match serde_json::from_str(json)? {
        BootstrapDocument::List(features) => features,
        BootstrapDocument::Response(response) => response.features,
    };
    Ok(features)
}

/// Read and parse a bootstrap file. See [`parse_bootstrap`].
pub fn load_bootstrap(path: impl AsRef<Path>) -> Result<Vec<FeatureDescriptor>> {
    let raw = std::fs::read_to_string(path)?;
    parse_bootstrap(&raw)
}
