//! # toggle-filter
//!
//! Feature-toggle-aware pruning for JSON documents such as OpenAPI specs.
//!
//! Mark any object in a document with `"x-feature-toggle": "<feature>"` and
//! [`filter_document`] returns a copy of the document with that object (and
//! everything below it) removed whenever the feature is disabled. The filter
//! is a plain synchronous function: flag resolution is delegated to a
//! predicate supplied by the caller, typically a live toggle provider or a
//! static [`ToggleSet`].
//!
//! ## Quick start
//!
//! ```rust
//! use serde_json::json;
//! use toggle_filter::{filter_document, ToggleSet};
//!
//! let spec = json!({
//!     "info": {},
//!     "paths": {"/users": {"post": {"x-feature-toggle": "f1"}}}
//! });
//!
//! let toggles = ToggleSet::new().disable("f1");
//! let filtered = filter_document(&spec, |name| toggles.is_enabled(name));
//! assert_eq!(filtered, json!({"info": {}, "paths": {"/users": {}}}));
//! ```
//!
//! ## Modules
//!
//! - [`filter`] — the pruning traversal (`filter_document`, `try_filter_document`)
//! - [`toggles`] — `ToggleSet`, a static name → enabled map
//! - [`error`] — Error types for the string-based entry points

pub mod error;
pub mod filter;
pub mod toggles;

pub use error::FilterError;
pub use filter::{
    collect_toggles, filter_document, filter_json, try_filter_document, TOGGLE_MARKER_KEY,
};
pub use toggles::ToggleSet;
