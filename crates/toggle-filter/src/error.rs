//! Error types for document filtering.

use thiserror::Error;

/// Errors that can occur while filtering a serialized document.
///
/// Filtering an in-memory [`serde_json::Value`] cannot fail on its own; only
/// the string convenience wrappers report errors.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The input was not valid JSON, or the result could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout toggle-filter.
pub type Result<T> = std::result::Result<T, FilterError>;
