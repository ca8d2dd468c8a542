//! Error types for toggle provider operations.

use thiserror::Error;

/// Errors reported by the toggle provider and its flag backend client.
#[derive(Error, Debug)]
pub enum ToggleError {
    /// Toggle state was queried or subscribed to before `init` completed.
    #[error("toggles not initialized")]
    NotInitialized,

    /// The flag backend could not be reached or returned an unreadable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The flag backend answered with a non-success status code.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// A bootstrap document or backend payload was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A bootstrap file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout toggle-provider.
pub type Result<T> = std::result::Result<T, ToggleError>;
