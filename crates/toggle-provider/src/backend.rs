//! The flag backend seam: what the provider needs from a feature server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::feature::FeatureDescriptor;
use crate::metrics::MetricsReport;

/// Result of a feature fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A fresh feature list, with the validator to send next time.
    Modified {
        features: Vec<FeatureDescriptor>,
        etag: Option<String>,
    },
    /// The backend confirmed the cached list is still current.
    NotModified,
}

/// Body of `POST /client/register`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    pub app_name: String,
    pub instance_id: String,
    pub sdk_version: String,
    pub strategies: Vec<String>,
    pub started: DateTime<Utc>,
    /// Refresh interval in milliseconds.
    pub interval: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// A source of feature state.
///
/// [`crate::HttpFlagBackend`] talks to an Unleash-compatible server; tests and
/// embedders can provide their own implementation.
#[async_trait]
pub trait FlagBackend: Send + Sync + 'static {
    /// Fetch the current feature list. `etag` is the validator returned by
    /// the previous successful fetch, if any.
    async fn fetch_features(&self, etag: Option<&str>) -> Result<FetchOutcome>;

    /// Announce this client instance to the backend.
    async fn register(&self, registration: &ClientRegistration) -> Result<()>;

    /// Report usage counters for one bucket.
    async fn send_metrics(&self, report: &MetricsReport) -> Result<()>;
}
