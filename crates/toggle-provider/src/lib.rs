//! # toggle-provider
//!
//! Synchronous feature toggle lookups backed by an asynchronous,
//! Unleash-compatible flag backend.
//!
//! A [`ToggleProvider`] polls the backend in the background and keeps the
//! latest feature state in memory. Lookups (`is_enabled`) are plain reads of
//! that state, so they can drive a synchronous traversal such as a document
//! filter without ever waiting on the network.
//!
//! ## Quick start
//!
//! ```no_run
//! use toggle_provider::{ProviderConfig, ToggleEvent, ToggleProvider};
//!
//! # async fn run() -> toggle_provider::Result<()> {
//! let config = ProviderConfig::new("https://flags.example.com/api", "accounts-api")
//!     .with_credentials("*:production.abc123");
//! let mut provider = ToggleProvider::connect(config)?;
//! let mut events = provider.subscribe();
//!
//! provider.init(None).await?;
//! provider.on_change(|| println!("toggles changed"))?;
//!
//! let toggles = provider.toggles()?;
//! if toggles.is_enabled("user-signup") {
//!     // ...
//! }
//!
//! while let Ok(event) = events.try_recv() {
//!     if let ToggleEvent::Error(message) = event {
//!         eprintln!("flag backend problem: {message}");
//!     }
//! }
//!
//! provider.destroy().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`provider`] — `ToggleProvider` lifecycle (init / destroy), lookups, refresh loop
//! - [`backend`] — the `FlagBackend` trait implemented by flag servers
//! - [`http`] — `HttpFlagBackend`, the Unleash client API over HTTP
//! - [`feature`] — feature descriptors, bootstrap parsing, `FlagSnapshot`
//! - [`cache`] — the shared flag cache and `ToggleHandle`
//! - [`events`] — `ToggleEvent` lifecycle notifications
//! - [`metrics`] — usage counters reported to the backend
//! - [`config`] — `ProviderConfig` and defaults
//! - [`error`] — Error types

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod feature;
pub mod http;
pub mod metrics;
pub mod provider;

pub use backend::{ClientRegistration, FetchOutcome, FlagBackend};
pub use cache::ToggleHandle;
pub use config::ProviderConfig;
pub use error::{Result, ToggleError};
pub use events::ToggleEvent;
pub use feature::{
    load_bootstrap, parse_bootstrap, FeatureDescriptor, FeaturesResponse, FlagSnapshot,
};
pub use http::HttpFlagBackend;
pub use metrics::{MetricsBucket, MetricsReport, ToggleCount};
pub use provider::{RefreshOutcome, ToggleProvider};
