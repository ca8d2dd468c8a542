//! Connection and scheduling settings for the toggle provider.

use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, ToggleError};

/// Default cadence of the background feature refresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);
/// Refresh intervals shorter than this are clamped up.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
/// Default cadence of usage metric reports.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(60);
/// Default per-request timeout against the flag backend.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// SDK identifier sent with client registrations.
pub const SDK_VERSION: &str = concat!("toggle-provider:", env!("CARGO_PKG_VERSION"));

/// Settings used to connect a [`crate::ToggleProvider`] to its flag backend.
///
/// Built with [`ProviderConfig::new`] and the chained `with_*` setters:
///
/// ```
/// use std::time::Duration;
/// use toggle_provider::ProviderConfig;
///
/// let config = ProviderConfig::new("https://flags.example.com/api", "accounts-api")
///     .with_credentials("*:production.abc123")
///     .with_environment("production")
///     .with_refresh_interval(Duration::from_secs(30));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct ProviderConfig {
    /// Base URL of the Unleash-compatible API (without `/client/...`).
    pub url: String,
    /// Application name reported to the backend.
    pub app_name: String,
    /// Instance identifier. Defaults to `<app_name>-<pid>`.
    pub instance_id: Option<String>,
    /// Value of the `Authorization` header, if the backend requires one.
    pub credentials: Option<String>,
    pub environment: Option<String>,
    pub refresh_interval: Duration,
    pub metrics_interval: Duration,
    /// Skip client registration and usage metric reports.
    pub metrics_disabled: bool,
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn new(url: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            app_name: app_name.into(),
            instance_id: None,
            credentials: None,
            environment: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            metrics_interval: DEFAULT_METRICS_INTERVAL,
            metrics_disabled: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval;
        self
    }

    pub fn with_metrics_disabled(mut self, disabled: bool) -> Self {
        self.metrics_disabled = disabled;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The configured instance id, or `<app_name>-<pid>` when unset.
    pub fn instance_id(&self) -> String {
        self.instance_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.app_name, std::process::id()))
    }

    /// Check that the settings can be used to reach a backend.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::InvalidConfig`] when `url` or `app_name` is
    /// blank, or when `url` is not an `http(s)` URL.
    pub fn validate(&self) -> Result<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ToggleError::InvalidConfig("url must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ToggleError::InvalidConfig(format!(
                "url must start with http:// or https://, got '{url}'"
            )));
        }
        if self.app_name.trim().is_empty() {
            return Err(ToggleError::InvalidConfig(
                "app_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Refresh interval with the lower bound applied.
    pub(crate) fn effective_refresh_interval(&self) -> Duration {
        if self.refresh_interval < MIN_REFRESH_INTERVAL {
            warn!(
                requested_ms = self.refresh_interval.as_millis() as u64,
                "refresh interval below minimum; clamping to {}s",
                MIN_REFRESH_INTERVAL.as_secs()
            );
            return MIN_REFRESH_INTERVAL;
        }
        self.refresh_interval
    }

    /// Metrics interval with the same lower bound as refreshes.
    pub(crate) fn effective_metrics_interval(&self) -> Duration {
        self.metrics_interval.max(MIN_REFRESH_INTERVAL)
    }
}

impl fmt::Debug for ProviderConfig {
    /// Keeps credentials out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("url", &self.url)
            .field("app_name", &self.app_name)
            .field("instance_id", &self.instance_id)
            .field(
                "credentials",
                &self.credentials.as_ref().map(|_| "<redacted>"),
            )
            .field("environment", &self.environment)
            .field("refresh_interval", &self.refresh_interval)
            .field("metrics_interval", &self.metrics_interval)
            .field("metrics_disabled", &self.metrics_disabled)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ProviderConfig::new("http://localhost:4242/api", "app");
        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.metrics_interval, DEFAULT_METRICS_INTERVAL);
        assert!(!config.metrics_disabled);
        assert!(config.instance_id().starts_with("app-"));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(matches!(
            ProviderConfig::new("", "app").validate(),
            Err(ToggleError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProviderConfig::new("ftp://flags", "app").validate(),
            Err(ToggleError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProviderConfig::new("http://flags", "  ").validate(),
            Err(ToggleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn short_refresh_interval_is_clamped() {
        let config = ProviderConfig::new("http://flags", "app")
            .with_refresh_interval(Duration::from_millis(10));
        assert_eq!(config.effective_refresh_interval(), MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = ProviderConfig::new("http://flags", "app").with_credentials("secret-token");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
