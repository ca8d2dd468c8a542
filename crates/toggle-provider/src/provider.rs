//! Toggle provider lifecycle.
//!
//! A [`ToggleProvider`] is either uninitialized or ready. `init` moves it to
//! ready: the cache is seeded from optional bootstrap data, the client
//! registers with the backend, the first fetch runs, and background tasks
//! start polling for changes and reporting usage. `destroy` stops those tasks
//! and releases the cached state so a later `init` starts from scratch.
//!
//! Lookups are synchronous reads of the cached state and never touch the
//! network. Backend failures are logged and published as
//! [`ToggleEvent::Error`]; the provider keeps serving the last state it had.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{ClientRegistration, FetchOutcome, FlagBackend};
use crate::cache::{FlagCache, ToggleHandle};
use crate::config::{ProviderConfig, SDK_VERSION};
use crate::error::{Result, ToggleError};
use crate::events::{Observers, ToggleEvent};
use crate::feature::{FeatureDescriptor, FlagSnapshot};
use crate::http::HttpFlagBackend;
use crate::metrics::MetricsReport;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What a single refresh did to the cached state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New state was installed and observers were notified.
    Changed,
    /// The backend sent a list identical to the cached one.
    Unchanged,
    /// The backend reported that nothing changed since the last fetch.
    NotModified,
}

/// Owns the connection to a flag backend and serves synchronous lookups.
///
/// # Examples
///
/// ```no_run
/// use toggle_provider::{FeatureDescriptor, ProviderConfig, ToggleProvider};
///
/// # async fn run() -> toggle_provider::Result<()> {
/// let config = ProviderConfig::new("https://flags.example.com/api", "accounts-api");
/// let mut provider = ToggleProvider::connect(config)?;
///
/// provider
///     .init(Some(vec![FeatureDescriptor::new("user-signup", true)]))
///     .await?;
/// let signup = provider.is_enabled("user-signup")?;
///
/// provider.destroy().await;
/// # let _ = signup;
/// # Ok(())
/// # }
/// ```
pub struct ToggleProvider {
    config: ProviderConfig,
    backend: Arc<dyn FlagBackend>,
    events: broadcast::Sender<ToggleEvent>,
    lifecycle: Lifecycle,
}

enum Lifecycle {
    Uninitialized,
    Ready(ReadyState),
}

/// Resources that exist only while the provider is ready.
struct ReadyState {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for ReadyState {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// State shared between the provider and its background tasks.
struct Shared {
    backend: Arc<dyn FlagBackend>,
    cache: Arc<FlagCache>,
    observers: Observers,
    events: broadcast::Sender<ToggleEvent>,
    etag: Mutex<Option<String>>,
    synchronized: AtomicBool,
    app_name: String,
    instance_id: String,
    environment: Option<String>,
}

impl ToggleProvider {
    /// Create an uninitialized provider over any [`FlagBackend`].
    pub fn new(config: ProviderConfig, backend: Arc<dyn FlagBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            backend,
            events,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    /// Create an uninitialized provider talking HTTP to `config.url`.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or the HTTP client cannot be
    /// built. No network traffic happens until [`ToggleProvider::init`].
    pub fn connect(config: ProviderConfig) -> Result<Self> {
        let backend = HttpFlagBackend::new(&config)?;
        Ok(Self::new(config, Arc::new(backend)))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Ready(_))
    }

    /// Start serving toggles.
    ///
    /// `bootstrap` seeds the cache before the first fetch, so lookups have
    /// sensible answers even when the backend is unreachable. Calling `init`
    /// on a ready provider logs and returns without reconnecting.
    ///
    /// Backend failures do not fail `init`; they are published as
    /// [`ToggleEvent::Error`] and the seed (or an empty state) is served.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::InvalidConfig`] for unusable settings.
    pub async fn init(&mut self, bootstrap: Option<Vec<FeatureDescriptor>>) -> Result<()> {
        if self.is_ready() {
            info!(
                app_name = %self.config.app_name,
                "toggles already initialized; ignoring init"
            );
            return Ok(());
        }
        self.config.validate()?;

        let seed: FlagSnapshot = bootstrap.unwrap_or_default().into_iter().collect();
        debug!(features = seed.len(), "seeding toggle cache");

        let track_usage = !self.config.metrics_disabled;
        let shared = Arc::new(Shared {
            backend: Arc::clone(&self.backend),
            cache: Arc::new(FlagCache::new(seed, track_usage)),
            observers: Observers::default(),
            events: self.events.clone(),
            etag: Mutex::new(None),
            synchronized: AtomicBool::new(false),
            app_name: self.config.app_name.clone(),
            instance_id: self.config.instance_id(),
            environment: self.config.environment.clone(),
        });

        let refresh_interval = self.config.effective_refresh_interval();
        if track_usage {
            shared.register(refresh_interval).await;
        }
        // Failures are already reported through the event channel.
        let _ = shared.refresh().await;

        let cancel = CancellationToken::new();
        let mut tasks = vec![tokio::spawn(run_refresh_loop(
            Arc::clone(&shared),
            refresh_interval,
            cancel.clone(),
        ))];
        if track_usage {
            tasks.push(tokio::spawn(run_metrics_loop(
                Arc::clone(&shared),
                self.config.effective_metrics_interval(),
                cancel.clone(),
            )));
        }

        self.lifecycle = Lifecycle::Ready(ReadyState {
            shared,
            cancel,
            tasks,
        });
        info!(
            app_name = %self.config.app_name,
            refresh_secs = refresh_interval.as_secs(),
            "toggles initialized"
        );
        let _ = self.events.send(ToggleEvent::Ready);
        Ok(())
    }

    /// Stop background work and drop the cached state.
    ///
    /// Pending usage counters are flushed on a best-effort basis. Handles
    /// obtained from [`ToggleProvider::toggles`] keep answering from the
    /// last state they saw. Does nothing on an uninitialized provider.
    pub async fn destroy(&mut self) {
        let mut state = match std::mem::replace(&mut self.lifecycle, Lifecycle::Uninitialized) {
            Lifecycle::Ready(state) => state,
            Lifecycle::Uninitialized => {
                debug!("toggles not initialized; nothing to destroy");
                return;
            }
        };

        state.cancel.cancel();
        for task in std::mem::take(&mut state.tasks) {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "toggle background task ended abnormally");
                }
            }
        }

        if !self.config.metrics_disabled {
            let flush = state.shared.flush_metrics();
            if tokio::time::timeout(self.config.request_timeout, flush)
                .await
                .is_err()
            {
                warn!("final toggle metrics report timed out");
            }
        }
        state.shared.observers.clear();
        info!(app_name = %self.config.app_name, "toggles destroyed");
    }

    /// Resolve a feature against the cached state. Unknown names are
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::NotInitialized`] before `init`.
    pub fn is_enabled(&self, name: &str) -> Result<bool> {
        Ok(self.ready()?.shared.cache.is_enabled(name))
    }

    /// Register a callback run after every refresh that changes the cached
    /// state. Callbacks run on the refreshing task, once per change, and are
    /// dropped by `destroy`.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::NotInitialized`] before `init`.
    pub fn on_change<F>(&self, handler: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let shared = &self.ready()?.shared;
        shared.observers.register(Arc::new(handler));
        debug!(observers = shared.observers.len(), "registered toggle change observer");
        Ok(())
    }

    /// Receive lifecycle events. Subscribing is allowed at any time, so
    /// callers can observe `init` itself.
    pub fn subscribe(&self) -> broadcast::Receiver<ToggleEvent> {
        self.events.subscribe()
    }

    /// A cloneable lookup handle sharing the live cache.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::NotInitialized`] before `init`.
    pub fn toggles(&self) -> Result<ToggleHandle> {
        Ok(ToggleHandle::new(Arc::clone(&self.ready()?.shared.cache)))
    }

    /// Private copy of the current flag state.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::NotInitialized`] before `init`.
    pub fn snapshot(&self) -> Result<FlagSnapshot> {
        Ok(self.ready()?.shared.cache.current().as_ref().clone())
    }

    /// Fetch from the backend now instead of waiting for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::NotInitialized`] before `init`, or the backend
    /// error (which is also published as [`ToggleEvent::Error`]).
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.ready()?.shared.refresh().await
    }

    fn ready(&self) -> Result<&ReadyState> {
        match &self.lifecycle {
            Lifecycle::Ready(state) => Ok(state),
            Lifecycle::Uninitialized => Err(ToggleError::NotInitialized),
        }
    }
}

impl fmt::Debug for ToggleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToggleProvider")
            .field("config", &self.config)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl Shared {
    fn emit(&self, event: ToggleEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    async fn register(&self, refresh_interval: Duration) {
        let registration = ClientRegistration {
            app_name: self.app_name.clone(),
            instance_id: self.instance_id.clone(),
            sdk_version: SDK_VERSION.to_string(),
            strategies: vec!["default".to_string()],
            started: Utc::now(),
            interval: refresh_interval.as_millis() as u64,
            environment: self.environment.clone(),
        };
        match self.backend.register(&registration).await {
            Ok(()) => {
                debug!(instance_id = %self.instance_id, "client registered");
                self.emit(ToggleEvent::Registered);
            }
            Err(err) => {
                warn!(error = %err, "client registration failed");
                self.emit(ToggleEvent::Error(err.to_string()));
            }
        }
    }

    async fn refresh(&self) -> Result<RefreshOutcome> {
        let mut etag = self.etag.lock().await;
        let fetched = match self.backend.fetch_features(etag.as_deref()).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!(error = %err, "feature fetch failed; serving last known toggles");
                self.emit(ToggleEvent::Error(err.to_string()));
                return Err(err);
            }
        };

        let outcome = match fetched {
            FetchOutcome::NotModified => RefreshOutcome::NotModified,
            FetchOutcome::Modified { features, etag: next } => {
                *etag = next;
                let snapshot: FlagSnapshot = features.into_iter().collect();
                let count = snapshot.len();
                if self.cache.replace(snapshot) {
                    info!(features = count, "toggles changed");
                    self.emit(ToggleEvent::Changed);
                    self.observers.notify();
                    RefreshOutcome::Changed
                } else {
                    RefreshOutcome::Unchanged
                }
            }
        };

        if !self.synchronized.swap(true, Ordering::AcqRel) {
            self.emit(ToggleEvent::Synchronized);
        }
        debug!(?outcome, "toggle refresh complete");
        Ok(outcome)
    }

    async fn flush_metrics(&self) {
        let Some(bucket) = self.cache.drain_usage() else {
            return;
        };
        if bucket.is_empty() {
            return;
        }
        let report = MetricsReport {
            app_name: self.app_name.clone(),
            instance_id: self.instance_id.clone(),
            environment: self.environment.clone(),
            bucket,
        };
        if let Err(err) = self.backend.send_metrics(&report).await {
            warn!(error = %err, "failed to send toggle metrics");
            self.emit(ToggleEvent::Error(err.to_string()));
        }
    }
}

async fn run_refresh_loop(shared: Arc<Shared>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; init has just fetched.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("toggle refresh loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                // An in-flight fetch must not hold up shutdown.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("toggle refresh cancelled mid-fetch");
                        break;
                    }
                    _ = shared.refresh() => {}
                }
            }
        }
    }
}

async fn run_metrics_loop(shared: Arc<Shared>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("toggle metrics loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("toggle metrics report cancelled mid-send");
                        break;
                    }
                    _ = shared.flush_metrics() => {}
                }
            }
        }
    }
}
