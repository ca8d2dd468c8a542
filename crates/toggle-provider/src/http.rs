//! HTTP client for Unleash-compatible flag servers.
//!
//! Endpoints used, relative to the configured base URL:
//!
//! - `GET  /client/features` — feature list, honouring `ETag`/`If-None-Match`
//! - `POST /client/register` — client registration
//! - `POST /client/metrics`  — usage counters

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, ETAG, IF_NONE_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::backend::{ClientRegistration, FetchOutcome, FlagBackend};
use crate::config::ProviderConfig;
use crate::error::{Result, ToggleError};
use crate::feature::FeaturesResponse;
use crate::metrics::MetricsReport;

const APP_NAME_HEADER: &str = "UNLEASH-APPNAME";
const INSTANCE_ID_HEADER: &str = "UNLEASH-INSTANCEID";

/// [`FlagBackend`] speaking the Unleash client API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFlagBackend {
    client: Client,
    base_url: String,
    app_name: String,
    instance_id: String,
    credentials: Option<String>,
}

impl HttpFlagBackend {
    /// Build a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleError::InvalidConfig`] for unusable settings and
    /// [`ToggleError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            app_name: config.app_name.clone(),
            instance_id: config.instance_id(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/client/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(APP_NAME_HEADER, &self.app_name)
            .header(INSTANCE_ID_HEADER, &self.instance_id);
        if let Some(credentials) = &self.credentials {
            builder = builder.header(AUTHORIZATION, credentials);
        }
        builder
    }
}

/// Map non-success statuses to [`ToggleError::Status`].
fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ToggleError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FlagBackend for HttpFlagBackend {
    async fn fetch_features(&self, etag: Option<&str>) -> Result<FetchOutcome> {
        let url = self.endpoint("features");
        let mut request = self.request(Method::GET, &url);
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_MODIFIED {
            debug!(url = %url, "features not modified");
            return Ok(FetchOutcome::NotModified);
        }
        let response = check_status(response, &url)?;

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body: FeaturesResponse = response.json().await?;
        debug!(url = %url, features = body.features.len(), "fetched features");

        Ok(FetchOutcome::Modified {
            features: body.features,
            etag,
        })
    }

    async fn register(&self, registration: &ClientRegistration) -> Result<()> {
        let url = self.endpoint("register");
        let response = self
            .request(Method::POST, &url)
            .json(registration)
            .send()
            .await?;
        check_status(response, &url)?;
        Ok(())
    }

    async fn send_metrics(&self, report: &MetricsReport) -> Result<()> {
        let url = self.endpoint("metrics");
        let response = self
            .request(Method::POST, &url)
            .json(report)
            .send()
            .await?;
        check_status(response, &url)?;
        Ok(())
    }
}
