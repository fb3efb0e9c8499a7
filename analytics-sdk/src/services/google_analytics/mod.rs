//! Google Analytics HTTP client
//!
//! Implements the metadata, management and reporting capabilities over the
//! public REST endpoints:
//!
//! - `GET  {analytics_base}/metadata/{reportType}/columns`
//! - `GET  {analytics_base}/management/segments`
//! - `POST {reporting_base}/reports:batchGet`
//!
//! The client is stateless apart from its telemetry counters. Tokens are
//! never refreshed here; the host signs the user in and builds a new client
//! (and a new [`RemoteClientHandle`](crate::bindings::RemoteClientHandle))
//! when the token changes.

mod models;
pub use models::*;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::{AnalyticsConfig, ConfigProvider, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::{ClientBuilder, ManagementApi, MetadataApi, ReportingApi, ServiceClient, Telemetry};
use crate::error::{Result, ServiceError};
use crate::services::common::{parse_error_response, ClientMetrics};
use crate::services::UserAgent;
use crate::util::{generate_request_id, measure_time_async, sanitize_for_logging};

const SERVICE_NAME: &str = "google_analytics";

/// Report type of the Core Reporting columns
pub const CORE_REPORT_TYPE: &str = "ga";

/// Google Analytics client
pub struct GoogleAnalyticsClient {
    http_client: Client,

    config: AnalyticsConfig,

    metrics: ClientMetrics,
}

impl GoogleAnalyticsClient {
    /// Create a client from an explicit configuration
    pub fn new_with_config(config: AnalyticsConfig) -> Result<Self> {
        config.validate()?;

        let http_client = ClientBuilder::new()
            .access_token(config.access_token.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(UserAgent {
                extra: Some("GoogleAnalytics-Client".to_string()),
                ..UserAgent::default()
            })
            .build_http_client()?;

        Ok(Self {
            http_client,
            config,
            metrics: ClientMetrics::default(),
        })
    }

    /// Create a client from the `GA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new_with_config(AnalyticsConfig::from_provider(&**DEFAULT_PROVIDER)?)
    }

    pub fn builder() -> GoogleAnalyticsClientBuilder {
        GoogleAnalyticsClientBuilder::default()
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    fn endpoint_url(base: &str, path: &str) -> Result<Url> {
        let joined = format!("{}/{}", base.trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| ServiceError::configuration(format!("Invalid URL {}: {}", joined, e)))
    }

    async fn get_json<R>(&self, base: &str, endpoint: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = Self::endpoint_url(base, endpoint)?;
        let request = self.http_client.get(url.clone());
        self.send(endpoint, url, request).await
    }

    async fn post_json<T, R>(&self, base: &str, endpoint: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = Self::endpoint_url(base, endpoint)?;
        let request = self.http_client.post(url.clone()).json(body);
        self.send(endpoint, url, request).await
    }

    async fn send<R>(&self, endpoint: &str, url: Url, request: reqwest::RequestBuilder) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let request_id = generate_request_id();
        debug!(%request_id, %url, "sending Google Analytics request");

        let (sent, duration) = measure_time_async(request.send()).await;
        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                let error = ServiceError::from(e).with_detail("request_id", &request_id);
                self.record_error(endpoint, &error);
                return Err(error);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error = parse_error_response(SERVICE_NAME, endpoint, response).await;
            warn!(
                %request_id,
                status = status.as_u16(),
                kind = crate::error::mapping::classify_http_error(status),
                "Google Analytics request failed: {}",
                sanitize_for_logging(&error.to_string())
            );
            self.record_error(endpoint, &error);
            return Err(error);
        }

        self.record_request(endpoint, status.as_u16(), duration);

        response.json::<R>().await.map_err(|e| {
            let error = ServiceError::parsing(format!("Failed to parse {} response: {}", endpoint, e));
            self.record_error(endpoint, &error);
            error
        })
    }
}

#[async_trait]
impl ServiceClient for GoogleAnalyticsClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn version(&self) -> &str {
        "v4"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_segments().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_auth_failure() => Err(e),
            Err(e) => {
                warn!("Google Analytics health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl MetadataApi for GoogleAnalyticsClient {
    async fn list_columns(&self, report_type: &str) -> Result<Columns> {
        if report_type.is_empty() || !report_type.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ServiceError::validation(format!("Invalid report type: {:?}", report_type)));
        }
        let endpoint = format!("metadata/{}/columns", report_type);
        self.get_json(&self.config.analytics_base_url, &endpoint).await
    }
}

#[async_trait]
impl ManagementApi for GoogleAnalyticsClient {
    async fn list_segments(&self) -> Result<Segments> {
        self.get_json(&self.config.analytics_base_url, "management/segments")
            .await
    }
}

#[async_trait]
impl ReportingApi for GoogleAnalyticsClient {
    async fn batch_get(&self, request: &GetReportsRequest) -> Result<GetReportsResponse> {
        if request.report_requests.is_empty() {
            return Err(ServiceError::validation("batchGet needs at least one report request"));
        }
        self.post_json(&self.config.reporting_base_url, "reports:batchGet", request)
            .await
    }
}

impl Telemetry for GoogleAnalyticsClient {
    fn record_request(&self, endpoint: &str, status: u16, duration: Duration) {
        self.metrics.record_request(endpoint, status, duration);
    }

    fn record_error(&self, endpoint: &str, error: &ServiceError) {
        self.metrics.record_error(endpoint, error);
    }

    fn metrics(&self) -> HashMap<String, String> {
        self.metrics.as_map()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }
}

/// Builder for [`GoogleAnalyticsClient`]
#[derive(Default)]
pub struct GoogleAnalyticsClientBuilder {
    access_token: Option<String>,
    reporting_base_url: Option<String>,
    analytics_base_url: Option<String>,
    timeout_seconds: Option<u64>,
    settings: Option<Arc<dyn ConfigProvider>>,
}

impl GoogleAnalyticsClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn reporting_base_url(mut self, url: impl Into<String>) -> Self {
        self.reporting_base_url = Some(url.into());
        self
    }

    pub fn analytics_base_url(mut self, url: impl Into<String>) -> Self {
        self.analytics_base_url = Some(url.into());
        self
    }

    /// Point both APIs at the same host (proxies, test servers)
    pub fn base_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.reporting_base_url(url.clone()).analytics_base_url(url)
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Read unset values from `provider` instead of the `GA_*` environment
    pub fn settings(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.settings = Some(provider);
        self
    }

    /// Build the client; values not set explicitly come from the settings provider, then defaults.
    ///
    /// A malformed setting is an error even when an explicit value would
    /// override it.
    pub fn build(self) -> Result<GoogleAnalyticsClient> {
        let provider: &dyn ConfigProvider = match &self.settings {
            Some(provider) => provider.as_ref(),
            None => &**DEFAULT_PROVIDER,
        };
        let mut config = AnalyticsConfig::read_optional(provider)?;

        match self.access_token {
            Some(token) => config.access_token = token,
            None => {
                if let Some(token) = provider.lookup("access_token")? {
                    config.access_token = token;
                }
            }
        }

        if let Some(url) = self.reporting_base_url {
            config.reporting_base_url = url;
        }

        if let Some(url) = self.analytics_base_url {
            config.analytics_base_url = url;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        GoogleAnalyticsClient::new_with_config(config)
    }
}
