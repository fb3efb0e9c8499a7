//! Common utilities for service clients

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ErrorContext, ServiceError};

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    pub app_name: String,

    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "analytics-sdk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: None,
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Request counters for one client instance
#[derive(Debug, Default)]
pub(crate) struct ClientMetrics {
    request_count: AtomicU64,
    error_count: AtomicU64,

    /// Per-endpoint counters (`<endpoint>_count`, `<endpoint>_avg_ms`, `status_<code>`, ...)
    endpoints: Mutex<HashMap<String, u64>>,
}

impl ClientMetrics {
    pub(crate) fn record_request(&self, endpoint: &str, status: u16, duration: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);

        let Ok(mut endpoints) = self.endpoints.lock() else {
            return;
        };
        let key = metric_key(endpoint);

        let count = {
            let count = endpoints.entry(format!("{}_count", key)).or_insert(0);
            *count += 1;
            *count
        };

        // running average
        let avg = endpoints.entry(format!("{}_avg_ms", key)).or_insert(0);
        *avg = (*avg * (count - 1) + duration.as_millis() as u64) / count;

        *endpoints.entry(format!("status_{}", status)).or_insert(0) += 1;
    }

    pub(crate) fn record_error(&self, endpoint: &str, error: &ServiceError) {
        self.error_count.fetch_add(1, Ordering::Relaxed);

        let Ok(mut endpoints) = self.endpoints.lock() else {
            return;
        };

        *endpoints
            .entry(format!("{}_errors", metric_key(endpoint)))
            .or_insert(0) += 1;

        let kind = if error.is_quota_exhausted() {
            "quota_errors"
        } else if error.is_auth_failure() {
            "auth_errors"
        } else {
            "other_errors"
        };
        *endpoints.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn as_map(&self) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = self
            .endpoints
            .lock()
            .map(|endpoints| {
                endpoints
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        map.insert(
            "request_count".to_string(),
            self.request_count.load(Ordering::Relaxed).to_string(),
        );
        map.insert(
            "error_count".to_string(),
            self.error_count.load(Ordering::Relaxed).to_string(),
        );
        map
    }

    pub(crate) fn reset(&self) {
        self.request_count.store(0, Ordering::Relaxed);
        self.error_count.store(0, Ordering::Relaxed);
        if let Ok(mut endpoints) = self.endpoints.lock() {
            endpoints.clear();
        }
    }
}

fn metric_key(endpoint: &str) -> String {
    endpoint
        .trim_matches('/')
        .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
}

/// Create error context for HTTP requests
pub(crate) fn create_error_context(
    service_name: &str,
    endpoint: &str,
    status: Option<reqwest::StatusCode>,
) -> ErrorContext {
    let mut context = ErrorContext::for_service(service_name).endpoint(endpoint);

    if let Some(status) = status {
        context = context.status(status.as_u16());
    }

    context
}

/// Turn a non-success HTTP response into a classified error
pub(crate) async fn parse_error_response(
    service_name: &str,
    endpoint: &str,
    response: reqwest::Response,
) -> ServiceError {
    let status = response.status();
    let mut context = create_error_context(service_name, endpoint, Some(status));

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    crate::error::mapping::map_http_error(status, &body, &mut context).with_context(context)
}
