//! Core abstractions for the analytics SDK
//!
//! The bindings never talk HTTP directly; they only see the three remote
//! capabilities below. [`GoogleAnalyticsClient`] implements all of them, and
//! tests substitute fakes or mocks.
//!
//! - `MetadataApi`: lists the dimension/metric columns of a report type
//! - `ManagementApi`: lists the user's saved segments
//! - `ReportingApi`: runs a batch of report requests
//! - `ServiceClient`: identity and health of a concrete client
//! - `Telemetry`: per-client request/error counters
//! - `ClientBuilder`: builds the underlying HTTP transport
//!
//! [`GoogleAnalyticsClient`]: crate::services::google_analytics::GoogleAnalyticsClient

pub mod builder;
pub use builder::ClientBuilder;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, ServiceError};
use crate::services::google_analytics::{Columns, GetReportsRequest, GetReportsResponse, Segments};

/// Base trait for concrete service clients
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// Service version
    fn version(&self) -> &str;

    /// Cheap authenticated check of the remote service
    async fn health_check(&self) -> Result<bool>;
}

/// Column metadata listing (`metadata.columns.list`)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// List every column of `report_type` (the web reports use `"ga"`)
    async fn list_columns(&self, report_type: &str) -> Result<Columns>;
}

/// Saved segments listing (`management.segments.list`)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn list_segments(&self) -> Result<Segments>;
}

/// Report data (`reports.batchGet`)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportingApi: Send + Sync {
    async fn batch_get(&self, request: &GetReportsRequest) -> Result<GetReportsResponse>;
}

/// Trait for clients that keep request telemetry
pub trait Telemetry: Send + Sync {
    /// Record a completed request with timing
    fn record_request(&self, endpoint: &str, status: u16, duration: Duration);

    /// Record a failed request
    fn record_error(&self, endpoint: &str, error: &ServiceError);

    /// Current counters, keyed by metric name
    fn metrics(&self) -> HashMap<String, String>;

    fn reset_metrics(&self);
}
