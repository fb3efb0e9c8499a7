//! # Analytics SDK
//!
//! Reactive bindings over the Google Analytics APIs for request-composer
//! style front-ends.
//!
//! This crate provides:
//!
//! - Capability traits for the three remote operations the bindings use
//! - A typed HTTP client implementing them (`GoogleAnalyticsClient`)
//! - Observable bindings: dimensions/metrics, saved segments, and report
//!   requests with long-running-request detection
//! - Error handling, configuration and logging utilities
//!
//! ## Architecture
//!
//! - `Session`: publishes the authenticated `RemoteClientHandle` (or `None`)
//! - `DimensionsAndMetrics`, `SavedSegments`: recompute whenever the handle changes
//! - `ReportRequester`: `trigger()` runs `reports.batchGet` through a
//!   `LongRequestDetector`, exposing `response`, `is_slow` and `last_error`
//! - `ServiceError`: error taxonomy shared by everything above

pub mod core;
pub use crate::core::{ClientBuilder, ManagementApi, MetadataApi, ReportingApi, ServiceClient, Telemetry};

pub mod services;
pub use crate::services::google_analytics::{self, GoogleAnalyticsClient};

pub mod bindings;
pub use crate::bindings::{
    DimensionsAndMetrics, LongRequestDetector, RemoteClientHandle, ReportRequester, SavedSegments, Session,
};

pub mod error;
pub use crate::error::{ErrorContext, Result, ServiceError};

pub mod config;
pub use crate::config::{AnalyticsConfig, ConfigProvider, DetectorConfig, ServiceConfig};

pub mod logging;

mod util;

#[cfg(test)]
mod tests;

/// Build a client from the `GA_*` environment variables
pub fn analytics_client() -> Result<GoogleAnalyticsClient> {
    GoogleAnalyticsClient::from_env()
}
