//! Request Composer Example
//!
//! Signs in with an access token, waits for the column and segment lists,
//! then runs one report request and prints the slow indicator as it changes.
//!
//! To run this example:
//! ```
//! GA_ACCESS_TOKEN=ya29... GA_VIEW_ID=123456 cargo run --example request_composer
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use analytics_sdk::{
    analytics_client,
    bindings::{DimensionsAndMetrics, RemoteClientHandle, ReportRequester, SavedSegments, Session},
    config::{ConfigProvider, ConfigProviderExt, DetectorConfig, DEFAULT_PROVIDER},
    google_analytics::{DateRange, Dimension, GetReportsRequest, Metric, ReportRequest},
    logging::{init_logging, LoggingConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(Some(LoggingConfig {
        level: "debug".to_string(),
        ..LoggingConfig::default()
    }))?;

    let provider: &dyn ConfigProvider = &**DEFAULT_PROVIDER;
    let view_id = provider
        .get_string("view_id")
        .context("Please set the GA_VIEW_ID environment variable")?;
    let detector = DetectorConfig::from_provider(provider)?;

    let client = analytics_client().context("Please set the GA_ACCESS_TOKEN environment variable")?;

    let session = Session::new();
    let columns = DimensionsAndMetrics::spawn(session.subscribe());
    let segments = SavedSegments::spawn(session.subscribe());
    let mut requester = ReportRequester::new(session.subscribe(), detector);

    session.sign_in(RemoteClientHandle::new(Arc::new(client)));

    let mut metrics_rx = columns.subscribe_metrics();
    let mut segments_rx = segments.subscribe();
    let wait = Duration::from_secs(provider.get_int_or("timeout_seconds", 30)?.max(1) as u64);
    tokio::time::timeout(wait, async {
        let _ = metrics_rx.wait_for(|m| m.is_some()).await;
        let _ = segments_rx.wait_for(|s| s.is_some()).await;
    })
    .await
    .context("Timed out loading columns and segments")?;

    let dimensions = columns.dimensions().unwrap_or_default();
    let metrics = columns.metrics().unwrap_or_default();
    println!("{} dimensions, {} metrics available", dimensions.len(), metrics.len());
    for segment in segments.get().unwrap_or_default().iter().take(5) {
        println!("  segment {:>12}  {}", segment.segment_id.as_deref().unwrap_or("-"), segment.name);
    }

    requester.set_request(Some(GetReportsRequest::single(ReportRequest {
        view_id,
        date_ranges: vec![DateRange {
            start_date: "30daysAgo".to_string(),
            end_date: "yesterday".to_string(),
        }],
        metrics: vec![Metric {
            expression: "ga:sessions".to_string(),
            ..Default::default()
        }],
        dimensions: vec![Dimension {
            name: "ga:country".to_string(),
            ..Default::default()
        }],
        page_size: Some(10),
        ..Default::default()
    })));

    let mut slow_rx = requester.subscribe_slow();
    let watcher = tokio::spawn(async move {
        while slow_rx.changed().await.is_ok() {
            if *slow_rx.borrow_and_update() {
                println!("Still working...");
            }
        }
    });

    let cycle = requester.trigger().context("No request to run")?;
    cycle.await?;

    if let Some(error) = requester.last_error() {
        eprintln!("Report request failed: {}", error);
    } else if let Some(response) = requester.response() {
        for report in &response.reports {
            for row in report.data.iter().flat_map(|data| &data.rows) {
                let values = row.metrics.first().map(|m| m.values.join(", ")).unwrap_or_default();
                println!("{:<30} {}", row.dimensions.join(" / "), values);
            }
        }
    }

    watcher.abort();
    Ok(())
}
