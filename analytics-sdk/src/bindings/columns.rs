//! Dimension and metric lists derived from the column metadata

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{follow_handle, HandleReceiver};
use crate::services::google_analytics::{Column, CORE_REPORT_TYPE};

/// Split a column listing by `attributes.type`.
///
/// Columns tagged neither `DIMENSION` nor `METRIC` are left out of both lists.
pub fn split_columns(columns: Vec<Column>) -> (Vec<Column>, Vec<Column>) {
    let mut dimensions = Vec::new();
    let mut metrics = Vec::new();

    for column in columns {
        if column.is_dimension() {
            dimensions.push(column);
        } else if column.is_metric() {
            metrics.push(column);
        }
    }

    (dimensions, metrics)
}

struct ColumnState {
    dimensions: watch::Sender<Option<Vec<Column>>>,
    metrics: watch::Sender<Option<Vec<Column>>>,
}

impl ColumnState {
    fn publish(&self, dimensions: Option<Vec<Column>>, metrics: Option<Vec<Column>>) {
        self.dimensions.send_replace(dimensions);
        self.metrics.send_replace(metrics);
    }

    fn clear(&self) {
        self.dimensions.send_if_modified(|d| d.take().is_some());
        self.metrics.send_if_modified(|m| m.take().is_some());
    }
}

/// Core Reporting dimensions and metrics of the signed-in user.
///
/// Both lists are `None` until the first listing completes, and go back to
/// `None` on sign-out.
pub struct DimensionsAndMetrics {
    dimensions: watch::Receiver<Option<Vec<Column>>>,
    metrics: watch::Receiver<Option<Vec<Column>>>,
    task: JoinHandle<()>,
}

impl DimensionsAndMetrics {
    /// Start following `handles`; must be called inside a Tokio runtime
    pub fn spawn(handles: HandleReceiver) -> Self {
        let (dimensions_tx, dimensions) = watch::channel(None);
        let (metrics_tx, metrics) = watch::channel(None);
        let state = Arc::new(ColumnState {
            dimensions: dimensions_tx,
            metrics: metrics_tx,
        });

        let on_handle = {
            let state = Arc::clone(&state);
            move |handle: super::RemoteClientHandle| {
                let state = Arc::clone(&state);
                async move {
                    match handle.metadata().list_columns(CORE_REPORT_TYPE).await {
                        Ok(columns) => {
                            let (dims, mets) = split_columns(columns.items.unwrap_or_default());
                            debug!(
                                dimensions = dims.len(),
                                metrics = mets.len(),
                                "loaded column metadata"
                            );
                            state.publish(Some(dims), Some(mets));
                        }
                        Err(e) => warn!("failed to list columns: {}", e),
                    }
                }
            }
        };

        let task = follow_handle(handles, on_handle, move || state.clear());

        Self {
            dimensions,
            metrics,
            task,
        }
    }

    pub fn dimensions(&self) -> Option<Vec<Column>> {
        self.dimensions.borrow().clone()
    }

    pub fn metrics(&self) -> Option<Vec<Column>> {
        self.metrics.borrow().clone()
    }

    pub fn subscribe_dimensions(&self) -> watch::Receiver<Option<Vec<Column>>> {
        self.dimensions.clone()
    }

    pub fn subscribe_metrics(&self) -> watch::Receiver<Option<Vec<Column>>> {
        self.metrics.clone()
    }
}

impl Drop for DimensionsAndMetrics {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::google_analytics::{ColumnAttributes, ColumnType};

    fn column(id: &str, column_type: Option<ColumnType>) -> Column {
        Column {
            id: id.to_string(),
            attributes: Some(ColumnAttributes {
                column_type,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_keeps_only_tagged_columns() {
        let columns = vec![
            column("ga:city", Some(ColumnType::Dimension)),
            column("ga:sessions", Some(ColumnType::Metric)),
            column("ga:untagged", None),
            Column {
                id: "ga:no_attributes".to_string(),
                ..Default::default()
            },
            column("ga:country", Some(ColumnType::Dimension)),
            column("ga:future", Some(ColumnType::Other("CALCULATED".to_string()))),
        ];

        let (dimensions, metrics) = split_columns(columns);

        let dimension_ids: Vec<_> = dimensions.iter().map(|c| c.id.as_str()).collect();
        let metric_ids: Vec<_> = metrics.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(dimension_ids, ["ga:city", "ga:country"]);
        assert_eq!(metric_ids, ["ga:sessions"]);
    }

    #[test]
    fn test_split_empty() {
        let (dimensions, metrics) = split_columns(Vec::new());
        assert!(dimensions.is_empty());
        assert!(metrics.is_empty());
    }
}
