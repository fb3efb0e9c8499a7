//! Google Analytics data models
//!
//! Only the fields the bindings read are typed; everything else the APIs
//! return is preserved in `extra` maps so nothing is lost on the way to the
//! consumer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `attributes.type` of a metadata column
///
/// Tags other than `DIMENSION` and `METRIC` are kept verbatim in `Other`
/// and serialize back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    Dimension,
    Metric,
    Other(String),
}

impl From<String> for ColumnType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "DIMENSION" => ColumnType::Dimension,
            "METRIC" => ColumnType::Metric,
            _ => ColumnType::Other(tag),
        }
    }
}

impl From<ColumnType> for String {
    fn from(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Dimension => "DIMENSION".to_string(),
            ColumnType::Metric => "METRIC".to_string(),
            ColumnType::Other(tag) => tag,
        }
    }
}

/// Attributes of a metadata column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAttributes {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `PUBLIC` or `DEPRECATED`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A dimension or metric available for reporting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column id, e.g. `ga:sessions`
    #[serde(default)]
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ColumnAttributes>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Column {
    pub fn column_type(&self) -> Option<&ColumnType> {
        self.attributes.as_ref()?.column_type.as_ref()
    }

    pub fn is_dimension(&self) -> bool {
        self.column_type() == Some(&ColumnType::Dimension)
    }

    pub fn is_metric(&self) -> bool {
        self.column_type() == Some(&ColumnType::Metric)
    }
}

/// Response of `metadata.columns.list`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Columns {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Column>>,

    /// `attributeNames` and anything else the listing carries
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A saved segment (user-defined or built-in)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub id: String,

    /// Identifier to use in report requests, e.g. `gaid::-3`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// `BUILT_IN` or `CUSTOM`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub segment_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `management.segments.list`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Segment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// Sampling level of a report request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SamplingLevel {
    #[default]
    Default,
    Small,
    Large,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// `YYYY-MM-DD` or relative (`7daysAgo`, `today`)
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub expression: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatting_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub histogram_buckets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRef {
    pub segment_id: String,
}

/// One report query inside a [`GetReportsRequest`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub view_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_ranges: Vec<DateRange>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<Metric>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Dimension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<SegmentRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters_expression: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_level: Option<SamplingLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_empty_rows: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_totals: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_value_ranges: Option<bool>,

    /// Order-bys, filter clauses, pivots, cohorts and anything else passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `reports.batchGet`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReportsRequest {
    pub report_requests: Vec<ReportRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_resource_quotas: Option<bool>,
}

impl GetReportsRequest {
    /// Wrap a single report query
    pub fn single(request: ReportRequest) -> Self {
        Self {
            report_requests: vec![request],
            use_resource_quotas: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricHeaderEntry {
    pub name: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricHeader {
    #[serde(default)]
    pub metric_header_entries: Vec<MetricHeaderEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHeader {
    #[serde(default)]
    pub dimensions: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_header: Option<MetricHeader>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRangeValues {
    #[serde(default)]
    pub values: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(default)]
    pub dimensions: Vec<String>,

    #[serde(default)]
    pub metrics: Vec<DateRangeValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(default)]
    pub rows: Vec<ReportRow>,

    #[serde(default)]
    pub totals: Vec<DateRangeValues>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_data_golden: Option<bool>,

    /// Sampling info, minimums, maximums, data-last-refreshed, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_header: Option<ColumnHeader>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReportData>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Response of `reports.batchGet`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReportsResponse {
    #[serde(default)]
    pub reports: Vec<Report>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_cost: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_quotas_remaining: Option<Value>,
}
