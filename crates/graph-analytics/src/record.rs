use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{classify::OperationType, Error, Extractor};

/// The tag marking an analytics record as a GraphQL call.
pub const GRAPH_ANALYTICS_TAG: &str = "graph-analytics";

/// One captured API exchange, as produced by the capture pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsRecord {
    pub method: String,
    pub host: String,
    pub path: String,
    pub raw_path: String,
    pub content_length: i64,
    pub user_agent: String,
    pub response_code: u16,
    pub api_key: String,
    #[serde(flatten)]
    pub time: RecordTime,
    pub api_version: String,
    pub api_name: String,
    pub api_id: String,
    pub org_id: String,
    pub oauth_id: String,
    /// Total request time in milliseconds.
    pub request_time: i64,
    pub latency: Latency,
    /// The raw HTTP request, base64 encoded.
    pub raw_request: String,
    /// The raw HTTP response, base64 encoded.
    pub raw_response: String,
    pub ip_address: String,
    pub tags: Vec<String>,
    pub alias: String,
    pub track_path: bool,
    /// The SDL of the API at capture time, base64 encoded. Empty when unknown.
    pub api_schema: String,
}

impl AnalyticsRecord {
    /// Whether the record is tagged as a GraphQL call.
    pub fn is_graph_record(&self) -> bool {
        self.has_tag(GRAPH_ANALYTICS_TAG)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    /// Converts the record with the default [`Extractor`].
    pub fn to_graph_record(&self) -> Result<GraphRecord, Error> {
        Extractor::default().to_graph_record(self)
    }
}

/// The capture timestamp with its denormalized calendar fields, which can only be derived
/// from the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Timestamp")]
pub struct RecordTime {
    timestamp: DateTime<Utc>,
    day: u8,
    month: u8,
    year: i32,
    hour: u8,
}

impl RecordTime {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        RecordTime {
            timestamp,
            day: timestamp.day() as u8,
            month: timestamp.month() as u8,
            year: timestamp.year(),
            hour: timestamp.hour() as u8,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }
}

impl Default for RecordTime {
    fn default() -> Self {
        RecordTime::new(DateTime::<Utc>::default())
    }
}

impl From<DateTime<Utc>> for RecordTime {
    fn from(timestamp: DateTime<Utc>) -> Self {
        RecordTime::new(timestamp)
    }
}

#[derive(Deserialize)]
struct Timestamp {
    #[serde(default)]
    timestamp: DateTime<Utc>,
}

impl From<Timestamp> for RecordTime {
    fn from(Timestamp { timestamp }: Timestamp) -> Self {
        RecordTime::new(timestamp)
    }
}

/// Latencies in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Latency {
    pub total: i64,
    pub upstream: i64,
}

/// An analytics record enriched with the GraphQL operation it carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    #[serde(flatten)]
    pub record: AnalyticsRecord,
    pub operation_type: OperationType,
    /// Type name -> names of the fields selected on that type.
    pub types: BTreeMap<String, Vec<String>>,
    /// Fields selected on the root operation type.
    pub root_fields: Vec<String>,
    /// The request variables as base64 encoded JSON, empty without variables.
    pub variables: String,
    pub has_errors: bool,
    pub errors: Vec<GraphError>,
}

/// An error reported in a GraphQL response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphError {
    pub message: String,
    pub path: Vec<PathSegment>,
}

impl GraphError {
    pub(crate) fn from_json(entry: &Value) -> Self {
        let message = entry
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let path = entry
            .get("path")
            .and_then(Value::as_array)
            .map(|segments| {
                segments
                    .iter()
                    .filter_map(|segment| {
                        let converted = PathSegment::from_json(segment);

                        if converted.is_none() {
                            tracing::debug!(%segment, "dropping an invalid error path segment");
                        }

                        converted
                    })
                    .collect()
            })
            .unwrap_or_default();

        GraphError { message, path }
    }
}

/// A step in a response path: a field name or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(u64),
    /// A number that is not a valid index, such as `-1` or `1.5`, kept as sent.
    Number(serde_json::Number),
}

impl PathSegment {
    fn from_json(segment: &Value) -> Option<Self> {
        match segment {
            Value::String(field) => Some(PathSegment::Field(field.clone())),
            Value::Number(number) => Some(
                number
                    .as_u64()
                    .map_or_else(|| PathSegment::Number(number.clone()), PathSegment::Index),
            ),
            _ => None,
        }
    }
}

impl From<&str> for PathSegment {
    fn from(field: &str) -> Self {
        PathSegment::Field(field.to_owned())
    }
}

impl From<u64> for PathSegment {
    fn from(index: u64) -> Self {
        PathSegment::Index(index)
    }
}
