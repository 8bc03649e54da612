//! Enrichment of captured API traffic with GraphQL analytics.
//!
//! An [AnalyticsRecord] carries the raw HTTP request and response of one API call, base64
//! encoded, and optionally the SDL of the API. [Extractor::to_graph_record()] turns records
//! tagged for GraphQL analytics into a [GraphRecord]:
//!
//! - the operation kind, derived syntactically from the query text with [classify()],
//! - the fields selected on each type, resolved against the schema with [FieldUsage],
//! - the request variables, as canonical JSON,
//! - the errors reported in the response.

#![cfg_attr(test, allow(unused_crate_dependencies))]

mod body;
mod classify;
mod config;
mod error;
mod extractor;
mod field_usage;
mod lexer;
mod operation;
mod raw_http;
mod record;
mod schema;

pub use body::{canonical_json, RequestBody, ResponseBody};
pub use classify::{classify, OperationType};
pub use config::{ExtractorConfig, ResolutionPolicy};
pub use error::{Error, NotGraphqlReason, ResolutionGap, Stage};
pub use extractor::Extractor;
pub use field_usage::FieldUsage;
pub use operation::{Operation, OperationError};
pub use raw_http::{MalformedMessage, MessageError, RawMessage};
pub use record::{
    AnalyticsRecord, GraphError, GraphRecord, Latency, PathSegment, RecordTime, GRAPH_ANALYTICS_TAG,
};
pub use schema::{FieldId, Schema, SchemaField, SchemaType, TypeId};
