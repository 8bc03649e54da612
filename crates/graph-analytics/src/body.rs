//! Interpretation of GraphQL request and response bodies.

use serde_json::{Map, Value};

use crate::record::GraphError;

/// A GraphQL-over-HTTP request body.
///
/// Bodies that are valid JSON but not an object (batched requests for instance) carry no
/// query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody {
    query: Option<String>,
    operation_name: Option<String>,
    variables: Option<Value>,
}

impl RequestBody {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let Value::Object(mut fields) = serde_json::from_slice::<Value>(body)? else {
            return Ok(RequestBody::default());
        };

        Ok(RequestBody {
            query: take_string(&mut fields, "query"),
            operation_name: take_string(&mut fields, "operationName"),
            variables: fields.remove("variables").filter(|variables| !variables.is_null()),
        })
    }

    /// The query text, when the body has a string `query`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    /// The request variables. `None` when the body has no `variables` (or a `null` one), which
    /// is not the same as an empty object.
    pub fn variables(&self) -> Option<&Value> {
        self.variables.as_ref()
    }
}

/// A GraphQL response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseBody {
    data: Option<Value>,
    errors: Option<Value>,
}

impl ResponseBody {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let Value::Object(mut fields) = serde_json::from_slice::<Value>(body)? else {
            return Ok(ResponseBody::default());
        };

        Ok(ResponseBody {
            data: fields.remove("data"),
            errors: fields.remove("errors"),
        })
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// One entry per element of a non-empty top-level `errors` array, empty otherwise.
    pub fn errors(&self) -> Vec<GraphError> {
        match &self.errors {
            Some(Value::Array(entries)) => entries.iter().map(GraphError::from_json).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                tracing::debug!(errors = %other, "ignoring a response `errors` entry that is not an array");
                Vec::new()
            }
        }
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key)? {
        Value::String(value) => Some(value),
        _ => None,
    }
}

/// Serializes JSON without whitespace and with object keys in sorted order, so that equal
/// values always produce the same text.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut entries = fields.iter().collect::<Vec<_>>();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
