use std::fmt;

use crate::raw_http::{MalformedMessage, MessageError};

/// The part of an analytics record a conversion failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The captured raw request.
    Request,
    /// The captured raw response.
    Response,
    /// The API schema attached to the record.
    Schema,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Request => "request",
            Stage::Response => "response",
            Stage::Schema => "schema",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record tagged for GraphQL analytics could not be treated as a GraphQL call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotGraphqlReason {
    /// The record does not carry the GraphQL analytics tag.
    MissingTag,
    /// The request body has no `query` string.
    MissingQuery,
    /// The query text does not start with a recognizable operation.
    UnknownOperation,
}

impl fmt::Display for NotGraphqlReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            NotGraphqlReason::MissingTag => "the record is not tagged for graph analytics",
            NotGraphqlReason::MissingQuery => "the request body has no query string",
            NotGraphqlReason::UnknownOperation => "the query does not contain a recognizable operation",
        };

        f.write_str(reason)
    }
}

/// Something in the operation that could not be mapped onto the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionGap {
    /// The attached SDL does not parse.
    InvalidSchema(String),
    /// The query does not parse, or has no operation with the requested name.
    InvalidOperation(String),
    /// The parent type has no such field.
    UnknownField { type_name: String, field_name: String },
    /// The type a field is selected on could not be determined.
    UnknownParent { field_name: String },
    /// A spread names a fragment the document does not define.
    UnknownFragment(String),
}

impl ResolutionGap {
    /// Gaps that make the whole field usage unavailable, as opposed to a single selection.
    pub fn is_document_level(&self) -> bool {
        matches!(self, ResolutionGap::InvalidSchema(_) | ResolutionGap::InvalidOperation(_))
    }
}

impl fmt::Display for ResolutionGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionGap::InvalidSchema(error) => write!(f, "the schema does not parse: {error}"),
            ResolutionGap::InvalidOperation(error) => write!(f, "the operation does not parse: {error}"),
            ResolutionGap::UnknownField { type_name, field_name } => {
                write!(f, "type `{type_name}` has no field `{field_name}`")
            }
            ResolutionGap::UnknownParent { field_name } => {
                write!(f, "the parent type of field `{field_name}` is unknown")
            }
            ResolutionGap::UnknownFragment(name) => write!(f, "fragment `{name}` is not defined"),
        }
    }
}

/// The conversion error type. Every variant aborts the conversion of a record.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The base64 payload of a stage could not be decoded.
    #[error("decoding the {stage} payload: {source}")]
    Decode {
        stage: Stage,
        #[source]
        source: base64::DecodeError,
    },
    /// The raw HTTP message framing is inconsistent.
    #[error("malformed raw {stage} message: {source}")]
    MalformedMessage {
        stage: Stage,
        #[source]
        source: MalformedMessage,
    },
    /// A body is not valid JSON.
    #[error("parsing the {stage} body: {source}")]
    Parse {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },
    #[error("not a GraphQL record: {0}")]
    NotGraphql(NotGraphqlReason),
    /// Only produced with the strict resolution policy.
    #[error("resolving the operation against the schema: {0}")]
    SchemaResolution(ResolutionGap),
}

impl Error {
    pub(crate) fn from_message(stage: Stage, error: MessageError) -> Self {
        match error {
            MessageError::Decode(source) => Error::Decode { stage, source },
            MessageError::Malformed(source) => Error::MalformedMessage { stage, source },
        }
    }

    /// The stage the error originates from, if it is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Decode { stage, .. } | Error::MalformedMessage { stage, .. } | Error::Parse { stage, .. } => {
                Some(*stage)
            }
            Error::NotGraphql(_) => None,
            Error::SchemaResolution(_) => Some(Stage::Schema),
        }
    }
}
