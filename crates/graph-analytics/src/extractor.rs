use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    body::{canonical_json, RequestBody, ResponseBody},
    classify::{classify, OperationType},
    error::{NotGraphqlReason, ResolutionGap, Stage},
    field_usage::FieldUsage,
    operation::Operation,
    raw_http::RawMessage,
    record::{AnalyticsRecord, GraphRecord},
    schema::Schema,
    Error, ExtractorConfig,
};

/// Converts analytics records into GraphQL analytics records.
///
/// Conversion is a pure function of the record and the configuration: converting the same
/// record twice gives equal results.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Extractor { config }
    }

    /// Whether the record carries the configured GraphQL tag.
    pub fn is_graph_record(&self, record: &AnalyticsRecord) -> bool {
        record.has_tag(&self.config.graph_tag)
    }

    #[tracing::instrument(skip_all, fields(api_id = %record.api_id))]
    pub fn to_graph_record(&self, record: &AnalyticsRecord) -> Result<GraphRecord, Error> {
        if !self.is_graph_record(record) {
            return Err(Error::NotGraphql(NotGraphqlReason::MissingTag));
        }

        let request =
            RawMessage::from_base64(&record.raw_request).map_err(|error| Error::from_message(Stage::Request, error))?;
        let response =
            RawMessage::from_base64(&record.raw_response).map_err(|error| Error::from_message(Stage::Response, error))?;

        let request = RequestBody::from_slice(request.body()).map_err(|source| Error::Parse {
            stage: Stage::Request,
            source,
        })?;
        let response = ResponseBody::from_slice(response.body()).map_err(|source| Error::Parse {
            stage: Stage::Response,
            source,
        })?;

        let query = request
            .query()
            .ok_or(Error::NotGraphql(NotGraphqlReason::MissingQuery))?;
        let operation_name = request.operation_name();

        let classified =
            classify(query, operation_name).ok_or(Error::NotGraphql(NotGraphqlReason::UnknownOperation))?;

        let schema = self.schema(&record.api_schema)?;
        let (operation_type, usage) = self.field_usage(query, operation_name, &schema)?;
        let operation_type = operation_type.unwrap_or(classified);
        let (types, root_fields) = usage.into_parts();

        let variables = request
            .variables()
            .map(|variables| STANDARD.encode(canonical_json(variables)))
            .unwrap_or_default();

        let errors = response.errors();

        tracing::debug!(%operation_type, types = types.len(), errors = errors.len(), "converted record");

        Ok(GraphRecord {
            record: record.clone(),
            operation_type,
            types,
            root_fields,
            variables,
            has_errors: !errors.is_empty(),
            errors,
        })
    }

    /// An empty schema stands for an unknown one.
    fn schema(&self, encoded: &str) -> Result<Schema, Error> {
        if encoded.is_empty() {
            return Ok(Schema::default());
        }

        let sdl = STANDARD.decode(encoded).map_err(|source| Error::Decode {
            stage: Stage::Schema,
            source,
        })?;

        match Schema::parse(&String::from_utf8_lossy(&sdl)) {
            Ok(schema) => Ok(schema),
            Err(error) => {
                self.config
                    .schema_resolution
                    .on_gap(ResolutionGap::InvalidSchema(error.to_string()))?;

                Ok(Schema::default())
            }
        }
    }

    /// The usage of the selected operation, with its type when the query parses.
    fn field_usage(
        &self,
        query: &str,
        operation_name: Option<&str>,
        schema: &Schema,
    ) -> Result<(Option<OperationType>, FieldUsage), Error> {
        let policy = self.config.schema_resolution;

        match Operation::parse(query, operation_name) {
            Ok(operation) => {
                let usage = FieldUsage::collect(&operation, schema, policy)?;

                Ok((Some(operation.operation_type()), usage))
            }
            Err(error) => {
                policy.on_gap(ResolutionGap::InvalidOperation(error.to_string()))?;

                Ok((None, FieldUsage::default()))
            }
        }
    }
}
