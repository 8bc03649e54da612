use serde::Deserialize;

use crate::{error::ResolutionGap, record::GRAPH_ANALYTICS_TAG, Error};

/// Extractor configuration, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Records carrying this tag are converted.
    pub graph_tag: String,
    pub schema_resolution: ResolutionPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            graph_tag: GRAPH_ANALYTICS_TAG.to_owned(),
            schema_resolution: ResolutionPolicy::default(),
        }
    }
}

/// What happens when the operation cannot be fully mapped onto the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Unresolvable selections are skipped, an unparsable schema or query yields no field
    /// usage at all.
    #[default]
    Lenient,
    /// Any gap fails the conversion.
    Strict,
}

impl ResolutionPolicy {
    pub(crate) fn on_gap(self, gap: ResolutionGap) -> Result<(), Error> {
        match self {
            ResolutionPolicy::Strict => Err(Error::SchemaResolution(gap)),
            ResolutionPolicy::Lenient if gap.is_document_level() => {
                tracing::warn!("field usage unavailable, {gap}");
                Ok(())
            }
            ResolutionPolicy::Lenient => {
                tracing::debug!("skipping an unresolved selection, {gap}");
                Ok(())
            }
        }
    }
}
