//! Conversion orchestrator: one parse into the universal model, one emit per
//! requested target.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codec::{avro, json_schema, xsd};
use crate::config::{ConvertOptions, SchemaFormat};
use crate::diagnostics::ConversionStats;
use crate::error::ConvertError;
use crate::model::UniversalSchema;

/// Result of one conversion call.
///
/// Formats that were not requested hold empty strings. On failure `error` is
/// set and the code/message fields describe why; the output strings are
/// empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConvertOutcome {
    pub json_schema: String,
    pub avro_schema: String,
    pub xsd: String,
    pub error: bool,
    pub error_code: String,
    pub error_message: String,
    pub stats: ConversionStats,
}

impl ConvertOutcome {
    fn failure(err: &ConvertError) -> Self {
        Self {
            error: true,
            error_code: err.code().to_string(),
            error_message: err.to_string(),
            ..Self::default()
        }
    }
}

/// Convert a source schema into every requested target format.
///
/// Never panics and never aborts the caller: every failure is returned as an
/// outcome with the error fields populated, so a caller processing a batch of
/// schemas can skip a bad one and continue.
pub fn convert(source_text: &str, options: &ConvertOptions) -> ConvertOutcome {
    match try_convert(source_text, options) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!("conversion failed: {err}");
            ConvertOutcome::failure(&err)
        }
    }
}

/// Fallible variant of [`convert`] for callers who prefer `?`-style handling.
pub fn try_convert(
    source_text: &str,
    options: &ConvertOptions,
) -> Result<ConvertOutcome, ConvertError> {
    if source_text.trim().is_empty() {
        return Err(ConvertError::InvalidInput(
            "source schema text is required and cannot be empty".to_string(),
        ));
    }
    if options.targets.is_empty() {
        return Err(ConvertError::InvalidInput(
            "at least one target format must be requested".to_string(),
        ));
    }

    let mut stats = ConversionStats::default();

    debug!(source = %options.source, "parsing source schema");
    let tree = parse_source(source_text, options, &mut stats)?;
    stats.tally(&tree, options.max_depth)?;

    let mut outcome = ConvertOutcome::default();
    if options.wants(SchemaFormat::Jsonschema) {
        debug!("emitting JSON Schema");
        outcome.json_schema = json_schema::emit(&tree, options, &mut stats)?;
    }
    if options.wants(SchemaFormat::Avro) {
        debug!("emitting Avro Schema");
        outcome.avro_schema = avro::emit(&tree, options, &mut stats)?;
    }
    if options.wants(SchemaFormat::Xsd) {
        debug!("emitting XSD");
        outcome.xsd = xsd::emit(&tree, options, &mut stats)?;
    }

    info!(
        types = stats.types_processed,
        warnings = stats.warnings.len(),
        "schema conversion complete"
    );
    outcome.stats = stats;
    Ok(outcome)
}

fn parse_source(
    source_text: &str,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    match options.source {
        SchemaFormat::Jsonschema => json_schema::parse(source_text, options, stats),
        SchemaFormat::Avro => avro::parse(source_text, options, stats),
        SchemaFormat::Xsd => xsd::parse(source_text, options, stats),
    }
}
