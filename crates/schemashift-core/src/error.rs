//! Error types for schema conversion.

use thiserror::Error;

use crate::config::SchemaFormat;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("schema error at {path}: {message}")]
    SchemaParse { path: String, message: String },

    #[error("recursion depth exceeded at {path} (max: {max_depth})")]
    RecursionDepthExceeded { path: String, max_depth: usize },

    #[error("{target} cannot represent construct at {path}: {message}")]
    Conversion {
        target: SchemaFormat,
        path: String,
        message: String,
    },

    #[error("unsupported schema kind: {0}")]
    UnsupportedConstruct(String),
}

impl ConvertError {
    /// Stable wire code carried alongside the message in conversion outcomes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Json(_)
            | Self::Xml(_)
            | Self::SchemaParse { .. }
            | Self::RecursionDepthExceeded { .. } => "SCHEMA_PARSE_ERROR",
            Self::Conversion { target, .. } => match target {
                SchemaFormat::Jsonschema => "JSONSCHEMA_CONVERSION_ERROR",
                SchemaFormat::Avro => "AVRO_CONVERSION_ERROR",
                SchemaFormat::Xsd => "XSD_CONVERSION_ERROR",
            },
            Self::UnsupportedConstruct(_) => "UNSUPPORTED_CONSTRUCT",
        }
    }

    pub(crate) fn parse_at(path: &str, message: impl Into<String>) -> Self {
        Self::SchemaParse {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn conversion(target: SchemaFormat, path: &str, message: impl Into<String>) -> Self {
        Self::Conversion {
            target,
            path: path.to_string(),
            message: message.into(),
        }
    }
}
