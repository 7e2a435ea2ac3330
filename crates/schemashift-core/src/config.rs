//! Configuration for schema conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default root element name for XSD emission.
pub const DEFAULT_XSD_ROOT_NAME: &str = "RootElement";
/// Default record name for Avro emission.
pub const DEFAULT_AVRO_RECORD_NAME: &str = "RootRecord";
/// Default namespace for Avro emission.
pub const DEFAULT_AVRO_NAMESPACE: &str = "com.example";
/// Default recursion ceiling (stack overflow guard).
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// One of the three supported schema languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaFormat {
    Jsonschema,
    Avro,
    Xsd,
}

impl SchemaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jsonschema => "jsonschema",
            Self::Avro => "avro",
            Self::Xsd => "xsd",
        }
    }
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How optional fields are encoded when emitting Avro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnionMode {
    /// Optional fields become `["null", T]` with `default: null`.
    Nullable,
    /// Optional fields keep their bare type; the caller accepts the
    /// resulting non-nullable contract.
    Strict,
    /// Same encoding as `Nullable`.
    Permissive,
}

/// JSON Schema draft identifier stamped into emitted `$schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JsonSchemaVersion {
    #[serde(rename = "draft-04")]
    Draft04,
    #[serde(rename = "draft-07")]
    Draft07,
    #[serde(rename = "2019-09")]
    Draft201909,
    #[serde(rename = "2020-12")]
    Draft202012,
}

impl JsonSchemaVersion {
    pub fn schema_uri(&self) -> &'static str {
        match self {
            Self::Draft04 => "http://json-schema.org/draft-04/schema#",
            Self::Draft07 => "http://json-schema.org/draft-07/schema#",
            Self::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Self::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }
}

/// Options for one conversion call.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `union-mode`, `max-depth`).
/// This naming convention is part of the public API contract for config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConvertOptions {
    /// Format of the source schema text.
    pub source: SchemaFormat,
    /// Target formats to emit. Formats not listed produce empty strings.
    pub targets: Vec<SchemaFormat>,
    /// Root element/record name. `None` falls back to the per-format default
    /// ("RootElement" for XSD, "RootRecord" for Avro).
    pub root_name: Option<String>,
    /// Target namespace. `None` falls back to "com.example" for Avro and to
    /// no namespace for XSD. An empty string is allowed and kept as-is.
    pub namespace: Option<String>,
    /// Optional-field encoding in Avro emit.
    pub union_mode: UnionMode,
    /// Route string formats and decimal constraints through Avro logical types.
    pub logical_types: bool,
    /// Round-trip XSD attributes.
    pub include_attributes: bool,
    /// Draft identifier stamped into emitted JSON Schema.
    pub json_schema_version: JsonSchemaVersion,
    /// Recursion ceiling for parse and emit walks.
    pub max_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source: SchemaFormat::Jsonschema,
            targets: vec![SchemaFormat::Avro, SchemaFormat::Xsd],
            root_name: None,
            namespace: None,
            union_mode: UnionMode::Nullable,
            logical_types: false,
            include_attributes: false,
            json_schema_version: JsonSchemaVersion::Draft202012,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConvertOptions {
    pub fn wants(&self, format: SchemaFormat) -> bool {
        self.targets.contains(&format)
    }

    pub(crate) fn xsd_root_name(&self) -> &str {
        self.root_name.as_deref().unwrap_or(DEFAULT_XSD_ROOT_NAME)
    }

    pub(crate) fn avro_record_name(&self) -> &str {
        self.root_name.as_deref().unwrap_or(DEFAULT_AVRO_RECORD_NAME)
    }

    pub(crate) fn avro_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_AVRO_NAMESPACE)
    }

    pub(crate) fn xsd_namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }
}
