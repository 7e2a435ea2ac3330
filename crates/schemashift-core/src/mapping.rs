//! Static type and constraint mapping tables.
//!
//! Every emit step consults these tables instead of scattering conditionals
//! through the codecs, so adding a target format means adding a table. Each
//! table is bidirectional where the round trip is meaningful.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::SchemaKind;

// ---------------------------------------------------------------------------
// Primitive correspondence
// ---------------------------------------------------------------------------

/// One row of the primitive correspondence table: how a scalar kind spells
/// itself in each target language.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveMapping {
    pub kind: SchemaKind,
    pub json_schema: &'static str,
    pub avro: &'static str,
    pub xsd: &'static str,
}

/// The single source of truth for scalar kinds.
///
/// XSD has no null type; null positions surface as nillable strings there.
pub const PRIMITIVES: &[PrimitiveMapping] = &[
    PrimitiveMapping {
        kind: SchemaKind::Null,
        json_schema: "null",
        avro: "null",
        xsd: "xs:string",
    },
    PrimitiveMapping {
        kind: SchemaKind::Boolean,
        json_schema: "boolean",
        avro: "boolean",
        xsd: "xs:boolean",
    },
    PrimitiveMapping {
        kind: SchemaKind::Integer,
        json_schema: "integer",
        avro: "long",
        xsd: "xs:integer",
    },
    PrimitiveMapping {
        kind: SchemaKind::Number,
        json_schema: "number",
        avro: "double",
        xsd: "xs:decimal",
    },
    PrimitiveMapping {
        kind: SchemaKind::String,
        json_schema: "string",
        avro: "string",
        xsd: "xs:string",
    },
];

pub fn primitive_for_kind(kind: SchemaKind) -> Option<&'static PrimitiveMapping> {
    PRIMITIVES.iter().find(|row| row.kind == kind)
}

/// Decode a JSON Schema `type` name into a scalar kind.
pub fn kind_for_json_type(name: &str) -> Option<SchemaKind> {
    PRIMITIVES
        .iter()
        .find(|row| row.json_schema == name)
        .map(|row| row.kind)
}

/// Decode an Avro primitive name. `int`/`long` and `float`/`double` collapse
/// to their universal kinds, carrying the width as `format`; `bytes` carries
/// a `base64` format so it can round-trip back to `bytes`/`xs:base64Binary`.
pub fn kind_for_avro_primitive(name: &str) -> Option<(SchemaKind, Option<&'static str>)> {
    match name {
        "null" => Some((SchemaKind::Null, None)),
        "boolean" => Some((SchemaKind::Boolean, None)),
        "int" | "long" => Some((SchemaKind::Integer, None)),
        "float" => Some((SchemaKind::Number, Some("float"))),
        "double" => Some((SchemaKind::Number, Some("double"))),
        "string" => Some((SchemaKind::String, None)),
        "bytes" => Some((SchemaKind::String, Some("base64"))),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// XSD built-in type decoding
// ---------------------------------------------------------------------------

/// Decode an XSD built-in type name (prefix already stripped) into a kind
/// plus the `format` string that preserves the original flavor.
pub fn xsd_builtin(name: &str) -> Option<(SchemaKind, Option<&'static str>)> {
    let mapped = match name {
        // String types
        "string" | "normalizedString" | "token" | "NMTOKEN" | "NMTOKENS" | "Name" | "NCName"
        | "ID" | "IDREF" | "IDREFS" | "ENTITY" | "ENTITIES" | "language" => {
            (SchemaKind::String, None)
        }

        // Numeric types
        "decimal" => (SchemaKind::Number, Some("decimal")),
        "double" => (SchemaKind::Number, Some("double")),
        "float" => (SchemaKind::Number, Some("float")),
        "integer" | "nonPositiveInteger" | "negativeInteger" | "long" | "int" | "short"
        | "byte" | "nonNegativeInteger" | "unsignedLong" | "unsignedInt" | "unsignedShort"
        | "unsignedByte" | "positiveInteger" => (SchemaKind::Integer, None),

        "boolean" => (SchemaKind::Boolean, None),

        // Date/time types
        "dateTime" => (SchemaKind::String, Some("date-time")),
        "date" => (SchemaKind::String, Some("date")),
        "time" => (SchemaKind::String, Some("time")),
        "duration" => (SchemaKind::String, Some("duration")),
        "gYear" => (SchemaKind::String, Some("year")),
        "gMonth" => (SchemaKind::String, Some("month")),
        "gDay" => (SchemaKind::String, Some("day")),
        "gYearMonth" => (SchemaKind::String, Some("year-month")),
        "gMonthDay" => (SchemaKind::String, Some("month-day")),

        // Binary types
        "base64Binary" => (SchemaKind::String, Some("base64")),
        "hexBinary" => (SchemaKind::String, Some("hex")),

        "anyURI" => (SchemaKind::String, Some("uri")),
        "QName" => (SchemaKind::String, Some("qname")),
        "NOTATION" => (SchemaKind::String, Some("notation")),

        _ => return None,
    };
    Some(mapped)
}

/// Route a `format` string to a richer XSD built-in than the kind's default.
pub fn xsd_type_for_format(format: &str) -> Option<&'static str> {
    match format {
        "date" => Some("xs:date"),
        "date-time" => Some("xs:dateTime"),
        "time" => Some("xs:time"),
        "duration" => Some("xs:duration"),
        "uri" => Some("xs:anyURI"),
        "base64" => Some("xs:base64Binary"),
        "hex" => Some("xs:hexBinary"),
        "float" => Some("xs:float"),
        "double" => Some("xs:double"),
        "decimal" => Some("xs:decimal"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Avro logical types
// ---------------------------------------------------------------------------

/// One format→logical-type routing rule.
#[derive(Debug, Clone, Copy)]
pub struct LogicalTypeRule {
    pub format: &'static str,
    pub avro_type: &'static str,
    pub logical_type: &'static str,
}

pub const LOGICAL_TYPES: &[LogicalTypeRule] = &[
    LogicalTypeRule {
        format: "date",
        avro_type: "int",
        logical_type: "date",
    },
    LogicalTypeRule {
        format: "time",
        avro_type: "int",
        logical_type: "time-millis",
    },
    LogicalTypeRule {
        format: "date-time",
        avro_type: "long",
        logical_type: "timestamp-millis",
    },
    LogicalTypeRule {
        format: "uuid",
        avro_type: "string",
        logical_type: "uuid",
    },
];

pub fn logical_type_for_format(format: &str) -> Option<&'static LogicalTypeRule> {
    LOGICAL_TYPES.iter().find(|rule| rule.format == format)
}

/// Reverse lookup: restore the `format` a logical type encodes. The
/// microsecond flavors decode to the same formats as their millisecond
/// counterparts.
pub fn format_for_logical_type(logical_type: &str) -> Option<&'static str> {
    match logical_type {
        "date" => Some("date"),
        "time-millis" | "time-micros" => Some("time"),
        "timestamp-millis" | "timestamp-micros" => Some("date-time"),
        "uuid" => Some("uuid"),
        _ => None,
    }
}

/// Pick the Avro integer width from the `maximum` constraint. With no bound
/// the widest type wins.
pub fn avro_integer_width(maximum: Option<f64>) -> &'static str {
    match maximum {
        Some(max) if max <= i32::MAX as f64 => "int",
        _ => "long",
    }
}

// ---------------------------------------------------------------------------
// Name sanitizers
// ---------------------------------------------------------------------------

static AVRO_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid pattern"));

static XML_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid pattern"));

pub fn is_valid_avro_name(name: &str) -> bool {
    AVRO_NAME.is_match(name)
}

pub fn is_valid_xml_name(name: &str) -> bool {
    XML_NAME.is_match(name)
}

/// Force a name into the Avro shape `[A-Za-z_][A-Za-z0-9_]*`.
pub fn sanitize_avro_name(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    let mut sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if sanitized
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
    {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// Force a name into a usable XML element name: alphanumerics plus
/// `_`/`-`/`.`, not starting with a digit, `-`, or `.`.
pub fn sanitize_xml_name(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.')
    {
        sanitized.insert(0, '_');
    }
    sanitized
}

/// Strip a namespace prefix: `xs:string` → `string`.
pub fn strip_ns_prefix(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
