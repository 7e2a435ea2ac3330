//! Avro Schema codec.
//!
//! Parse folds the canonical `["null", T]` optional encoding back into an
//! optional property and decodes logical types into `format` strings
//! unconditionally, so a round trip through the universal model is stable.
//! Emit re-encodes optional fields according to the configured union mode
//! and routes formats through logical types only when enabled.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use crate::config::{ConvertOptions, UnionMode};
use crate::diagnostics::ConversionStats;
use crate::error::ConvertError;
use crate::mapping::{
    avro_integer_width, format_for_logical_type, is_valid_avro_name, kind_for_avro_primitive,
    logical_type_for_format, sanitize_avro_name,
};
use crate::model::{ensure_depth, Constraints, SchemaKind, UniversalProperty, UniversalSchema};

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

pub fn parse(
    text: &str,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let value: Value = serde_json::from_str(text)?;
    parse_type(&value, "#", 0, options, stats)
}

fn parse_type(
    value: &Value,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    match value {
        Value::String(name) => parse_primitive_name(name, path),
        Value::Object(obj) => parse_complex(obj, path, depth, options, stats),
        Value::Array(members) => parse_union(members, path, depth, options, stats),
        _ => Err(ConvertError::parse_at(
            path,
            "Avro type must be a string, object, or union array",
        )),
    }
}

fn parse_primitive_name(name: &str, path: &str) -> Result<UniversalSchema, ConvertError> {
    match kind_for_avro_primitive(name) {
        Some((kind, format)) => {
            let mut schema = UniversalSchema::primitive(kind)?;
            schema.format = format.map(str::to_string);
            Ok(schema)
        }
        // Named-type references are not resolved (every occurrence must be
        // inline), so a bare name here is unusable.
        None => Err(ConvertError::parse_at(
            path,
            format!("unknown Avro type '{name}'"),
        )),
    }
}

fn parse_complex(
    obj: &Map<String, Value>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    if let Some(logical) = obj.get("logicalType").and_then(Value::as_str) {
        return parse_logical(obj, logical, path, depth, options, stats);
    }

    let type_value = obj
        .get("type")
        .ok_or_else(|| ConvertError::parse_at(path, "missing or invalid 'type'"))?;

    // `type` itself may hold an inline union or a nested definition.
    if !type_value.is_string() {
        return parse_type(type_value, path, depth + 1, options, stats);
    }

    let type_name = type_value.as_str().unwrap_or_default();
    let mut schema = match type_name {
        "record" => parse_record(obj, path, depth, options, stats)?,
        "array" => {
            let items = obj
                .get("items")
                .ok_or_else(|| ConvertError::parse_at(path, "array must have 'items'"))?;
            let item_path = format!("{path}/items");
            UniversalSchema::array(parse_type(items, &item_path, depth + 1, options, stats)?)
        }
        "map" => {
            let values = obj
                .get("values")
                .ok_or_else(|| ConvertError::parse_at(path, "map must have 'values'"))?;
            let values_path = format!("{path}/values");
            UniversalSchema::map(parse_type(values, &values_path, depth + 1, options, stats)?)
        }
        "enum" => {
            let symbols = obj
                .get("symbols")
                .and_then(Value::as_array)
                .ok_or_else(|| ConvertError::parse_at(path, "enum must have 'symbols'"))?;
            UniversalSchema::enumeration(symbols.clone())
        }
        "fixed" => {
            let size = obj
                .get("size")
                .and_then(Value::as_u64)
                .ok_or_else(|| ConvertError::parse_at(path, "fixed must have 'size'"))?;
            let mut schema = UniversalSchema::string();
            schema.constraints = Some(Constraints {
                min_length: Some(size),
                max_length: Some(size),
                ..Constraints::default()
            });
            schema
        }
        primitive => parse_primitive_name(primitive, path)?,
    };

    if schema.description.is_none() {
        schema.description = obj.get("doc").and_then(Value::as_str).map(str::to_string);
    }
    Ok(schema)
}

fn parse_logical(
    obj: &Map<String, Value>,
    logical: &str,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    if logical == "decimal" {
        let mut schema = UniversalSchema::number();
        schema.constraints = Some(Constraints {
            total_digits: obj.get("precision").and_then(Value::as_u64),
            fraction_digits: obj.get("scale").and_then(Value::as_u64),
            ..Constraints::default()
        });
        return Ok(schema);
    }

    if let Some(format) = format_for_logical_type(logical) {
        let mut schema = UniversalSchema::string();
        schema.format = Some(format.to_string());
        return Ok(schema);
    }

    stats.warn(format!(
        "unknown logical type '{logical}' at {path}; using the base type"
    ));
    let mut base = obj.clone();
    base.remove("logicalType");
    parse_complex(&base, path, depth, options, stats)
}

fn parse_record(
    obj: &Map<String, Value>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let fields = obj
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| ConvertError::parse_at(path, "record must have 'fields'"))?;

    let mut properties = BTreeMap::new();
    let mut required = BTreeSet::new();

    for field in fields {
        let field = field
            .as_object()
            .ok_or_else(|| ConvertError::parse_at(path, "record field must be an object"))?;
        let name = field
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ConvertError::parse_at(path, "record field must have a 'name'"))?;
        let field_path = format!("{path}/fields/{name}");
        let type_value = field
            .get("type")
            .ok_or_else(|| ConvertError::parse_at(&field_path, "field must have a 'type'"))?;

        // The canonical optional encoding folds to an optional property
        // rather than a general union node.
        let optional_union = optional_union_member(type_value);
        let mut schema = match optional_union {
            Some(inner) => parse_type(inner, &field_path, depth + 1, options, stats)?,
            None => parse_type(type_value, &field_path, depth + 1, options, stats)?,
        };

        if schema.description.is_none() {
            schema.description = field.get("doc").and_then(Value::as_str).map(str::to_string);
        }
        let has_default = field.contains_key("default");
        match field.get("default") {
            Some(Value::Null) | None => {}
            Some(default) => schema.default = Some(default.clone()),
        }

        // No default and no null wrapper means the field is required.
        if !has_default && optional_union.is_none() {
            required.insert(name.to_string());
        }
        properties.insert(name.to_string(), UniversalProperty::new(schema));
    }

    let mut schema = UniversalSchema::object(properties, required);
    schema.description = obj.get("doc").and_then(Value::as_str).map(str::to_string);
    Ok(schema)
}

fn parse_union(
    members: &[Value],
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    if members.is_empty() {
        return Err(ConvertError::parse_at(
            path,
            "union must have at least one member",
        ));
    }

    let mut parsed = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let member_path = format!("{path}/{i}");
        parsed.push(parse_type(member, &member_path, depth + 1, options, stats)?);
    }

    Ok(match parsed.len() {
        1 => parsed.into_iter().next().unwrap_or_else(UniversalSchema::null),
        _ => UniversalSchema::union(parsed),
    })
}

/// For a two-element `["null", T]` union, the non-null member. `None` for
/// any other shape.
fn optional_union_member(value: &Value) -> Option<&Value> {
    let members = value.as_array()?;
    if members.len() != 2 {
        return None;
    }
    let is_null = |v: &Value| v.as_str() == Some("null");
    match (is_null(&members[0]), is_null(&members[1])) {
        (true, false) => Some(&members[1]),
        (false, true) => Some(&members[0]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Emit
// ---------------------------------------------------------------------------

pub fn emit(
    schema: &UniversalSchema,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<String, ConvertError> {
    let value = match schema.kind() {
        SchemaKind::Object
            if !(schema.properties.is_empty() && schema.additional_properties.is_some()) =>
        {
            emit_record(
                schema,
                options.avro_record_name(),
                Some(options.avro_namespace()),
                "#",
                0,
                options,
                stats,
            )?
        }
        SchemaKind::Enum | SchemaKind::Const => {
            let mut named = emit_type(schema, options.avro_record_name(), "#", 0, options, stats)?;
            if let Some(obj) = named.as_object_mut() {
                obj.insert("name".to_string(), json!(options.avro_record_name()));
                obj.insert("namespace".to_string(), json!(options.avro_namespace()));
            }
            named
        }
        _ => emit_type(schema, options.avro_record_name(), "#", 0, options, stats)?,
    };

    serde_json::to_string_pretty(&value).map_err(ConvertError::from)
}

fn emit_type(
    schema: &UniversalSchema,
    name_hint: &str,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<Value, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    let value = match schema.kind() {
        SchemaKind::Null => json!("null"),
        SchemaKind::Boolean => json!("boolean"),
        SchemaKind::Integer => {
            let maximum = schema.constraints.as_ref().and_then(|c| c.maximum);
            json!(avro_integer_width(maximum))
        }
        SchemaKind::Number => emit_number(schema, options),
        SchemaKind::String => emit_string(schema, path, options, stats),
        SchemaKind::Array => {
            let items = schema.items.as_deref().ok_or_else(|| {
                ConvertError::parse_at(path, "array node is missing its item type")
            })?;
            if let Some(c) = &schema.constraints {
                if c.min_items.is_some() || c.max_items.is_some() {
                    stats.warn(format!(
                        "lossy conversion of minItems/maxItems at {path}: Avro arrays are unbounded"
                    ));
                }
            }
            let item_path = format!("{path}/items");
            let item_hint = format!("{name_hint}Item");
            json!({
                "type": "array",
                "items": emit_type(items, &item_hint, &item_path, depth + 1, options, stats)?,
            })
        }
        SchemaKind::Object => match &schema.additional_properties {
            Some(values) if schema.properties.is_empty() => {
                let values_path = format!("{path}/values");
                let values_hint = format!("{name_hint}Value");
                json!({
                    "type": "map",
                    "values": emit_type(values, &values_hint, &values_path, depth + 1, options, stats)?,
                })
            }
            _ => {
                let record_name = format!("{}Record", sanitize_avro_name(name_hint));
                emit_record(schema, &record_name, None, path, depth, options, stats)?
            }
        },
        SchemaKind::Enum => {
            let symbols = emit_symbols(&schema.enum_values, path, stats);
            json!({
                "type": "enum",
                "name": format!("{}Enum", sanitize_avro_name(name_hint)),
                "symbols": symbols,
            })
        }
        SchemaKind::Const => {
            let value = schema.const_value.clone().unwrap_or(Value::Null);
            let symbols = emit_symbols(std::slice::from_ref(&value), path, stats);
            json!({
                "type": "enum",
                "name": format!("{}Const", sanitize_avro_name(name_hint)),
                "symbols": symbols,
            })
        }
        SchemaKind::Union => {
            let mut members = Vec::with_capacity(schema.union_members.len());
            for (i, member) in schema.union_members.iter().enumerate() {
                let member_path = format!("{path}/{i}");
                let emitted =
                    emit_type(member, name_hint, &member_path, depth + 1, options, stats)?;
                // Avro unions cannot nest; splice nested unions inline.
                match emitted {
                    Value::Array(inner) => members.extend(inner),
                    other => members.push(other),
                }
            }
            Value::Array(members)
        }
    };
    Ok(value)
}

fn emit_number(schema: &UniversalSchema, options: &ConvertOptions) -> Value {
    if options.logical_types {
        if let Some(c) = &schema.constraints {
            if let Some(precision) = c.total_digits {
                return json!({
                    "type": "bytes",
                    "logicalType": "decimal",
                    "precision": precision,
                    "scale": c.fraction_digits.unwrap_or(0),
                });
            }
        }
    }
    match schema.format.as_deref() {
        Some("float") => json!("float"),
        _ => json!("double"),
    }
}

fn emit_string(
    schema: &UniversalSchema,
    path: &str,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Value {
    if let Some(c) = &schema.constraints {
        if c.pattern.is_some() {
            stats.warn(format!(
                "lossy conversion of pattern at {path}: Avro has no pattern facet"
            ));
        }
    }
    if let Some(format) = schema.format.as_deref() {
        if options.logical_types {
            if let Some(rule) = logical_type_for_format(format) {
                return json!({
                    "type": rule.avro_type,
                    "logicalType": rule.logical_type,
                });
            }
        }
        if format == "base64" {
            return json!("bytes");
        }
    }
    json!("string")
}

fn emit_symbols(values: &[Value], path: &str, stats: &mut ConversionStats) -> Vec<String> {
    values
        .iter()
        .map(|value| {
            let raw = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if is_valid_avro_name(&raw) {
                raw
            } else {
                let sanitized = sanitize_avro_name(&raw);
                stats.warn(format!(
                    "enum symbol '{raw}' at {path} sanitized to '{sanitized}' for Avro"
                ));
                sanitized
            }
        })
        .collect()
}

fn emit_record(
    schema: &UniversalSchema,
    name: &str,
    namespace: Option<&str>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<Value, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    let mut fields = Vec::with_capacity(schema.properties.len());
    for (prop_name, prop) in &schema.properties {
        let field_path = format!("{path}/fields/{prop_name}");
        let field_name = if is_valid_avro_name(prop_name) {
            prop_name.clone()
        } else {
            let sanitized = sanitize_avro_name(prop_name);
            stats.warn(format!(
                "field '{prop_name}' at {path} sanitized to '{sanitized}' for Avro"
            ));
            sanitized
        };

        // An already-folded {null, T} property and a property absent from
        // `required` both mean "optional".
        let (base_schema, folded) = match prop.schema.optional_member() {
            Some(inner) => (inner, true),
            None => (&prop.schema, false),
        };
        let optional = folded || !schema.required.contains(prop_name);

        let base = emit_type(base_schema, prop_name, &field_path, depth + 1, options, stats)?;

        let mut field = Map::new();
        field.insert("name".to_string(), json!(field_name));
        if let Some(doc) = &base_schema.description {
            field.insert("doc".to_string(), json!(doc));
        }

        if optional && options.union_mode != UnionMode::Strict {
            field.insert("type".to_string(), wrap_nullable(base));
            field.insert("default".to_string(), Value::Null);
        } else {
            field.insert("type".to_string(), base);
            if let Some(default) = &base_schema.default {
                field.insert("default".to_string(), default.clone());
            }
        }

        fields.push(Value::Object(field));
    }

    let mut record = Map::new();
    record.insert("type".to_string(), json!("record"));
    record.insert("name".to_string(), json!(name));
    if let Some(namespace) = namespace {
        if !namespace.is_empty() {
            record.insert("namespace".to_string(), json!(namespace));
        }
    }
    if let Some(doc) = &schema.description {
        record.insert("doc".to_string(), json!(doc));
    }
    record.insert("fields".to_string(), Value::Array(fields));
    Ok(Value::Object(record))
}

/// Wrap a type in the canonical `["null", T]` optional encoding, splicing
/// unions rather than nesting them.
fn wrap_nullable(base: Value) -> Value {
    match base {
        Value::Array(members) => {
            let mut wrapped = vec![json!("null")];
            wrapped.extend(members.into_iter().filter(|m| m.as_str() != Some("null")));
            Value::Array(wrapped)
        }
        other => json!(["null", other]),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
