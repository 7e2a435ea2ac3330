//! JSON Schema codec.
//!
//! Parse maps `type`/`enum`/`const`/`anyOf`/`oneOf`/`allOf` onto the
//! universal kinds; `anyOf` and `oneOf` are treated identically (the
//! exactly-one/any-number distinction is deliberately not preserved), and
//! `allOf` merges its object members. Emit is the inverse, stamping
//! `$schema` from the configured draft.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use crate::config::ConvertOptions;
use crate::diagnostics::ConversionStats;
use crate::error::ConvertError;
use crate::mapping::{kind_for_json_type, primitive_for_kind};
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
    parse_node(&value, "#", 0, options, stats)
}

fn parse_node(
    node: &Value,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    let obj = node
        .as_object()
        .ok_or_else(|| ConvertError::parse_at(path, "schema must be a JSON object"))?;

    // Combinators and literal keywords take precedence over `type`.
    if let Some(members) = obj.get("anyOf").or_else(|| obj.get("oneOf")) {
        return parse_union(members, obj, path, depth, options, stats);
    }
    if let Some(members) = obj.get("allOf") {
        return parse_all_of(members, path, depth, options, stats);
    }
    if let Some(value) = obj.get("const") {
        let mut schema = UniversalSchema::constant(value.clone());
        apply_metadata(&mut schema, obj);
        return Ok(schema);
    }
    if let Some(values) = obj.get("enum") {
        let values = values
            .as_array()
            .ok_or_else(|| ConvertError::parse_at(path, "'enum' must be an array"))?;
        let mut schema = UniversalSchema::enumeration(values.clone());
        apply_metadata(&mut schema, obj);
        return Ok(schema);
    }

    match obj.get("type") {
        Some(Value::String(type_name)) => parse_typed(type_name, obj, path, depth, options, stats),
        Some(Value::Array(type_names)) => {
            parse_type_list(type_names, obj, path, depth, options, stats)
        }
        Some(_) => Err(ConvertError::parse_at(
            path,
            "'type' must be a string or an array of strings",
        )),
        None => Err(ConvertError::parse_at(
            path,
            "schema must declare a type, enum, const, or union",
        )),
    }
}

fn parse_typed(
    type_name: &str,
    obj: &Map<String, Value>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let mut schema = match type_name {
        "object" => parse_object(obj, path, depth, options, stats)?,
        "array" => {
            let items = match obj.get("items") {
                Some(items) if items.is_object() => items,
                _ => {
                    return Err(ConvertError::parse_at(path, "array must have 'items'"));
                }
            };
            let item_path = format!("{path}/items");
            UniversalSchema::array(parse_node(items, &item_path, depth + 1, options, stats)?)
        }
        primitive => match kind_for_json_type(primitive) {
            Some(kind) => UniversalSchema::primitive(kind)?,
            None => return Err(ConvertError::UnsupportedConstruct(primitive.to_string())),
        },
    };

    schema.constraints = constraints_from(obj);
    apply_metadata(&mut schema, obj);
    Ok(schema)
}

fn parse_object(
    obj: &Map<String, Value>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let mut properties = BTreeMap::new();
    if let Some(props) = obj.get("properties") {
        let props = props
            .as_object()
            .ok_or_else(|| ConvertError::parse_at(path, "'properties' must be an object"))?;
        for (name, prop_schema) in props {
            let prop_path = format!("{path}/properties/{name}");
            let parsed = parse_node(prop_schema, &prop_path, depth + 1, options, stats)?;
            properties.insert(name.clone(), UniversalProperty::new(parsed));
        }
    }

    // `required` copied verbatim; names without a matching property are
    // discarded by the constructor.
    let required: BTreeSet<String> = match obj.get("required") {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => BTreeSet::new(),
    };

    let mut schema = if properties.is_empty() {
        match obj.get("additionalProperties") {
            Some(extra) if extra.is_object() => {
                let values_path = format!("{path}/additionalProperties");
                UniversalSchema::map(parse_node(extra, &values_path, depth + 1, options, stats)?)
            }
            Some(Value::Bool(true)) => {
                stats.warn(format!(
                    "open additionalProperties at {path} mapped to a map of strings"
                ));
                UniversalSchema::map(UniversalSchema::string())
            }
            _ => UniversalSchema::object(properties, required),
        }
    } else {
        if obj
            .get("additionalProperties")
            .is_some_and(Value::is_object)
        {
            stats.warn(format!(
                "additionalProperties at {path} dropped: schema also declares named properties"
            ));
        }
        UniversalSchema::object(properties, required)
    };

    apply_metadata(&mut schema, obj);
    Ok(schema)
}

fn parse_union(
    members: &Value,
    obj: &Map<String, Value>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let members = members
        .as_array()
        .ok_or_else(|| ConvertError::parse_at(path, "union keyword must hold an array"))?;
    if members.is_empty() {
        return Err(ConvertError::parse_at(
            path,
            "union must have at least one member",
        ));
    }

    let mut parsed = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let member_path = format!("{path}/{i}");
        parsed.push(parse_node(member, &member_path, depth + 1, options, stats)?);
    }

    let mut schema = if parsed.len() == 1 {
        parsed.into_iter().next().unwrap_or_else(UniversalSchema::null)
    } else {
        UniversalSchema::union(parsed)
    };
    apply_metadata(&mut schema, obj);
    Ok(schema)
}

/// `type: [..]` treated as a union of primitive kinds; the two-element form
/// with `"null"` is the optional sub-case.
fn parse_type_list(
    type_names: &[Value],
    obj: &Map<String, Value>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;
    let mut members = Vec::with_capacity(type_names.len());
    for name in type_names {
        let name = name
            .as_str()
            .ok_or_else(|| ConvertError::parse_at(path, "'type' array entries must be strings"))?;
        match name {
            "object" | "array" => {
                // Re-parse this node as the structured type; facets on the
                // same level apply to it.
                let mut single = obj.clone();
                single.insert("type".to_string(), json!(name));
                members.push(parse_node(
                    &Value::Object(single),
                    path,
                    depth + 1,
                    options,
                    stats,
                )?);
            }
            primitive => match kind_for_json_type(primitive) {
                Some(kind) => {
                    let mut member = UniversalSchema::primitive(kind)?;
                    member.constraints = constraints_from(obj);
                    members.push(member);
                }
                None => return Err(ConvertError::UnsupportedConstruct(primitive.to_string())),
            },
        }
    }

    let mut schema = match members.len() {
        0 => return Err(ConvertError::parse_at(path, "'type' array cannot be empty")),
        1 => members.into_iter().next().unwrap_or_else(UniversalSchema::null),
        _ => UniversalSchema::union(members),
    };
    apply_metadata(&mut schema, obj);
    Ok(schema)
}

/// Merge `allOf` object members: properties unioned (last member wins on a
/// name collision), required lists concatenated. Non-object members are
/// dropped with a warning.
fn parse_all_of(
    members: &Value,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let members = members
        .as_array()
        .ok_or_else(|| ConvertError::parse_at(path, "'allOf' must hold an array"))?;

    let mut properties: BTreeMap<String, UniversalProperty> = BTreeMap::new();
    let mut required: BTreeSet<String> = BTreeSet::new();

    for (i, member) in members.iter().enumerate() {
        let is_object = member.get("type").and_then(Value::as_str) == Some("object");
        if !is_object {
            stats.warn(format!(
                "allOf member at {path}/allOf/{i} is not an object schema and was dropped"
            ));
            continue;
        }
        let member_path = format!("{path}/allOf/{i}");
        let parsed = parse_node(member, &member_path, depth + 1, options, stats)?;
        required.extend(parsed.required.iter().cloned());
        properties.extend(parsed.properties);
    }

    Ok(UniversalSchema::object(properties, required))
}

fn constraints_from(obj: &Map<String, Value>) -> Option<Constraints> {
    let constraints = Constraints {
        pattern: obj
            .get("pattern")
            .and_then(Value::as_str)
            .map(str::to_string),
        min_length: obj.get("minLength").and_then(Value::as_u64),
        max_length: obj.get("maxLength").and_then(Value::as_u64),
        minimum: obj.get("minimum").and_then(Value::as_f64),
        maximum: obj.get("maximum").and_then(Value::as_f64),
        exclusive_minimum: obj.get("exclusiveMinimum").and_then(Value::as_f64),
        exclusive_maximum: obj.get("exclusiveMaximum").and_then(Value::as_f64),
        min_items: obj.get("minItems").and_then(Value::as_u64),
        max_items: obj.get("maxItems").and_then(Value::as_u64),
        total_digits: None,
        fraction_digits: None,
    };
    (!constraints.is_empty()).then_some(constraints)
}

fn apply_metadata(schema: &mut UniversalSchema, obj: &Map<String, Value>) {
    if schema.format.is_none() {
        schema.format = obj
            .get("format")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    if schema.description.is_none() {
        schema.description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    if schema.default.is_none() {
        schema.default = obj.get("default").cloned();
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
    let body = emit_node(schema, "#", 0, options, stats)?;

    let mut root = Map::new();
    root.insert(
        "$schema".to_string(),
        json!(options.json_schema_version.schema_uri()),
    );
    if let Some(obj) = body.as_object() {
        for (key, value) in obj {
            root.insert(key.clone(), value.clone());
        }
    }

    serde_json::to_string_pretty(&Value::Object(root)).map_err(ConvertError::from)
}

fn emit_node(
    schema: &UniversalSchema,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<Value, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    let mut out = Map::new();
    match schema.kind() {
        SchemaKind::Object => {
            out.insert("type".to_string(), json!("object"));
            if !schema.properties.is_empty() {
                let mut props = Map::new();
                for (name, prop) in &schema.properties {
                    let prop_path = format!("{path}/properties/{name}");
                    props.insert(
                        name.clone(),
                        emit_node(&prop.schema, &prop_path, depth + 1, options, stats)?,
                    );
                }
                out.insert("properties".to_string(), Value::Object(props));
            }
            if !schema.required.is_empty() {
                let required: Vec<Value> =
                    schema.required.iter().map(|name| json!(name)).collect();
                out.insert("required".to_string(), Value::Array(required));
            }
            if let Some(values) = &schema.additional_properties {
                let values_path = format!("{path}/additionalProperties");
                out.insert(
                    "additionalProperties".to_string(),
                    emit_node(values, &values_path, depth + 1, options, stats)?,
                );
            }
        }
        SchemaKind::Array => {
            out.insert("type".to_string(), json!("array"));
            if let Some(items) = &schema.items {
                let item_path = format!("{path}/items");
                out.insert(
                    "items".to_string(),
                    emit_node(items, &item_path, depth + 1, options, stats)?,
                );
            }
        }
        SchemaKind::Enum => {
            if schema.enum_values.iter().all(Value::is_string) {
                out.insert("type".to_string(), json!("string"));
            }
            out.insert("enum".to_string(), Value::Array(schema.enum_values.clone()));
        }
        SchemaKind::Union => {
            let mut members = Vec::with_capacity(schema.union_members.len());
            for (i, member) in schema.union_members.iter().enumerate() {
                let member_path = format!("{path}/anyOf/{i}");
                members.push(emit_node(member, &member_path, depth + 1, options, stats)?);
            }
            out.insert("anyOf".to_string(), Value::Array(members));
        }
        SchemaKind::Const => {
            out.insert(
                "const".to_string(),
                schema.const_value.clone().unwrap_or(Value::Null),
            );
        }
        primitive => {
            // Always present for the five scalar kinds.
            if let Some(row) = primitive_for_kind(primitive) {
                out.insert("type".to_string(), json!(row.json_schema));
            }
        }
    }

    if let Some(constraints) = &schema.constraints {
        apply_constraints(constraints, &mut out);
    }
    if let Some(format) = &schema.format {
        out.insert("format".to_string(), json!(format));
    }
    if let Some(description) = &schema.description {
        out.insert("description".to_string(), json!(description));
    }
    if let Some(default) = &schema.default {
        out.insert("default".to_string(), default.clone());
    }

    Ok(Value::Object(out))
}

fn apply_constraints(constraints: &Constraints, out: &mut Map<String, Value>) {
    if let Some(pattern) = &constraints.pattern {
        out.insert("pattern".to_string(), json!(pattern));
    }
    if let Some(v) = constraints.min_length {
        out.insert("minLength".to_string(), json!(v));
    }
    if let Some(v) = constraints.max_length {
        out.insert("maxLength".to_string(), json!(v));
    }
    if let Some(v) = constraints.minimum {
        out.insert("minimum".to_string(), number_value(v));
    }
    if let Some(v) = constraints.maximum {
        out.insert("maximum".to_string(), number_value(v));
    }
    if let Some(v) = constraints.exclusive_minimum {
        out.insert("exclusiveMinimum".to_string(), number_value(v));
    }
    if let Some(v) = constraints.exclusive_maximum {
        out.insert("exclusiveMaximum".to_string(), number_value(v));
    }
    if let Some(v) = constraints.min_items {
        out.insert("minItems".to_string(), json!(v));
    }
    if let Some(v) = constraints.max_items {
        out.insert("maxItems".to_string(), json!(v));
    }
}

/// Whole numbers emit as JSON integers so a parsed `minimum: 0` does not
/// come back as `0.0`.
fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9e15 {
        json!(v as i64)
    } else {
        json!(v)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
