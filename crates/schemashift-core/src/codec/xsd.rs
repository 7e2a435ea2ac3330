//! XSD codec.
//!
//! The XML text is first read into a small element tree, then typed
//! recursive descent maps `xs:complexType`/`xs:sequence` onto object nodes,
//! `xs:choice` onto unions, and `xs:simpleType`/`xs:restriction` onto
//! constrained primitives. Emit walks the universal tree back out through an
//! event writer. Named global types and type references are not resolved;
//! every occurrence must be inline (unresolvable references degrade to
//! `xs:string` with a warning).

use std::collections::{BTreeMap, BTreeSet};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde_json::json;

use crate::config::{ConvertOptions, SchemaFormat};
use crate::diagnostics::ConversionStats;
use crate::error::ConvertError;
use crate::mapping::{
    is_valid_xml_name, primitive_for_kind, sanitize_xml_name, strip_ns_prefix, xsd_builtin,
    xsd_type_for_format,
};
use crate::model::{ensure_depth, Constraints, SchemaKind, UniversalProperty, UniversalSchema};

pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

// ---------------------------------------------------------------------------
// XML element tree
// ---------------------------------------------------------------------------

/// A fully-buffered XML element. The XSD grammar walk operates on this tree
/// instead of raw events.
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
    text: String,
}

impl XmlNode {
    fn local(&self) -> &str {
        strip_ns_prefix(&self.name)
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, local: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.local() == local)
    }

    fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.local() == local)
    }
}

fn node_from(start: &BytesStart<'_>) -> Result<XmlNode, ConvertError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(XmlNode {
        name,
        attrs,
        children: Vec::new(),
        text: String::new(),
    })
}

fn parse_tree(text: &str) -> Result<XmlNode, ConvertError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(node_from(&start)?),
            Event::Empty(start) => {
                let node = node_from(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| {
                    ConvertError::parse_at("#", "unexpected closing tag in XSD document")
                })?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(text.unescape()?.trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ConvertError::parse_at(
            "#",
            "unexpected end of XSD document",
        ));
    }
    root.ok_or_else(|| ConvertError::parse_at("#", "document contains no root element"))
}

fn attach(
    stack: &mut Vec<XmlNode>,
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), ConvertError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_some() {
                return Err(ConvertError::parse_at(
                    "#",
                    "document contains multiple root elements",
                ));
            }
            *root = Some(node);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

struct ParsedElement {
    schema: UniversalSchema,
    required: bool,
}

pub fn parse(
    text: &str,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let root = parse_tree(text)?;
    if root.local() != "schema" {
        return Err(ConvertError::parse_at(
            "#",
            "root element must be xs:schema",
        ));
    }

    let named_types =
        root.children_named("complexType").count() + root.children_named("simpleType").count();
    if named_types > 0 {
        stats.warn(format!(
            "{named_types} named global type definition(s) are not resolved and were ignored"
        ));
    }

    let mut elements = root.children_named("element");
    let first = elements.next().ok_or_else(|| {
        ConvertError::parse_at("#", "XSD must declare at least one global element")
    })?;
    if elements.next().is_some() {
        stats.warn("multiple global elements found; only the first is converted");
    }

    let parsed = parse_element(first, "#", 0, options, stats)?;
    Ok(parsed.schema)
}

fn parse_element(
    node: &XmlNode,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<ParsedElement, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    let name = match node.attr("name") {
        Some(name) => name.to_string(),
        None => match node.attr("ref") {
            Some(reference) => {
                stats.warn(format!(
                    "element reference '{reference}' at {path} is not resolved; treated as string"
                ));
                strip_ns_prefix(reference).to_string()
            }
            None => {
                return Err(ConvertError::parse_at(
                    path,
                    "element must have a 'name' or 'ref' attribute",
                ));
            }
        },
    };
    let path = format!("{path}/{name}");

    let mut schema = if let Some(type_attr) = node.attr("type") {
        resolve_type_ref(type_attr, &path, stats)
    } else if let Some(complex) = node.child("complexType") {
        parse_complex_type(complex, &path, depth + 1, options, stats)?
    } else if let Some(simple) = node.child("simpleType") {
        parse_simple_type(simple, &path, depth + 1, options, stats)?
    } else {
        // Untyped elements default to string
        UniversalSchema::string()
    };

    if let Some(doc) = documentation(node) {
        schema.description = Some(doc);
    }
    if node.attr("nillable") == Some("true") {
        schema.nullable = true;
    }
    if let Some(default) = node.attr("default") {
        schema.default = Some(json!(default));
    }

    let min_occurs = node.attr("minOccurs");
    let max_occurs = node.attr("maxOccurs");
    let max_bound = max_occurs.and_then(|v| v.parse::<u64>().ok());
    let is_array = max_occurs == Some("unbounded") || max_bound.is_some_and(|v| v > 1);

    if is_array {
        let mut constraints = Constraints::default();
        if let Some(min) = min_occurs.and_then(|v| v.parse::<u64>().ok()) {
            if min > 0 {
                constraints.min_items = Some(min);
            }
        }
        if let Some(max) = max_bound {
            constraints.max_items = Some(max);
        }
        let mut array = UniversalSchema::array(schema);
        if !constraints.is_empty() {
            array.constraints = Some(constraints);
        }
        schema = array;
    }

    Ok(ParsedElement {
        schema,
        required: min_occurs != Some("0"),
    })
}

/// Decode a `type="..."` reference. Built-ins map through the static table;
/// anything else is unresolvable (no named-type resolution) and degrades to
/// string.
fn resolve_type_ref(type_attr: &str, path: &str, stats: &mut ConversionStats) -> UniversalSchema {
    let local = strip_ns_prefix(type_attr);
    if let Some((kind, format)) = xsd_builtin(local) {
        let mut schema =
            UniversalSchema::primitive(kind).unwrap_or_else(|_| UniversalSchema::string());
        schema.format = format.map(str::to_string);
        return schema;
    }
    if local == "anyType" || local == "anySimpleType" {
        stats.warn(format!("xs:{local} at {path} mapped to an open map of strings"));
        return UniversalSchema::map(UniversalSchema::string());
    }
    stats.warn(format!(
        "unresolved type reference '{type_attr}' at {path}; treated as string"
    ));
    UniversalSchema::string()
}

fn parse_complex_type(
    node: &XmlNode,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    // A choice content model becomes a union of its branch types.
    if let Some(choice) = node.child("choice") {
        let mut members = Vec::new();
        for element in choice.children_named("element") {
            let parsed = parse_element(element, path, depth + 1, options, stats)?;
            members.push(parsed.schema);
        }
        if members.is_empty() {
            return Err(ConvertError::parse_at(
                path,
                "choice must contain at least one element",
            ));
        }
        return Ok(match members.len() {
            1 => members.into_iter().next().unwrap_or_else(UniversalSchema::null),
            _ => UniversalSchema::union(members),
        });
    }

    let mut properties = BTreeMap::new();
    let mut required = BTreeSet::new();

    if let Some(sequence) = node.child("sequence") {
        collect_members(sequence, &mut properties, &mut required, path, depth, options, stats)?;
    }
    // xs:all is a sequence whose order does not matter; the model's property
    // map is order-irrelevant anyway.
    if let Some(all) = node.child("all") {
        collect_members(all, &mut properties, &mut required, path, depth, options, stats)?;
    }

    for attr_node in node.children_named("attribute") {
        let attr_name = attr_node.attr("name").unwrap_or("");
        if attr_name.is_empty() {
            continue;
        }
        if !options.include_attributes {
            stats.warn(format!(
                "attribute '{attr_name}' at {path} skipped (attribute inclusion disabled)"
            ));
            continue;
        }
        let attr_path = format!("{path}/@{attr_name}");
        let mut attr_schema = if let Some(type_attr) = attr_node.attr("type") {
            resolve_type_ref(type_attr, &attr_path, stats)
        } else if let Some(simple) = attr_node.child("simpleType") {
            parse_simple_type(simple, &attr_path, depth + 1, options, stats)?
        } else {
            UniversalSchema::string()
        };
        if let Some(default) = attr_node.attr("default") {
            attr_schema.default = Some(json!(default));
        }
        if attr_node.attr("use") == Some("required") {
            required.insert(attr_name.to_string());
        }
        properties.insert(
            attr_name.to_string(),
            UniversalProperty::attribute(attr_schema),
        );
    }

    Ok(UniversalSchema::object(properties, required))
}

fn collect_members(
    node: &XmlNode,
    properties: &mut BTreeMap<String, UniversalProperty>,
    required: &mut BTreeSet<String>,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<(), ConvertError> {
    for element in node.children_named("element") {
        let parsed = parse_element(element, path, depth + 1, options, stats)?;
        let name = element
            .attr("name")
            .or_else(|| element.attr("ref").map(strip_ns_prefix))
            .unwrap_or_default()
            .to_string();
        if parsed.required {
            required.insert(name.clone());
        }
        properties.insert(name, UniversalProperty::new(parsed.schema));
    }

    // A choice nested inside a sequence has no object-model equivalent; its
    // branches become optional properties.
    for choice in node.children_named("choice") {
        stats.warn(format!(
            "xs:choice nested inside a sequence at {path}; branches merged as optional properties"
        ));
        for element in choice.children_named("element") {
            let parsed = parse_element(element, path, depth + 1, options, stats)?;
            let name = element.attr("name").unwrap_or_default().to_string();
            properties.insert(name, UniversalProperty::new(parsed.schema));
        }
    }

    for nested in node.children_named("sequence") {
        collect_members(nested, properties, required, path, depth + 1, options, stats)?;
    }

    Ok(())
}

fn parse_simple_type(
    node: &XmlNode,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    if let Some(restriction) = node.child("restriction") {
        return parse_restriction(restriction, path, stats);
    }

    if let Some(list) = node.child("list") {
        let item = match list.attr("itemType") {
            Some(item_type) => resolve_type_ref(item_type, path, stats),
            None => UniversalSchema::string(),
        };
        return Ok(UniversalSchema::array(item));
    }

    if let Some(union) = node.child("union") {
        let members: Vec<UniversalSchema> = union
            .attr("memberTypes")
            .unwrap_or_default()
            .split_whitespace()
            .map(|member| resolve_type_ref(member, path, stats))
            .collect();
        return Ok(match members.len() {
            0 => {
                stats.warn(format!(
                    "xs:union at {path} has no resolvable member types; treated as string"
                ));
                UniversalSchema::string()
            }
            1 => members.into_iter().next().unwrap_or_else(UniversalSchema::string),
            _ => UniversalSchema::union(members),
        });
    }

    Err(ConvertError::parse_at(
        path,
        "simpleType must contain a restriction, list, or union",
    ))
}

fn parse_restriction(
    node: &XmlNode,
    path: &str,
    stats: &mut ConversionStats,
) -> Result<UniversalSchema, ConvertError> {
    let base = node
        .attr("base")
        .ok_or_else(|| ConvertError::parse_at(path, "restriction must have a 'base' attribute"))?;
    let mut schema = resolve_type_ref(base, path, stats);

    let enumerations: Vec<_> = node
        .children_named("enumeration")
        .filter_map(|e| e.attr("value"))
        .map(|v| json!(v))
        .collect();
    if !enumerations.is_empty() {
        return Ok(UniversalSchema::enumeration(enumerations));
    }

    let facet_u64 = |name: &str| -> Option<u64> {
        node.child(name)?.attr("value")?.parse().ok()
    };
    let facet_f64 = |name: &str| -> Option<f64> {
        node.child(name)?.attr("value")?.parse().ok()
    };

    let mut constraints = Constraints {
        pattern: node
            .child("pattern")
            .and_then(|p| p.attr("value"))
            .map(str::to_string),
        min_length: facet_u64("minLength"),
        max_length: facet_u64("maxLength"),
        minimum: facet_f64("minInclusive"),
        maximum: facet_f64("maxInclusive"),
        exclusive_minimum: facet_f64("minExclusive"),
        exclusive_maximum: facet_f64("maxExclusive"),
        min_items: None,
        max_items: None,
        total_digits: facet_u64("totalDigits"),
        fraction_digits: facet_u64("fractionDigits"),
    };
    // xs:length pins both bounds
    if let Some(length) = facet_u64("length") {
        constraints.min_length = Some(length);
        constraints.max_length = Some(length);
    }

    if !constraints.is_empty() {
        schema.constraints = Some(constraints);
    }
    Ok(schema)
}

fn documentation(node: &XmlNode) -> Option<String> {
    let annotation = node.child("annotation")?;
    let docs: Vec<&str> = annotation
        .children_named("documentation")
        .map(|d| d.text.as_str())
        .filter(|t| !t.is_empty())
        .collect();
    if docs.is_empty() {
        None
    } else {
        Some(docs.join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Emit
// ---------------------------------------------------------------------------

type XmlWriter = Writer<Vec<u8>>;

pub fn emit(
    schema: &UniversalSchema,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<String, ConvertError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("xs:schema");
    root.push_attribute(("xmlns:xs", XS_NAMESPACE));
    root.push_attribute(("elementFormDefault", "qualified"));
    if let Some(namespace) = options.xsd_namespace() {
        root.push_attribute(("targetNamespace", namespace));
    }
    writer.write_event(Event::Start(root))?;

    emit_element(
        &mut writer,
        options.xsd_root_name(),
        schema,
        true,
        "#",
        0,
        options,
        stats,
    )?;

    writer.write_event(Event::End(BytesEnd::new("xs:schema")))?;

    String::from_utf8(writer.into_inner()).map_err(|_| {
        ConvertError::conversion(SchemaFormat::Xsd, "#", "generated document is not valid UTF-8")
    })
}

#[allow(clippy::too_many_arguments)]
fn emit_element(
    writer: &mut XmlWriter,
    name: &str,
    schema: &UniversalSchema,
    required: bool,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<(), ConvertError> {
    ensure_depth(depth, options.max_depth, path)?;

    let element_name = if is_valid_xml_name(name) {
        name.to_string()
    } else {
        let sanitized = sanitize_xml_name(name);
        stats.warn(format!(
            "element name '{name}' at {path} sanitized to '{sanitized}' for XSD"
        ));
        sanitized
    };
    let path = format!("{path}/{element_name}");

    let mut min_occurs: Option<String> = (!required).then(|| "0".to_string());
    let mut max_occurs: Option<String> = None;

    // Arrays surface as occurrence bounds on the item element.
    let mut node = schema;
    while node.kind() == SchemaKind::Array {
        if max_occurs.is_some() {
            stats.warn(format!(
                "nested array at {path} flattened: XSD has a single occurrence axis"
            ));
        }
        max_occurs = Some("unbounded".to_string());
        if let Some(constraints) = &node.constraints {
            if let Some(min) = constraints.min_items {
                min_occurs = Some(min.to_string());
            }
            if let Some(max) = constraints.max_items {
                max_occurs = Some(max.to_string());
            }
        }
        node = match node.items.as_deref() {
            Some(items) => items,
            None => {
                return Err(ConvertError::conversion(
                    SchemaFormat::Xsd,
                    &path,
                    "array node is missing its item type",
                ));
            }
        };
    }

    // Optional unions fold to minOccurs="0" + nillable instead of a choice.
    let mut nillable = node.nullable;
    if node.kind() == SchemaKind::Union {
        if let Some(inner) = node.optional_member() {
            min_occurs = Some("0".to_string());
            nillable = true;
            node = inner;
        }
    }
    if node.kind() == SchemaKind::Null {
        nillable = true;
    }

    let mut start = BytesStart::new("xs:element");
    start.push_attribute(("name", element_name.as_str()));

    let plain_primitive = node.kind().is_primitive()
        && node.constraints.as_ref().map_or(true, Constraints::is_empty);
    // A map of values has no XSD equivalent; it degrades to open content.
    let is_map = node.kind() == SchemaKind::Object
        && node.properties.is_empty()
        && node.additional_properties.is_some();
    if plain_primitive {
        start.push_attribute(("type", xsd_type_of(node)));
    } else if is_map {
        stats.warn(format!(
            "lossy conversion of map at {path}: emitted as xs:anyType"
        ));
        start.push_attribute(("type", "xs:anyType"));
    }
    if let Some(min) = &min_occurs {
        start.push_attribute(("minOccurs", min.as_str()));
    }
    if let Some(max) = &max_occurs {
        start.push_attribute(("maxOccurs", max.as_str()));
    }
    if nillable {
        start.push_attribute(("nillable", "true"));
    }

    if plain_primitive || is_map {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    match node.kind() {
        SchemaKind::Enum => {
            let values: Vec<String> = node
                .enum_values
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            write_restriction(writer, "xs:string", None, &values)?;
        }
        SchemaKind::Const => {
            let value = match &node.const_value {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            write_restriction(writer, "xs:string", None, &[value])?;
        }
        SchemaKind::Object => emit_complex_type(writer, node, &path, depth, options, stats)?,
        SchemaKind::Union => emit_choice(writer, node, &element_name, &path, depth, options, stats)?,
        _ => {
            // Constrained primitive
            write_restriction(
                writer,
                xsd_type_of(node),
                node.constraints.as_ref(),
                &[],
            )?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("xs:element")))?;
    Ok(())
}

/// Best XSD built-in for a scalar node: the format-specific type when the
/// format maps, else the kind's default from the primitive table.
fn xsd_type_of(node: &UniversalSchema) -> &'static str {
    if let Some(format) = node.format.as_deref() {
        if let Some(mapped) = xsd_type_for_format(format) {
            return mapped;
        }
    }
    primitive_for_kind(node.kind())
        .map(|row| row.xsd)
        .unwrap_or("xs:string")
}

fn emit_complex_type(
    writer: &mut XmlWriter,
    node: &UniversalSchema,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<(), ConvertError> {
    if node.properties.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("xs:complexType")))?;
        writer.write_event(Event::Empty(BytesStart::new("xs:sequence")))?;
        writer.write_event(Event::End(BytesEnd::new("xs:complexType")))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("xs:complexType")))?;
    writer.write_event(Event::Start(BytesStart::new("xs:sequence")))?;
    for (prop_name, prop) in &node.properties {
        if prop.attribute {
            continue;
        }
        emit_element(
            writer,
            prop_name,
            &prop.schema,
            node.required.contains(prop_name),
            path,
            depth + 1,
            options,
            stats,
        )?;
    }
    writer.write_event(Event::End(BytesEnd::new("xs:sequence")))?;

    for (prop_name, prop) in &node.properties {
        if !prop.attribute {
            continue;
        }
        if !options.include_attributes {
            stats.warn(format!(
                "attribute '{prop_name}' at {path} skipped (attribute inclusion disabled)"
            ));
            continue;
        }
        let mut attr = BytesStart::new("xs:attribute");
        attr.push_attribute(("name", prop_name.as_str()));
        if prop.schema.kind().is_primitive() {
            attr.push_attribute(("type", xsd_type_of(&prop.schema)));
        } else {
            stats.warn(format!(
                "attribute '{prop_name}' at {path} has a non-scalar type; emitted as xs:string"
            ));
            attr.push_attribute(("type", "xs:string"));
        }
        if node.required.contains(prop_name) {
            attr.push_attribute(("use", "required"));
        }
        writer.write_event(Event::Empty(attr))?;
    }

    writer.write_event(Event::End(BytesEnd::new("xs:complexType")))?;
    Ok(())
}

fn emit_choice(
    writer: &mut XmlWriter,
    node: &UniversalSchema,
    element_name: &str,
    path: &str,
    depth: usize,
    options: &ConvertOptions,
    stats: &mut ConversionStats,
) -> Result<(), ConvertError> {
    writer.write_event(Event::Start(BytesStart::new("xs:complexType")))?;
    writer.write_event(Event::Start(BytesStart::new("xs:choice")))?;
    for (i, member) in node.union_members.iter().enumerate() {
        let branch_name = format!("{element_name}_choice{i}");
        emit_element(
            writer,
            &branch_name,
            member,
            true,
            path,
            depth + 1,
            options,
            stats,
        )?;
    }
    writer.write_event(Event::End(BytesEnd::new("xs:choice")))?;
    writer.write_event(Event::End(BytesEnd::new("xs:complexType")))?;
    Ok(())
}

/// Write an anonymous `xs:simpleType`/`xs:restriction` block carrying either
/// facets or enumeration values.
fn write_restriction(
    writer: &mut XmlWriter,
    base: &str,
    constraints: Option<&Constraints>,
    enumerations: &[String],
) -> Result<(), ConvertError> {
    writer.write_event(Event::Start(BytesStart::new("xs:simpleType")))?;
    let mut restriction = BytesStart::new("xs:restriction");
    restriction.push_attribute(("base", base));
    writer.write_event(Event::Start(restriction))?;

    if let Some(c) = constraints {
        if let Some(pattern) = &c.pattern {
            write_facet(writer, "xs:pattern", pattern)?;
        }
        if let Some(v) = c.min_length {
            write_facet(writer, "xs:minLength", &v.to_string())?;
        }
        if let Some(v) = c.max_length {
            write_facet(writer, "xs:maxLength", &v.to_string())?;
        }
        if let Some(v) = c.minimum {
            write_facet(writer, "xs:minInclusive", &format_number(v))?;
        }
        if let Some(v) = c.maximum {
            write_facet(writer, "xs:maxInclusive", &format_number(v))?;
        }
        if let Some(v) = c.exclusive_minimum {
            write_facet(writer, "xs:minExclusive", &format_number(v))?;
        }
        if let Some(v) = c.exclusive_maximum {
            write_facet(writer, "xs:maxExclusive", &format_number(v))?;
        }
        if let Some(v) = c.total_digits {
            write_facet(writer, "xs:totalDigits", &v.to_string())?;
        }
        if let Some(v) = c.fraction_digits {
            write_facet(writer, "xs:fractionDigits", &v.to_string())?;
        }
    }

    for value in enumerations {
        write_facet(writer, "xs:enumeration", value)?;
    }

    writer.write_event(Event::End(BytesEnd::new("xs:restriction")))?;
    writer.write_event(Event::End(BytesEnd::new("xs:simpleType")))?;
    Ok(())
}

fn write_facet(writer: &mut XmlWriter, name: &str, value: &str) -> Result<(), ConvertError> {
    let mut facet = BytesStart::new(name);
    facet.push_attribute(("value", value));
    writer.write_event(Event::Empty(facet))?;
    Ok(())
}

/// Whole numbers print without a trailing `.0` so facet values read as XSD
/// integers where possible.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse_str(text: &str) -> Result<UniversalSchema, ConvertError> {
        let options = ConvertOptions::default();
        let mut stats = ConversionStats::default();
        parse(text, &options, &mut stats)
    }

    fn emit_with(schema: &UniversalSchema, options: &ConvertOptions) -> String {
        let mut stats = ConversionStats::default();
        emit(schema, options, &mut stats).unwrap()
    }

    fn emit_default(schema: &UniversalSchema) -> String {
        emit_with(schema, &ConvertOptions::default())
    }

    fn object_with(name: &str, prop: UniversalSchema, required: bool) -> UniversalSchema {
        let mut props = BTreeMap::new();
        props.insert(name.to_string(), UniversalProperty::new(prop));
        let required = if required {
            BTreeSet::from([name.to_string()])
        } else {
            BTreeSet::new()
        };
        UniversalSchema::object(props, required)
    }

    const PERSON_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" elementFormDefault="qualified">
  <xs:element name="Person">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="name" type="xs:string"/>
        <xs:element name="age" type="xs:integer" minOccurs="0"/>
        <xs:element name="tag" type="xs:string" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    // -----------------------------------------------------------------------
    // Test 1: sequence parse: required, optional, array
    // -----------------------------------------------------------------------
    #[test]
    fn test_parse_sequence() {
        let schema = parse_str(PERSON_XSD).unwrap();
        assert_eq!(schema.kind(), SchemaKind::Object);
        assert!(schema.required.contains("name"));
        assert!(!schema.required.contains("age"));
        assert_eq!(schema.properties["age"].schema.kind(), SchemaKind::Integer);
        assert_eq!(schema.properties["tag"].schema.kind(), SchemaKind::Array);
    }

    // -----------------------------------------------------------------------
    // Test 2: choice parse: member types preserved in order
    // -----------------------------------------------------------------------
    #[test]
    fn test_parse_choice() {
        let schema = parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Value">
    <xs:complexType>
      <xs:choice>
        <xs:element name="text" type="xs:string"/>
        <xs:element name="count" type="xs:integer"/>
      </xs:choice>
    </xs:complexType>
  </xs:element>
</xs:schema>"#,
        )
        .unwrap();

        assert_eq!(schema.kind(), SchemaKind::Union);
        assert_eq!(schema.union_members.len(), 2);
        assert_eq!(schema.union_members[0].kind(), SchemaKind::String);
        assert_eq!(schema.union_members[1].kind(), SchemaKind::Integer);
    }

    // -----------------------------------------------------------------------
    // Test 3: restriction facets and enumerations
    // -----------------------------------------------------------------------
    #[test]
    fn test_parse_restriction() {
        let schema = parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Code">
    <xs:simpleType>
      <xs:restriction base="xs:string">
        <xs:pattern value="[A-Z]{2}"/>
        <xs:minLength value="2"/>
        <xs:maxLength value="2"/>
      </xs:restriction>
    </xs:simpleType>
  </xs:element>
</xs:schema>"#,
        )
        .unwrap();

        let c = schema.constraints.as_ref().unwrap();
        assert_eq!(c.pattern.as_deref(), Some("[A-Z]{2}"));
        assert_eq!(c.min_length, Some(2));
        assert_eq!(c.max_length, Some(2));

        let schema = parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Suit">
    <xs:simpleType>
      <xs:restriction base="xs:string">
        <xs:enumeration value="HEARTS"/>
        <xs:enumeration value="SPADES"/>
      </xs:restriction>
    </xs:simpleType>
  </xs:element>
</xs:schema>"#,
        )
        .unwrap();
        assert_eq!(schema.kind(), SchemaKind::Enum);
        assert_eq!(schema.enum_values, vec![json!("HEARTS"), json!("SPADES")]);
    }

    // -----------------------------------------------------------------------
    // Test 4: built-in date/time types decode to formats
    // -----------------------------------------------------------------------
    #[test]
    fn test_parse_builtin_formats() {
        let schema = parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="When" type="xs:dateTime"/>
</xs:schema>"#,
        )
        .unwrap();
        assert_eq!(schema.kind(), SchemaKind::String);
        assert_eq!(schema.format.as_deref(), Some("date-time"));
    }

    // -----------------------------------------------------------------------
    // Test 5: no global element fails parse
    // -----------------------------------------------------------------------
    #[test]
    fn test_parse_empty_schema_fails() {
        let err = parse_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"></xs:schema>"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_PARSE_ERROR");
        assert!(err.to_string().contains("element"));
    }

    // -----------------------------------------------------------------------
    // Test 6: malformed XML fails parse
    // -----------------------------------------------------------------------
    #[test]
    fn test_parse_malformed_xml_fails() {
        let err = parse_str("<xs:schema><unclosed></xs:schema>").unwrap_err();
        assert_eq!(err.code(), "SCHEMA_PARSE_ERROR");
    }

    // -----------------------------------------------------------------------
    // Test 7: emit object: optional property gets minOccurs="0"
    // -----------------------------------------------------------------------
    #[test]
    fn test_emit_object() {
        let mut props = BTreeMap::new();
        props.insert(
            "name".to_string(),
            UniversalProperty::new(UniversalSchema::string()),
        );
        props.insert(
            "age".to_string(),
            UniversalProperty::new(UniversalSchema::integer()),
        );
        let schema = UniversalSchema::object(props, BTreeSet::from(["name".to_string()]));

        let xsd = emit_default(&schema);
        assert!(xsd.contains(r#"<xs:element name="RootElement">"#));
        assert!(xsd.contains(r#"<xs:element name="name" type="xs:string"/>"#));
        assert!(xsd.contains(r#"<xs:element name="age" type="xs:integer" minOccurs="0"/>"#));
        assert!(xsd.contains("elementFormDefault=\"qualified\""));
    }

    // -----------------------------------------------------------------------
    // Test 8: emit constraints as an anonymous restriction
    // -----------------------------------------------------------------------
    #[test]
    fn test_emit_constraints() {
        let mut string = UniversalSchema::string();
        string.constraints = Some(Constraints {
            pattern: Some("^[a-z]+$".to_string()),
            min_length: Some(3),
            max_length: Some(20),
            ..Constraints::default()
        });
        let schema = object_with("username", string, true);

        let xsd = emit_default(&schema);
        assert!(xsd.contains(r#"<xs:restriction base="xs:string">"#));
        assert!(xsd.contains(r#"<xs:pattern value="^[a-z]+$"/>"#));
        assert!(xsd.contains(r#"<xs:minLength value="3"/>"#));
        assert!(xsd.contains(r#"<xs:maxLength value="20"/>"#));
    }

    // -----------------------------------------------------------------------
    // Test 9: emit enum as enumeration facets
    // -----------------------------------------------------------------------
    #[test]
    fn test_emit_enum() {
        let en = UniversalSchema::enumeration(vec![json!("A"), json!("B"), json!("C")]);
        let schema = object_with("grade", en, true);

        let xsd = emit_default(&schema);
        assert!(xsd.contains(r#"<xs:enumeration value="A"/>"#));
        assert!(xsd.contains(r#"<xs:enumeration value="B"/>"#));
        assert!(xsd.contains(r#"<xs:enumeration value="C"/>"#));
    }

    // -----------------------------------------------------------------------
    // Test 10: emit union as a two-branch choice
    // -----------------------------------------------------------------------
    #[test]
    fn test_emit_union_choice() {
        let union =
            UniversalSchema::union(vec![UniversalSchema::string(), UniversalSchema::integer()]);
        let schema = object_with("value", union, true);

        let xsd = emit_default(&schema);
        assert!(xsd.contains("<xs:choice>"));
        assert!(xsd.contains(r#"<xs:element name="value_choice0" type="xs:string"/>"#));
        assert!(xsd.contains(r#"<xs:element name="value_choice1" type="xs:integer"/>"#));
    }

    // -----------------------------------------------------------------------
    // Test 11: optional union folds to minOccurs="0", not a choice
    // -----------------------------------------------------------------------
    #[test]
    fn test_emit_optional_union_folds() {
        let optional =
            UniversalSchema::union(vec![UniversalSchema::null(), UniversalSchema::string()]);
        let schema = object_with("nickname", optional, true);

        let xsd = emit_default(&schema);
        assert!(!xsd.contains("<xs:choice>"));
        assert!(xsd.contains(
            r#"<xs:element name="nickname" type="xs:string" minOccurs="0" nillable="true"/>"#
        ));
    }

    // -----------------------------------------------------------------------
    // Test 12: arrays emit maxOccurs, with explicit bounds when present
    // -----------------------------------------------------------------------
    #[test]
    fn test_emit_array_bounds() {
        let array = UniversalSchema::array(UniversalSchema::string());
        let schema = object_with("tags", array, true);
        let xsd = emit_default(&schema);
        assert!(xsd.contains(r#"<xs:element name="tags" type="xs:string" maxOccurs="unbounded"/>"#));

        let mut bounded = UniversalSchema::array(UniversalSchema::string());
        bounded.constraints = Some(Constraints {
            min_items: Some(1),
            max_items: Some(5),
            ..Constraints::default()
        });
        let schema = object_with("tags", bounded, true);
        let xsd = emit_default(&schema);
        assert!(xsd.contains(r#"minOccurs="1""#));
        assert!(xsd.contains(r#"maxOccurs="5""#));
    }

    // -----------------------------------------------------------------------
    // Test 13: attribute round trip honors the toggle
    // -----------------------------------------------------------------------
    #[test]
    fn test_attribute_round_trip_toggle() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Order">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="total" type="xs:decimal"/>
      </xs:sequence>
      <xs:attribute name="currency" type="xs:string" use="required"/>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

        // Disabled (default): attribute skipped with a warning
        let options = ConvertOptions::default();
        let mut stats = ConversionStats::default();
        let schema = parse(text, &options, &mut stats).unwrap();
        assert!(!schema.properties.contains_key("currency"));
        assert!(stats.warnings.iter().any(|w| w.contains("currency")));

        // Enabled: parsed as an attribute property and emitted back
        let options = ConvertOptions {
            include_attributes: true,
            ..ConvertOptions::default()
        };
        let mut stats = ConversionStats::default();
        let schema = parse(text, &options, &mut stats).unwrap();
        assert!(schema.properties["currency"].attribute);
        assert!(schema.required.contains("currency"));

        let xsd = emit_with(&schema, &options);
        assert!(xsd.contains(r#"<xs:attribute name="currency" type="xs:string" use="required"/>"#));
    }

    // -----------------------------------------------------------------------
    // Test 14: targetNamespace stamped only when configured
    // -----------------------------------------------------------------------
    #[test]
    fn test_emit_target_namespace() {
        let schema = object_with("id", UniversalSchema::string(), true);

        let plain = emit_default(&schema);
        assert!(!plain.contains("targetNamespace"));

        let options = ConvertOptions {
            namespace: Some("http://example.com/order".to_string()),
            ..ConvertOptions::default()
        };
        let with_ns = emit_with(&schema, &options);
        assert!(with_ns.contains(r#"targetNamespace="http://example.com/order""#));
    }
}
