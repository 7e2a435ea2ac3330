//! Cross-format round trips through the universal model.

use schemashift_core::{convert, ConvertOptions, SchemaFormat};
use serde_json::{json, Value};

fn convert_from(
    source: SchemaFormat,
    targets: Vec<SchemaFormat>,
    text: &str,
) -> schemashift_core::ConvertOutcome {
    let options = ConvertOptions {
        source,
        targets,
        ..ConvertOptions::default()
    };
    let outcome = convert(text, &options);
    assert!(!outcome.error, "conversion failed: {}", outcome.error_message);
    outcome
}

// 1. Avro record → JSON Schema: requiredness and nested structure survive
#[test]
fn test_avro_to_json_schema() {
    let outcome = convert_from(
        SchemaFormat::Avro,
        vec![SchemaFormat::Jsonschema],
        r#"{
            "type": "record",
            "name": "User",
            "fields": [
                { "name": "id", "type": "string" },
                { "name": "scores", "type": { "type": "array", "items": "double" } },
                { "name": "nickname", "type": ["null", "string"], "default": null }
            ]
        }"#,
    );

    let schema: Value = serde_json::from_str(&outcome.json_schema).unwrap();
    assert_eq!(schema["type"], json!("object"));
    assert_eq!(schema["required"], json!(["id", "scores"]));
    assert_eq!(schema["properties"]["id"]["type"], json!("string"));
    assert_eq!(schema["properties"]["scores"]["type"], json!("array"));
    assert_eq!(
        schema["properties"]["scores"]["items"]["type"],
        json!("number")
    );
    assert_eq!(schema["properties"]["nickname"]["type"], json!("string"));
}

// 2. XSD → JSON Schema: occurrence constraints become required/array
#[test]
fn test_xsd_to_json_schema() {
    let outcome = convert_from(
        SchemaFormat::Xsd,
        vec![SchemaFormat::Jsonschema],
        r#"<?xml version="1.0" encoding="UTF-8"?>
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
</xs:schema>"#,
    );

    let schema: Value = serde_json::from_str(&outcome.json_schema).unwrap();
    assert_eq!(schema["type"], json!("object"));
    assert_eq!(schema["required"], json!(["name", "tag"]));
    assert_eq!(schema["properties"]["age"]["type"], json!("integer"));
    assert_eq!(schema["properties"]["tag"]["type"], json!("array"));
    assert_eq!(schema["properties"]["tag"]["items"]["type"], json!("string"));
}

// 3. JSON Schema → XSD → JSON Schema: constraints survive the full loop
#[test]
fn test_json_schema_through_xsd_loop() {
    let original = r#"{
        "type": "object",
        "properties": {
            "code": {
                "type": "string",
                "minLength": 2,
                "maxLength": 8,
                "pattern": "^[A-Z]+$"
            },
            "count": { "type": "integer", "minimum": 0, "maximum": 100 }
        },
        "required": ["code", "count"]
    }"#;

    let to_xsd = convert_from(SchemaFormat::Jsonschema, vec![SchemaFormat::Xsd], original);
    let back = convert_from(
        SchemaFormat::Xsd,
        vec![SchemaFormat::Jsonschema],
        &to_xsd.xsd,
    );

    let schema: Value = serde_json::from_str(&back.json_schema).unwrap();
    assert_eq!(schema["required"], json!(["code", "count"]));
    let code = &schema["properties"]["code"];
    assert_eq!(code["minLength"], json!(2));
    assert_eq!(code["maxLength"], json!(8));
    assert_eq!(code["pattern"], json!("^[A-Z]+$"));
    let count = &schema["properties"]["count"];
    assert_eq!(count["minimum"], json!(0));
    assert_eq!(count["maximum"], json!(100));
}

// 4. Avro map ↔ JSON Schema additionalProperties
#[test]
fn test_map_round_trip() {
    let outcome = convert_from(
        SchemaFormat::Avro,
        vec![SchemaFormat::Jsonschema],
        r#"{"type": "map", "values": "long"}"#,
    );
    let schema: Value = serde_json::from_str(&outcome.json_schema).unwrap();
    assert_eq!(schema["type"], json!("object"));
    assert_eq!(schema["additionalProperties"]["type"], json!("integer"));

    let back = convert_from(
        SchemaFormat::Jsonschema,
        vec![SchemaFormat::Avro],
        &outcome.json_schema,
    );
    let avro: Value = serde_json::from_str(&back.avro_schema).unwrap();
    assert_eq!(avro["type"], json!("map"));
    assert_eq!(avro["values"], json!("long"));
}

// 5. Logical types decode to formats and re-encode when enabled
#[test]
fn test_logical_type_round_trip() {
    let avro_in = r#"{
        "type": "record",
        "name": "Event",
        "fields": [
            { "name": "when", "type": { "type": "long", "logicalType": "timestamp-millis" } }
        ]
    }"#;

    let to_json = convert_from(SchemaFormat::Avro, vec![SchemaFormat::Jsonschema], avro_in);
    let schema: Value = serde_json::from_str(&to_json.json_schema).unwrap();
    assert_eq!(schema["properties"]["when"]["type"], json!("string"));
    assert_eq!(schema["properties"]["when"]["format"], json!("date-time"));

    let options = ConvertOptions {
        source: SchemaFormat::Jsonschema,
        targets: vec![SchemaFormat::Avro],
        logical_types: true,
        ..ConvertOptions::default()
    };
    let back = convert(&to_json.json_schema, &options);
    assert!(!back.error, "{}", back.error_message);
    let avro: Value = serde_json::from_str(&back.avro_schema).unwrap();
    assert_eq!(
        avro["fields"][0]["type"],
        json!({"type": "long", "logicalType": "timestamp-millis"})
    );
}

// 6. Avro fixed degrades to a length-pinned string
#[test]
fn test_fixed_degrades_to_pinned_length() {
    let outcome = convert_from(
        SchemaFormat::Avro,
        vec![SchemaFormat::Jsonschema, SchemaFormat::Xsd],
        r#"{"type": "fixed", "name": "Md5", "size": 16}"#,
    );

    let schema: Value = serde_json::from_str(&outcome.json_schema).unwrap();
    assert_eq!(schema["type"], json!("string"));
    assert_eq!(schema["minLength"], json!(16));
    assert_eq!(schema["maxLength"], json!(16));

    assert!(outcome.xsd.contains(r#"<xs:minLength value="16"/>"#));
    assert!(outcome.xsd.contains(r#"<xs:maxLength value="16"/>"#));
}

// 7. XSD choice → Avro union and back to a choice
#[test]
fn test_choice_through_avro_loop() {
    let xsd_in = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Value">
    <xs:complexType>
      <xs:choice>
        <xs:element name="text" type="xs:string"/>
        <xs:element name="flag" type="xs:boolean"/>
      </xs:choice>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    let to_avro = convert_from(SchemaFormat::Xsd, vec![SchemaFormat::Avro], xsd_in);
    let avro: Value = serde_json::from_str(&to_avro.avro_schema).unwrap();
    assert_eq!(avro, json!(["string", "boolean"]));

    let back = convert_from(SchemaFormat::Avro, vec![SchemaFormat::Xsd], &to_avro.avro_schema);
    assert!(back.xsd.contains("<xs:choice>"));
    assert!(back.xsd.contains(r#"type="xs:string""#));
    assert!(back.xsd.contains(r#"type="xs:boolean""#));
}
