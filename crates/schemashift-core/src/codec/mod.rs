//! Per-format codecs: each parses its language into the universal model and
//! emits the universal model back out.

pub mod avro;
pub mod json_schema;
pub mod xsd;
