//! # schemashift
//!
//! Convert schema *definitions* between JSON Schema, Avro Schema, and XSD.
//!
//! Every conversion parses the source text into one canonical
//! [`UniversalSchema`] tree, then emits that tree independently into each
//! requested target, so an N-way conversion costs one parse plus N emits.
//! Constructs with no equivalent in a target (a regex pattern in Avro, a map
//! type in XSD) degrade with a recorded warning instead of failing.
//!
//! The engine is a pure, synchronous computation: no I/O, no shared state,
//! no panics. Failures come back as values: [`convert`] encodes them in the
//! outcome's error fields, [`try_convert`] returns them as [`ConvertError`].
//!
//! ## Example
//!
//! ```
//! use schemashift_core::{convert, ConvertOptions, SchemaFormat};
//!
//! let options = ConvertOptions {
//!     source: SchemaFormat::Jsonschema,
//!     targets: vec![SchemaFormat::Avro],
//!     ..ConvertOptions::default()
//! };
//! let outcome = convert(
//!     r#"{"type":"object","properties":{"id":{"type":"string"}},"required":["id"]}"#,
//!     &options,
//! );
//! assert!(!outcome.error);
//! assert!(outcome.avro_schema.contains("record"));
//! ```

pub mod codec;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod mapping;
pub mod model;

pub use config::{ConvertOptions, JsonSchemaVersion, SchemaFormat, UnionMode};
pub use convert::{convert, try_convert, ConvertOutcome};
pub use diagnostics::ConversionStats;
pub use error::ConvertError;
pub use model::{Constraints, SchemaKind, UniversalProperty, UniversalSchema};
