//! Conversion diagnostics — processing counters and non-fatal warnings.

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;
use crate::model::{SchemaKind, UniversalSchema};

/// Counters and warnings accumulated over one conversion call.
///
/// Warnings record lossy or skipped constructs (a dropped `allOf` member, a
/// map emitted as `xs:anyType`, a skipped attribute). They never fail the
/// conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConversionStats {
    /// Object properties visited across the whole tree.
    pub elements_processed: usize,
    /// Universal nodes visited across the whole tree.
    pub types_processed: usize,
    /// Individual constraint facets carried by the tree.
    pub constraints_applied: usize,
    /// Non-fatal oddities encountered during parse and emit.
    pub warnings: Vec<String>,
}

impl ConversionStats {
    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Count nodes, properties, and constraints by walking the parsed tree.
    pub(crate) fn tally(
        &mut self,
        schema: &UniversalSchema,
        max_depth: usize,
    ) -> Result<(), ConvertError> {
        let mut types = 0usize;
        let mut elements = 0usize;
        let mut constraints = 0usize;
        schema.walk(max_depth, &mut |node| {
            types += 1;
            if node.kind() == SchemaKind::Object {
                elements += node.properties.len();
            }
            if let Some(c) = &node.constraints {
                constraints += c.count();
            }
        })?;
        self.types_processed = types;
        self.elements_processed = elements;
        self.constraints_applied = constraints;
        Ok(())
    }
}
