//! The canonical intermediate representation all three codecs parse into and
//! emit from.
//!
//! A [`UniversalSchema`] is a tagged union over ten [`SchemaKind`]s. The kind
//! discriminator is private: trees are built through the per-kind
//! constructors, which establish the invariant that kind-specific fields are
//! populated only for their owning kind. Trees are immutable once built and
//! strictly parent-owned, with no back-references and no sharing, so
//! emitters can walk them read-only without any bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::ConvertError;

// ---------------------------------------------------------------------------
// Kind discriminator
// ---------------------------------------------------------------------------

/// The ten recognized shapes a type position can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    Enum,
    Union,
    Const,
}

impl SchemaKind {
    /// Decode a kind name, failing with `UNSUPPORTED_CONSTRUCT` for anything
    /// outside the ten recognized kinds.
    pub fn parse(name: &str) -> Result<Self, ConvertError> {
        match name {
            "null" => Ok(Self::Null),
            "boolean" => Ok(Self::Boolean),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            "enum" => Ok(Self::Enum),
            "union" => Ok(Self::Union),
            "const" => Ok(Self::Const),
            other => Err(ConvertError::UnsupportedConstruct(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Enum => "enum",
            Self::Union => "union",
            Self::Const => "const",
        }
    }

    /// True for the five scalar kinds that map through the primitive table.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Boolean | Self::Integer | Self::Number | Self::String
        )
    }
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Facet-style restrictions attached to a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    /// Decimal precision (XSD `totalDigits`, Avro decimal `precision`).
    pub total_digits: Option<u64>,
    /// Decimal scale (XSD `fractionDigits`, Avro decimal `scale`).
    pub fraction_digits: Option<u64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of facets populated.
    pub fn count(&self) -> usize {
        self.pattern.is_some() as usize
            + self.min_length.is_some() as usize
            + self.max_length.is_some() as usize
            + self.minimum.is_some() as usize
            + self.maximum.is_some() as usize
            + self.exclusive_minimum.is_some() as usize
            + self.exclusive_maximum.is_some() as usize
            + self.min_items.is_some() as usize
            + self.max_items.is_some() as usize
            + self.total_digits.is_some() as usize
            + self.fraction_digits.is_some() as usize
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// One named member of an object node.
#[derive(Debug, Clone, PartialEq)]
pub struct UniversalProperty {
    pub schema: UniversalSchema,
    /// Parsed from an XSD attribute rather than an element. Round-tripped
    /// back to an attribute only when attribute inclusion is enabled.
    pub attribute: bool,
}

impl UniversalProperty {
    pub fn new(schema: UniversalSchema) -> Self {
        Self {
            schema,
            attribute: false,
        }
    }

    pub fn attribute(schema: UniversalSchema) -> Self {
        Self {
            schema,
            attribute: true,
        }
    }
}

/// One type position in the canonical tree.
#[derive(Debug, Clone, PartialEq)]
pub struct UniversalSchema {
    kind: SchemaKind,
    /// Populated only when `kind == Object`.
    pub properties: BTreeMap<String, UniversalProperty>,
    /// Property names that must be present. Meaningful only on object nodes.
    pub required: BTreeSet<String>,
    /// Schema for arbitrary extra keys (a map-of-values type). Object nodes
    /// only.
    pub additional_properties: Option<Box<UniversalSchema>>,
    /// Populated only when `kind == Array`.
    pub items: Option<Box<UniversalSchema>>,
    /// Populated only when `kind == Enum`. Order preserved.
    pub enum_values: Vec<Value>,
    /// Populated only when `kind == Union`. Order preserved; always 2+
    /// members.
    pub union_members: Vec<UniversalSchema>,
    /// Populated only when `kind == Const`.
    pub const_value: Option<Value>,
    pub constraints: Option<Constraints>,
    /// Opaque metadata, interpreted only where a target maps it (e.g.
    /// `format: "date"` routes to `xs:date` / the Avro `date` logical type).
    pub format: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub nullable: bool,
}

impl UniversalSchema {
    fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            properties: BTreeMap::new(),
            required: BTreeSet::new(),
            additional_properties: None,
            items: None,
            enum_values: Vec::new(),
            union_members: Vec::new(),
            const_value: None,
            constraints: None,
            format: None,
            description: None,
            default: None,
            nullable: false,
        }
    }

    pub fn null() -> Self {
        let mut node = Self::of_kind(SchemaKind::Null);
        node.nullable = true;
        node
    }

    pub fn boolean() -> Self {
        Self::of_kind(SchemaKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::of_kind(SchemaKind::Integer)
    }

    pub fn number() -> Self {
        Self::of_kind(SchemaKind::Number)
    }

    pub fn string() -> Self {
        Self::of_kind(SchemaKind::String)
    }

    /// Scalar node for any of the five primitive kinds. Non-primitive kinds
    /// are rejected; their constructors take the kind-specific payload.
    pub fn primitive(kind: SchemaKind) -> Result<Self, ConvertError> {
        if !kind.is_primitive() {
            return Err(ConvertError::UnsupportedConstruct(format!(
                "{} is not a primitive kind",
                kind.as_str()
            )));
        }
        Ok(match kind {
            SchemaKind::Null => Self::null(),
            _ => Self::of_kind(kind),
        })
    }

    pub fn array(items: UniversalSchema) -> Self {
        let mut node = Self::of_kind(SchemaKind::Array);
        node.items = Some(Box::new(items));
        node
    }

    pub fn object(
        properties: BTreeMap<String, UniversalProperty>,
        required: BTreeSet<String>,
    ) -> Self {
        let mut node = Self::of_kind(SchemaKind::Object);
        node.required = required
            .into_iter()
            .filter(|name| properties.contains_key(name))
            .collect();
        node.properties = properties;
        node
    }

    /// Map-of-values object: arbitrary keys, uniformly typed values.
    pub fn map(values: UniversalSchema) -> Self {
        let mut node = Self::of_kind(SchemaKind::Object);
        node.additional_properties = Some(Box::new(values));
        node
    }

    pub fn enumeration(values: Vec<Value>) -> Self {
        let mut node = Self::of_kind(SchemaKind::Enum);
        node.enum_values = values;
        node
    }

    /// Union node. Callers must pass at least two members; single-member
    /// unions are collapsed to the member at parse time.
    pub fn union(members: Vec<UniversalSchema>) -> Self {
        debug_assert!(members.len() >= 2, "union requires 2+ members");
        let mut node = Self::of_kind(SchemaKind::Union);
        node.nullable = members.iter().any(|m| m.kind == SchemaKind::Null);
        node.union_members = members;
        node
    }

    pub fn constant(value: Value) -> Self {
        let mut node = Self::of_kind(SchemaKind::Const);
        node.const_value = Some(value);
        node
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// The distinguished "optional X" sub-case: a two-member union whose
    /// members are exactly `{null, X}`. Returns X, or `None` for any other
    /// shape.
    pub fn optional_member(&self) -> Option<&UniversalSchema> {
        if self.kind != SchemaKind::Union || self.union_members.len() != 2 {
            return None;
        }
        match (
            self.union_members[0].kind == SchemaKind::Null,
            self.union_members[1].kind == SchemaKind::Null,
        ) {
            (true, false) => Some(&self.union_members[1]),
            (false, true) => Some(&self.union_members[0]),
            _ => None,
        }
    }

    /// Depth-bounded pre-order walk over the tree.
    pub fn walk<F>(&self, max_depth: usize, visit: &mut F) -> Result<(), ConvertError>
    where
        F: FnMut(&UniversalSchema),
    {
        self.walk_at("#", 0, max_depth, visit)
    }

    fn walk_at<F>(
        &self,
        path: &str,
        depth: usize,
        max_depth: usize,
        visit: &mut F,
    ) -> Result<(), ConvertError>
    where
        F: FnMut(&UniversalSchema),
    {
        ensure_depth(depth, max_depth, path)?;
        visit(self);
        for (name, prop) in &self.properties {
            let child_path = format!("{path}/{name}");
            prop.schema.walk_at(&child_path, depth + 1, max_depth, visit)?;
        }
        if let Some(values) = &self.additional_properties {
            let child_path = format!("{path}/*");
            values.walk_at(&child_path, depth + 1, max_depth, visit)?;
        }
        if let Some(items) = &self.items {
            let child_path = format!("{path}/items");
            items.walk_at(&child_path, depth + 1, max_depth, visit)?;
        }
        for (i, member) in self.union_members.iter().enumerate() {
            let child_path = format!("{path}/{i}");
            member.walk_at(&child_path, depth + 1, max_depth, visit)?;
        }
        Ok(())
    }
}

/// Depth guard shared by every recursive parse and emit.
pub(crate) fn ensure_depth(depth: usize, max_depth: usize, path: &str) -> Result<(), ConvertError> {
    if depth > max_depth {
        return Err(ConvertError::RecursionDepthExceeded {
            path: path.to_string(),
            max_depth,
        });
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
