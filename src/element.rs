//! Schema IR: the element tagged union and named schema sets
//!
//! Elements serialize to the JSON form of the IR:
//!
//! ```json
//! { "type": "object", "definition": {
//!     "name": { "type": "simpleType", "definition": "string" },
//!     "next": { "type": "schemaReference", "definition": "Node", "optional": true }
//! } }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Primitive kinds accepted by `simpleType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleKind {
    Any,
    Boolean,
    String,
    Number,
}

impl SimpleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimpleKind::Any => "any",
            SimpleKind::Boolean => "boolean",
            SimpleKind::String => "string",
            SimpleKind::Number => "number",
        }
    }
}

impl fmt::Display for SimpleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One node of the schema IR.
///
/// The set of variants is closed. Every traversal (compiler, dependency
/// analysis, JSON Schema rendering) matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SchemaElement {
    /// Exactly one string value
    Literal {
        definition: String,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// A primitive of the given kind
    SimpleType {
        definition: SimpleKind,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// Any one of the listed strings. Fewer than two entries validate as `any`.
    Enum {
        definition: Vec<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// An object whose listed attributes satisfy their elements
    Object {
        definition: BTreeMap<String, SchemaElement>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// A sequence of items all satisfying the child
    Array {
        definition: Box<SchemaElement>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// A string-keyed map whose values all satisfy the child
    Record {
        definition: Box<SchemaElement>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// At least one branch matches
    Union {
        definition: Vec<SchemaElement>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// A callable value. Argument and return shapes are informational.
    Function {
        #[serde(default)]
        args: Vec<SchemaElement>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        returns: Option<Box<SchemaElement>>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// Defers compilation of its child (a `function` element) to first use
    Lazy {
        definition: Box<SchemaElement>,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// Whatever the named sibling in the enclosing set matches
    SchemaReference {
        definition: String,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
}

impl SchemaElement {
    // ========== Builders ==========

    pub fn literal(value: impl Into<String>) -> Self {
        SchemaElement::Literal { definition: value.into(), optional: false }
    }

    pub fn simple(kind: SimpleKind) -> Self {
        SchemaElement::SimpleType { definition: kind, optional: false }
    }

    pub fn any() -> Self {
        Self::simple(SimpleKind::Any)
    }

    pub fn boolean() -> Self {
        Self::simple(SimpleKind::Boolean)
    }

    pub fn string() -> Self {
        Self::simple(SimpleKind::String)
    }

    pub fn number() -> Self {
        Self::simple(SimpleKind::Number)
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaElement::Enum {
            definition: values.into_iter().map(Into::into).collect(),
            optional: false,
        }
    }

    pub fn object<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (S, SchemaElement)>,
        S: Into<String>,
    {
        SchemaElement::Object {
            definition: attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            optional: false,
        }
    }

    pub fn array(item: SchemaElement) -> Self {
        SchemaElement::Array { definition: Box::new(item), optional: false }
    }

    pub fn record(value: SchemaElement) -> Self {
        SchemaElement::Record { definition: Box::new(value), optional: false }
    }

    pub fn union(branches: impl IntoIterator<Item = SchemaElement>) -> Self {
        SchemaElement::Union {
            definition: branches.into_iter().collect(),
            optional: false,
        }
    }

    pub fn function(args: impl IntoIterator<Item = SchemaElement>, returns: Option<SchemaElement>) -> Self {
        SchemaElement::Function {
            args: args.into_iter().collect(),
            returns: returns.map(Box::new),
            optional: false,
        }
    }

    pub fn lazy(function: SchemaElement) -> Self {
        SchemaElement::Lazy { definition: Box::new(function), optional: false }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        SchemaElement::SchemaReference { definition: name.into(), optional: false }
    }

    /// Mark this element as accepting an absent value
    pub fn optional(mut self) -> Self {
        *self.optional_mut() = true;
        self
    }

    // ========== Accessors ==========

    /// The wire name of this element's variant (the `type` tag)
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaElement::Literal { .. } => "literal",
            SchemaElement::SimpleType { .. } => "simpleType",
            SchemaElement::Enum { .. } => "enum",
            SchemaElement::Object { .. } => "object",
            SchemaElement::Array { .. } => "array",
            SchemaElement::Record { .. } => "record",
            SchemaElement::Union { .. } => "union",
            SchemaElement::Function { .. } => "function",
            SchemaElement::Lazy { .. } => "lazy",
            SchemaElement::SchemaReference { .. } => "schemaReference",
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            SchemaElement::Literal { optional, .. }
            | SchemaElement::SimpleType { optional, .. }
            | SchemaElement::Enum { optional, .. }
            | SchemaElement::Object { optional, .. }
            | SchemaElement::Array { optional, .. }
            | SchemaElement::Record { optional, .. }
            | SchemaElement::Union { optional, .. }
            | SchemaElement::Function { optional, .. }
            | SchemaElement::Lazy { optional, .. }
            | SchemaElement::SchemaReference { optional, .. } => *optional,
        }
    }

    fn optional_mut(&mut self) -> &mut bool {
        match self {
            SchemaElement::Literal { optional, .. }
            | SchemaElement::SimpleType { optional, .. }
            | SchemaElement::Enum { optional, .. }
            | SchemaElement::Object { optional, .. }
            | SchemaElement::Array { optional, .. }
            | SchemaElement::Record { optional, .. }
            | SchemaElement::Union { optional, .. }
            | SchemaElement::Function { optional, .. }
            | SchemaElement::Lazy { optional, .. }
            | SchemaElement::SchemaReference { optional, .. } => optional,
        }
    }

    /// Parse one element from JSON, reporting the path of any malformed node
    pub fn from_json(name: &str, value: &serde_json::Value) -> Result<Self> {
        serde_path_to_error::deserialize::<_, Self>(value).map_err(|err| SchemaError::MalformedElement {
            name: name.to_string(),
            path: err.path().to_string(),
            message: err.into_inner().to_string(),
        })
    }
}

/// A closed namespace of named elements.
///
/// Every `schemaReference` inside the set should name another entry of the
/// same set. Missing targets are not rejected here; they surface when a
/// compiled validator first needs them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSet {
    elements: BTreeMap<String, SchemaElement>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion
    pub fn with(mut self, name: impl Into<String>, element: SchemaElement) -> Self {
        self.insert(name, element);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, element: SchemaElement) -> Option<SchemaElement> {
        self.elements.insert(name.into(), element)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaElement> {
        self.elements.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.elements.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemaElement)> {
        self.elements.iter()
    }

    /// Parse a schema set from a JSON object of name → element.
    ///
    /// Fails on the first malformed entry, naming it.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let entries = value.as_object().ok_or_else(|| SchemaError::NotAnObject {
            context: "schema set".to_string(),
        })?;

        let mut set = SchemaSet::new();
        for (name, raw) in entries {
            set.insert(name.clone(), SchemaElement::from_json(name, raw)?);
        }
        Ok(set)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl FromStr for SchemaSet {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }
}

impl FromIterator<(String, SchemaElement)> for SchemaSet {
    fn from_iter<T: IntoIterator<Item = (String, SchemaElement)>>(iter: T) -> Self {
        Self { elements: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a SchemaSet {
    type Item = (&'a String, &'a SchemaElement);
    type IntoIter = std::collections::btree_map::Iter<'a, String, SchemaElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
