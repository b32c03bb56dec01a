//! Bootstrap Schema Set
//!
//! The IR grammar written in the IR itself. Compiling it yields validators
//! for IR documents, so a schema set can be checked before it is compiled,
//! and the bootstrap set accepts its own JSON form.

use std::sync::OnceLock;

use tracing::debug;

use crate::compiler::compile_set;
use crate::config::CompilerConfig;
use crate::element::{SchemaElement, SchemaSet};
use crate::error::Result;
use crate::registry::CompiledSet;
use crate::validator::Report;
use crate::value::Value;

/// Self-reference name that dependency analysis never reports
pub const RESERVED_BOOTSTRAP_NAME: &str = "SimpleBootstrapElementSchema";

/// Validates any single IR element
pub const ELEMENT_SCHEMA: &str = "ElementSchema";

/// Validates a whole schema set (name → element)
pub const ELEMENT_SET_SCHEMA: &str = "ElementSetSchema";

/// Variant schemas, in the order the element union tries them
const VARIANT_SCHEMAS: [&str; 10] = [
    "ArraySchema",
    "EnumSchema",
    "FunctionSchema",
    "LazySchema",
    "LiteralSchema",
    "ObjectSchema",
    "RecordSchema",
    "ReferenceSchema",
    "SimpleTypeSchema",
    "UnionSchema",
];

fn element_ref() -> SchemaElement {
    SchemaElement::reference(ELEMENT_SCHEMA)
}

/// `{ type: <tag>, optional?: boolean, ...payload }`
fn variant<I>(tag: &str, payload: I) -> SchemaElement
where
    I: IntoIterator<Item = (&'static str, SchemaElement)>,
{
    let mut attributes = vec![
        ("type", SchemaElement::literal(tag)),
        ("optional", SchemaElement::boolean().optional()),
    ];
    attributes.extend(payload);
    SchemaElement::object(attributes)
}

/// The IR grammar as a schema set
pub fn schema_set() -> SchemaSet {
    SchemaSet::new()
        .with("ArraySchema", variant("array", [("definition", element_ref())]))
        .with(
            "EnumSchema",
            variant("enum", [("definition", SchemaElement::array(SchemaElement::string()))]),
        )
        .with(
            "FunctionSchema",
            variant(
                "function",
                [
                    ("args", SchemaElement::array(element_ref()).optional()),
                    ("returns", element_ref().optional()),
                ],
            ),
        )
        .with(
            "LazySchema",
            variant("lazy", [("definition", SchemaElement::reference("FunctionSchema"))]),
        )
        .with("LiteralSchema", variant("literal", [("definition", SchemaElement::string())]))
        .with(
            "ObjectSchema",
            variant("object", [("definition", SchemaElement::record(element_ref()))]),
        )
        .with("RecordSchema", variant("record", [("definition", element_ref())]))
        .with(
            "ReferenceSchema",
            variant("schemaReference", [("definition", SchemaElement::string())]),
        )
        .with(
            ELEMENT_SCHEMA,
            SchemaElement::union(VARIANT_SCHEMAS.iter().map(|name| SchemaElement::reference(*name))),
        )
        .with(ELEMENT_SET_SCHEMA, SchemaElement::record(element_ref()))
        .with(
            "SimpleTypeSchema",
            variant(
                "simpleType",
                [("definition", SchemaElement::enumeration(["any", "boolean", "string", "number"]))],
            ),
        )
        .with(
            "UnionSchema",
            variant("union", [("definition", SchemaElement::array(element_ref()))]),
        )
}

/// The compiled bootstrap set, built on first use
pub fn compiled() -> &'static CompiledSet {
    static COMPILED: OnceLock<CompiledSet> = OnceLock::new();
    COMPILED.get_or_init(|| {
        debug!("compiling bootstrap schema set");
        compile_set(&schema_set(), &CompilerConfig::default())
    })
}

/// Check one IR element document
pub fn validate_element(document: &serde_json::Value) -> Result<Report> {
    compiled().validator(ELEMENT_SCHEMA)?.validate(&Value::from(document))
}

/// Check a schema set document (a JSON object of name → element)
pub fn validate_set(document: &serde_json::Value) -> Result<Report> {
    compiled().validator(ELEMENT_SET_SCHEMA)?.validate(&Value::from(document))
}
