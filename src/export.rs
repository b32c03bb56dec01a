//! JSON Schema Exporter
//!
//! Renders compiled validators as draft-07 JSON Schema documents. Each
//! document embeds, under its definitions key, only the entries its own
//! element can reach through references, plus itself.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value as Json};
use tracing::{debug, info};

use crate::config::{ExportConfig, JSON_SCHEMA_DRAFT_07};
use crate::dependencies::{dependency_map, DependencyMap};
use crate::element::SchemaSet;
use crate::error::{Result, SchemaError};
use crate::registry::CompiledSet;
use crate::validator::Validator;

/// Name → exported JSON Schema document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportedSet {
    documents: BTreeMap<String, Json>,
}

impl ExportedSet {
    pub fn get(&self, name: &str) -> Option<&Json> {
        self.documents.get(name)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Json)> {
        self.documents.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Json> {
        self.documents
    }

    /// All documents as one JSON object keyed by name
    pub fn to_json(&self) -> Json {
        Json::Object(self.documents.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Names embedded in the definitions of `name`'s document
    pub fn definition_names(&self, name: &str, config: &ExportConfig) -> BTreeSet<String> {
        self.documents
            .get(name)
            .and_then(|doc| doc.get(&config.definitions_key))
            .and_then(Json::as_object)
            .map(|defs| defs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Check a JSON instance against `name`'s document with an independent
    /// JSON Schema engine
    pub fn check_instance(&self, name: &str, instance: &Json) -> Result<bool> {
        let document = self
            .documents
            .get(name)
            .ok_or_else(|| SchemaError::UnknownEntry { name: name.to_string() })?;
        let schema = jsonschema::JSONSchema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .compile(document)
            .map_err(|e| SchemaError::JsonSchema(e.to_string()))?;
        Ok(schema.is_valid(instance))
    }
}

/// Analyze `set`'s dependencies, then export `compiled`
pub fn export_json_schema(compiled: &CompiledSet, set: &SchemaSet, config: &ExportConfig) -> ExportedSet {
    export(compiled, &dependency_map(set), config)
}

/// Export every entry of `compiled`, scoping definitions with `dependencies`
pub fn export(compiled: &CompiledSet, dependencies: &DependencyMap, config: &ExportConfig) -> ExportedSet {
    let mut documents = BTreeMap::new();

    for (name, entry) in compiled.iter() {
        let mut local: BTreeSet<&str> = dependencies
            .get(name)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default();
        local.insert(name.as_str());

        let mut definitions = Map::new();
        for dep in local {
            match compiled.get(dep) {
                Some(target) => {
                    definitions.insert(dep.to_string(), render(target.validator(), config));
                }
                None => debug!(name = %name, missing = dep, "dependency not compiled, skipping definition"),
            }
        }

        let mut document = render_node(entry.validator(), config);
        document.insert(config.definitions_key.clone(), Json::Object(definitions));
        if config.include_schema_uri {
            document.insert("$schema".to_string(), Json::from(JSON_SCHEMA_DRAFT_07));
        }
        documents.insert(name.clone(), Json::Object(document));
    }

    info!(documents = documents.len(), "exported JSON Schema documents");
    ExportedSet { documents }
}

/// Render one validator as a JSON Schema node
pub fn render(validator: &Validator, config: &ExportConfig) -> Json {
    Json::Object(render_node(validator, config))
}

fn node<const N: usize>(entries: [(&str, Json); N]) -> Map<String, Json> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn render_node(validator: &Validator, config: &ExportConfig) -> Map<String, Json> {
    match validator {
        Validator::Any => Map::new(),
        Validator::Literal(s) => node([("type", json!("string")), ("const", json!(s))]),
        Validator::Boolean => node([("type", json!("boolean"))]),
        Validator::String => node([("type", json!("string"))]),
        Validator::Number => node([("type", json!("number"))]),
        Validator::Enum(values) => node([("type", json!("string")), ("enum", json!(values))]),
        Validator::Object { fields, closed } => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for (name, field) in fields {
                properties.insert(name.clone(), render(field, config));
                if !field.may_be_absent() {
                    required.push(Json::from(name.as_str()));
                }
            }
            let mut object = node([("type", json!("object")), ("properties", Json::Object(properties))]);
            if !required.is_empty() {
                object.insert("required".to_string(), Json::Array(required));
            }
            if *closed {
                object.insert("additionalProperties".to_string(), Json::Bool(false));
            }
            object
        }
        Validator::Array(item) => node([("type", json!("array")), ("items", render(item, config))]),
        Validator::Record(value) => node([
            ("type", json!("object")),
            ("additionalProperties", render(value, config)),
        ]),
        Validator::Union(branches) => node([(
            "anyOf",
            Json::Array(branches.iter().map(|b| render(b, config)).collect()),
        )]),
        // Callables have no JSON Schema counterpart
        Validator::Function { .. } => Map::new(),
        Validator::Lazy(lazy) => render_node(lazy.force(), config),
        Validator::Reference(reference) => node([(
            "$ref",
            Json::from(format!(
                "#/{}/{}",
                escape_pointer(&config.definitions_key),
                escape_pointer(reference.target())
            )),
        )]),
        Validator::Optional(inner) => render_node(inner, config),
    }
}

/// Escape a JSON Pointer reference token (RFC 6901)
fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_set;
    use crate::config::CompilerConfig;
    use crate::element::SchemaElement;

    fn scoped_set() -> SchemaSet {
        SchemaSet::new()
            .with("A", SchemaElement::object([("f", SchemaElement::reference("B"))]))
            .with("B", SchemaElement::string())
            .with("C", SchemaElement::number())
    }

    #[test]
    fn test_definitions_are_scoped() {
        let set = scoped_set();
        let compiled = compile_set(&set, &CompilerConfig::default());
        let config = ExportConfig::default();
        let exported = export_json_schema(&compiled, &set, &config);

        assert_eq!(exported.len(), 3);
        let names = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
        assert_eq!(exported.definition_names("A", &config), names(&["A", "B"]));
        assert_eq!(exported.definition_names("C", &config), names(&["C"]));
    }

    #[test]
    fn test_document_shape() {
        let set = scoped_set();
        let compiled = compile_set(&set, &CompilerConfig::default());
        let exported = export_json_schema(&compiled, &set, &ExportConfig::default());
        assert_eq!(
            exported.get("A").unwrap(),
            &json!({
                "type": "object",
                "properties": { "f": { "$ref": "#/definitions/B" } },
                "required": ["f"],
                "definitions": {
                    "A": {
                        "type": "object",
                        "properties": { "f": { "$ref": "#/definitions/B" } },
                        "required": ["f"]
                    },
                    "B": { "type": "string" }
                },
                "$schema": JSON_SCHEMA_DRAFT_07
            })
        );
    }

    #[test]
    fn test_optional_attributes_not_required() {
        let set = SchemaSet::new()
            .with("Opt", SchemaElement::string().optional())
            .with(
                "Holder",
                SchemaElement::object([
                    ("direct", SchemaElement::boolean().optional()),
                    ("viaRef", SchemaElement::reference("Opt")),
                    ("needed", SchemaElement::number()),
                ]),
            );
        let compiled = compile_set(&set, &CompilerConfig::default());
        let exported = export_json_schema(&compiled, &set, &ExportConfig::default());
        assert_eq!(exported.get("Holder").unwrap()["required"], json!(["needed"]));
    }

    #[test]
    fn test_custom_definitions_key_and_no_schema_uri() {
        let set = scoped_set();
        let compiled = compile_set(&set, &CompilerConfig::default());
        let config = ExportConfig {
            definitions_key: "$defs".to_string(),
            include_schema_uri: false,
            ..ExportConfig::default()
        };
        let exported = export_json_schema(&compiled, &set, &config);
        let doc = exported.get("A").unwrap();
        assert!(doc.get("$schema").is_none());
        assert_eq!(doc["properties"]["f"]["$ref"], json!("#/$defs/B"));
        assert!(doc["$defs"]["B"].is_object());
    }

    #[test]
    fn test_render_variants() {
        let config = ExportConfig::default();
        assert_eq!(render(&Validator::Any, &config), json!({}));
        assert_eq!(render(&Validator::literal("x"), &config), json!({ "type": "string", "const": "x" }));
        assert_eq!(
            render(&Validator::record(Validator::Number), &config),
            json!({ "type": "object", "additionalProperties": { "type": "number" } })
        );
        assert_eq!(
            render(&Validator::union([Validator::String, Validator::Boolean]), &config),
            json!({ "anyOf": [{ "type": "string" }, { "type": "boolean" }] })
        );
        assert_eq!(
            render(&Validator::object([("a", Validator::String)]).closed(), &config)["additionalProperties"],
            json!(false)
        );
        assert_eq!(render(&Validator::function([], None), &config), json!({}));
    }

    #[test]
    fn test_pure_reference_cycle_exports() {
        let set = SchemaSet::new()
            .with("A", SchemaElement::object([("f", SchemaElement::reference("B"))]))
            .with("B", SchemaElement::reference("C"))
            .with("C", SchemaElement::reference("B"));
        let compiled = compile_set(&set, &CompilerConfig::default());
        let config = ExportConfig::default();
        let exported = export_json_schema(&compiled, &set, &config);

        let doc = exported.get("A").unwrap();
        assert_eq!(doc["required"], json!(["f"]));
        assert_eq!(doc["properties"]["f"], json!({ "$ref": "#/definitions/B" }));
        assert_eq!(doc["definitions"]["C"], json!({ "$ref": "#/definitions/B" }));
    }

    #[test]
    fn test_cycle_through_optional_reference_not_required() {
        let set = SchemaSet::new()
            .with("Holder", SchemaElement::object([("f", SchemaElement::reference("B"))]))
            .with("B", SchemaElement::reference("C"))
            .with("C", SchemaElement::union([SchemaElement::reference("B"), SchemaElement::string().optional()]));
        let compiled = compile_set(&set, &CompilerConfig::default());
        let exported = export_json_schema(&compiled, &set, &ExportConfig::default());
        assert!(exported.get("Holder").unwrap().get("required").is_none());
    }

    #[test]
    fn test_export_builds_lazy_children() {
        let set = SchemaSet::new().with("F", SchemaElement::lazy(SchemaElement::function([], None)));
        let compiled = compile_set(&set, &CompilerConfig::default());
        let Validator::Lazy(lazy) = compiled.validator("F").unwrap() else {
            panic!("Expected a lazy validator");
        };
        assert!(!lazy.is_forced());
        let exported = export_json_schema(&compiled, &set, &ExportConfig::default());
        assert!(lazy.is_forced());
        assert_eq!(exported.get("F").unwrap()["definitions"]["F"], json!({}));
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape_pointer("a/b~c"), "a~1b~0c");
    }

    #[test]
    fn test_check_instance_with_engine() {
        let set = scoped_set();
        let compiled = compile_set(&set, &CompilerConfig::default());
        let exported = export_json_schema(&compiled, &set, &ExportConfig::default());
        assert!(exported.check_instance("A", &json!({ "f": "x" })).unwrap());
        assert!(!exported.check_instance("A", &json!({ "f": 1 })).unwrap());
        assert!(!exported.check_instance("A", &json!({})).unwrap());
        assert!(matches!(
            exported.check_instance("Z", &json!(null)),
            Err(SchemaError::UnknownEntry { .. })
        ));
    }
}
