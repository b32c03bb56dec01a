//! Validator Compiler
//!
//! Turns IR elements into [`Validator`]s. `schemaReference` compiles to a
//! deferred node resolved by name when a value is checked, so compiling never
//! follows a reference and cyclic sets compile in one pass.

use tracing::{debug, info};

use crate::config::{CompilerConfig, UnknownAttributes};
use crate::element::{SchemaElement, SchemaSet, SimpleKind};
use crate::error::Result;
use crate::registry::{CompiledEntry, CompiledSet, RegistryHandle};
use crate::validator::Validator;

/// Compile every element of `set` into one compiled set.
///
/// Entries may reference each other in any order; references resolve
/// against the finished set.
pub fn compile_set(set: &SchemaSet, config: &CompilerConfig) -> CompiledSet {
    let compiled = CompiledSet::build(|registry| {
        set.iter()
            .map(|(name, element)| {
                let entry = compile_element(name, element, registry, config);
                (name.clone(), entry)
            })
            .collect()
    });
    info!(entries = compiled.len(), "compiled schema set");
    compiled
}

/// Parse a JSON schema set and compile it.
///
/// A malformed element aborts the whole call; no partial set is returned.
pub fn compile_json(value: &serde_json::Value, config: &CompilerConfig) -> Result<CompiledSet> {
    let set = SchemaSet::from_json(value)?;
    Ok(compile_set(&set, config))
}

/// Compile one named element against a registry
pub fn compile_element(
    name: &str,
    element: &SchemaElement,
    registry: &RegistryHandle,
    config: &CompilerConfig,
) -> CompiledEntry {
    debug!(name, kind = element.kind(), "compiling element");
    CompiledEntry::new(name, compile_validator(name, element, registry, config))
}

fn compile_validator(
    name: &str,
    element: &SchemaElement,
    registry: &RegistryHandle,
    config: &CompilerConfig,
) -> Validator {
    let recurse = |child: &SchemaElement| compile_validator(name, child, registry, config);

    let base = match element {
        SchemaElement::Literal { definition, .. } => Validator::literal(definition.as_str()),
        SchemaElement::SimpleType { definition, .. } => match definition {
            SimpleKind::Any => Validator::Any,
            SimpleKind::Boolean => Validator::Boolean,
            SimpleKind::String => Validator::String,
            SimpleKind::Number => Validator::Number,
        },
        SchemaElement::Enum { definition, .. } => {
            if definition.len() > 1 {
                Validator::enumeration(definition.iter().cloned())
            } else {
                Validator::Any
            }
        }
        SchemaElement::Object { definition, .. } => {
            let object = Validator::object(definition.iter().map(|(attr, child)| (attr.clone(), recurse(child))));
            match config.unknown_attributes {
                UnknownAttributes::Ignore => object,
                UnknownAttributes::Reject => object.closed(),
            }
        }
        SchemaElement::Array { definition, .. } => Validator::array(recurse(definition)),
        SchemaElement::Record { definition, .. } => Validator::record(recurse(definition)),
        SchemaElement::Union { definition, .. } => Validator::union(definition.iter().map(recurse)),
        SchemaElement::Function { args, returns, .. } => {
            Validator::function(args.iter().map(recurse), returns.as_deref().map(recurse))
        }
        SchemaElement::Lazy { definition, .. } => {
            let description = describe_element(definition, config);
            let name = name.to_string();
            let child = definition.as_ref().clone();
            let registry = registry.clone();
            let config = config.clone();
            Validator::lazy_described(description, move || compile_validator(&name, &child, &registry, &config))
        }
        SchemaElement::SchemaReference { definition, .. } => {
            Validator::reference(definition.as_str(), name, registry.clone())
        }
    };

    if element.is_optional() {
        base.optional()
    } else {
        base
    }
}

/// The description `element` will have once compiled, without compiling it
fn describe_element(element: &SchemaElement, config: &CompilerConfig) -> String {
    let join = |children: &[SchemaElement], sep: &str| {
        children
            .iter()
            .map(|child| describe_element(child, config))
            .collect::<Vec<_>>()
            .join(sep)
    };

    let base = match element {
        SchemaElement::Literal { definition, .. } => format!("literal({:?})", definition),
        SchemaElement::SimpleType { definition, .. } => definition.as_str().to_string(),
        SchemaElement::Enum { definition, .. } if definition.len() > 1 => format!("enum{:?}", definition),
        SchemaElement::Enum { .. } => "any".to_string(),
        SchemaElement::Object { definition, .. } => {
            let open = match config.unknown_attributes {
                UnknownAttributes::Ignore => "object{",
                UnknownAttributes::Reject => "strictObject{",
            };
            let fields = definition
                .iter()
                .map(|(attr, child)| format!("{}: {}", attr, describe_element(child, config)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}{}}}", open, fields)
        }
        SchemaElement::Array { definition, .. } => format!("array<{}>", describe_element(definition, config)),
        SchemaElement::Record { definition, .. } => {
            format!("record<string, {}>", describe_element(definition, config))
        }
        SchemaElement::Union { definition, .. } => format!("union[{}]", join(definition.as_slice(), " | ")),
        SchemaElement::Function { args, returns, .. } => {
            let mut out = format!("function({})", join(args.as_slice(), ", "));
            if let Some(returns) = returns {
                out.push_str(" -> ");
                out.push_str(&describe_element(returns, config));
            }
            out
        }
        SchemaElement::Lazy { definition, .. } => format!("lazy(() => {})", describe_element(definition, config)),
        SchemaElement::SchemaReference { definition, .. } => format!("ref({})", definition),
    };

    if element.is_optional() {
        base + "?"
    } else {
        base
    }
}
