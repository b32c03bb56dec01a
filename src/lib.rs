//! Schema IR Compiler
//!
//! Compiles a JSON-serializable schema description language (the IR) into
//! runtime validators and draft-07 JSON Schema documents.
//!
//! ## Features
//!
//! - **Recursive Schemas**: `schemaReference` resolves by name when a value is
//!   checked, so forward, self and mutual references compile in one pass
//! - **Self-Describing**: the IR grammar is itself an IR schema set, used to
//!   check documents before compiling them
//! - **Scoped Export**: each exported JSON Schema document embeds only the
//!   definitions its element can reach
//!
//! ## Pipeline
//!
//! ```text
//! SchemaSet ──compile_set──▶ CompiledSet ──validate──▶ Report
//!     │                          │
//!     └──dependency_map──▶ DependencyMap
//!                                │
//!                         export ▼
//!                          ExportedSet (name → JSON Schema)
//! ```

pub mod bootstrap;
pub mod compiler;
pub mod config;
pub mod dependencies;
pub mod describe;
pub mod element;
pub mod error;
pub mod export;
pub mod registry;
pub mod validator;
pub mod value;

pub use compiler::{compile_element, compile_json, compile_set};
pub use config::{CompilerConfig, ExportConfig, IrConfig};
pub use dependencies::{dependency_map, DependencyGraph, DependencyMap};
pub use describe::{describe, diff_descriptions, DescriptionDiff};
pub use element::{SchemaElement, SchemaSet, SimpleKind};
pub use error::{Result, SchemaError};
pub use export::{export, export_json_schema, ExportedSet};
pub use registry::{CompiledEntry, CompiledSet, RegistryHandle};
pub use validator::{Issue, Report, Validator};
pub use value::{Callable, Value};
