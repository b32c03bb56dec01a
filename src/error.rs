//! Error types for schema compilation, resolution and export

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised by the compiler pipeline.
///
/// A value failing validation is not an error: it is reported through
/// [`crate::validator::Report`]. The variants below cover malformed input,
/// lookups that cannot be satisfied, and the surrounding I/O.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Malformed schema element '{name}' at {path}: {message}")]
    MalformedElement {
        name: String,
        path: String,
        message: String,
    },

    #[error("Expected a JSON object for {context}")]
    NotAnObject { context: String },

    #[error("Unresolved reference '{reference}' in '{from}'; known schemas: [{}]", known.join(", "))]
    UnresolvedReference {
        reference: String,
        from: String,
        known: Vec<String>,
    },

    #[error("Reference '{reference}' used while its compiled set is unavailable (under construction or dropped)")]
    RegistryUnavailable { reference: String },

    #[error("Schema not found: {name}")]
    UnknownEntry { name: String },

    #[error("JSON Schema engine rejected document: {0}")]
    JsonSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
