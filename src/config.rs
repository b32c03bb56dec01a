//! Configuration for compilation and export
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-ir.toml)
//! - Environment variables (SCHEMA_IR__*)
//!
//! ## Example config file (schema-ir.toml):
//! ```toml
//! [compiler]
//! unknown_attributes = "reject"
//!
//! [export]
//! definitions_key = "$defs"
//! include_schema_uri = true
//! output_format = "compact"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Draft-07 meta-schema URI written into exported documents
pub const JSON_SCHEMA_DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrConfig {
    /// Validator compilation settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// JSON Schema export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// What object validators do with attributes they do not list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownAttributes {
    /// Accept and ignore them
    #[default]
    Ignore,
    /// Fail validation on them
    Reject,
}

/// Compiler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub unknown_attributes: UnknownAttributes,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Key under which definitions are embedded (`definitions` or `$defs`)
    #[serde(default = "default_definitions_key")]
    pub definitions_key: String,

    /// Write `$schema` at the top of each document
    #[serde(default = "default_true")]
    pub include_schema_uri: bool,

    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn render(&self, value: &serde_json::Value) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

fn default_definitions_key() -> String {
    "definitions".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            definitions_key: default_definitions_key(),
            include_schema_uri: true,
            output_format: OutputFormat::Pretty,
        }
    }
}

impl IrConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file when `config_path` is set
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["schema-ir.toml", ".schema-ir.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "schema-ir", "schema-ir") {
            let xdg_config = dirs.config_dir().join("schema-ir.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_IR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = IrConfig::default();
        assert_eq!(config.compiler.unknown_attributes, UnknownAttributes::Ignore);
        assert_eq!(config.export.definitions_key, "definitions");
        assert!(config.export.include_schema_uri);
    }

    #[test]
    fn test_serialize_config() {
        let config = IrConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[compiler]"));
        assert!(toml_str.contains("[export]"));
        assert!(toml_str.contains("unknown_attributes = \"ignore\""));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[compiler]\nunknown_attributes = \"reject\"\n\n[export]\ndefinitions_key = \"$defs\"\n",
        )
        .unwrap();

        let config = IrConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.compiler.unknown_attributes, UnknownAttributes::Reject);
        assert_eq!(config.export.definitions_key, "$defs");
        // Unset keys keep their defaults
        assert_eq!(config.export.output_format, OutputFormat::Pretty);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = IrConfig::default();
        config.export.output_format = OutputFormat::Compact;
        config.save(&path).unwrap();

        let reloaded = IrConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(reloaded.export.output_format, OutputFormat::Compact);
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = IrConfig::load_from(Some(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, SchemaError::Config(_)));
    }

    #[test]
    fn test_save_into_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("saved.toml");
        let err = IrConfig::default().save(&path).unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }
}
