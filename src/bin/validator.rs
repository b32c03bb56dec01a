//! IR Validator CLI
//!
//! Checks IR documents against the bootstrap schema set, and values against
//! a named element of a compiled schema set.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use schema_ir::{bootstrap, compile_json, IrConfig, Report, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ir-validator")]
#[command(about = "Validate IR documents and the values they describe")]
struct Cli {
    /// Configuration file (defaults to schema-ir.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a schema set document against the IR grammar
    Set {
        /// Schema set (JSON object of name → element)
        file: PathBuf,
    },

    /// Compile a schema set and check a JSON value against one of its entries
    Value {
        /// Schema set (JSON object of name → element)
        set: PathBuf,
        /// Entry to validate against
        name: String,
        /// JSON value to validate
        value: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_report(subject: &str, report: &Report) {
    if report.is_valid() {
        println!("✅ {} - valid", subject);
    } else {
        println!("❌ {} - {} issue(s)", subject, report.issues().len());
        for issue in report.issues() {
            println!("   {}", issue);
        }
    }
}

/// Returns whether everything checked was valid
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = IrConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Set { file } => {
            let document = read_json(&file)?;
            let report = bootstrap::validate_set(&document)?;
            print_report(&file.display().to_string(), &report);
            Ok(report.is_valid())
        }

        Commands::Value { set, name, value } => {
            let compiled = compile_json(&read_json(&set)?, &config.compiler)?;
            let instance = Value::from(read_json(&value)?);
            let report = compiled.validator(&name)?.validate(&instance)?;
            print_report(&format!("{} against {}", value.display(), name), &report);
            Ok(report.is_valid())
        }
    }
}
