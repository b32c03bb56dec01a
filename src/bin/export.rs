//! IR Export CLI
//!
//! Exports a schema set as JSON Schema documents, one per entry, or prints
//! the description of every compiled entry.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use schema_ir::{compile_set, describe, export_json_schema, IrConfig, SchemaSet};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ir-export")]
#[command(about = "Export IR schema sets as JSON Schema")]
struct Cli {
    /// Configuration file (defaults to schema-ir.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one JSON Schema document per entry
    JsonSchema {
        /// Schema set (JSON object of name → element)
        set: PathBuf,
        /// Output directory; prints all documents to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the description of every entry
    Describe {
        /// Schema set (JSON object of name → element)
        set: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_set(path: &Path) -> anyhow::Result<SchemaSet> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    text.parse::<SchemaSet>()
        .with_context(|| format!("loading schema set {}", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = IrConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::JsonSchema { set, out } => {
            let schema_set = load_set(&set)?;
            let compiled = compile_set(&schema_set, &config.compiler);
            let exported = export_json_schema(&compiled, &schema_set, &config.export);
            let format = config.export.output_format;

            match out {
                Some(dir) => {
                    fs::create_dir_all(&dir)?;
                    for (name, document) in exported.iter() {
                        let path = dir.join(format!("{}.schema.json", name));
                        fs::write(&path, format.render(document)?)
                            .with_context(|| format!("writing {}", path.display()))?;
                        info!(path = %path.display(), "wrote JSON Schema");
                    }
                    println!("✅ Exported {} schema(s) to {}", exported.len(), dir.display());
                }
                None => println!("{}", format.render(&exported.to_json())?),
            }
            Ok(())
        }

        Commands::Describe { set } => {
            let compiled = compile_set(&load_set(&set)?, &config.compiler);
            for (name, description) in describe(&compiled) {
                println!("{}: {}", name, description);
            }
            Ok(())
        }
    }
}
