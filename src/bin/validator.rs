//! Schema Validator CLI
//!
//! Validates JSON instance files against a draft-04 schema and inspects the
//! schema graph.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemagraph::{EnumEquality, SchemaGraph, SchemaGraphConfig};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "schema-validator")]
#[command(about = "Validate JSON documents against a JSON Schema and inspect its graph")]
struct Cli {
    /// Explicit configuration file, layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate instance files (directories are walked for *.json)
    Check {
        /// Schema document
        #[arg(short, long)]
        schema: PathBuf,

        /// Booleans never equal numbers in `enum`
        #[arg(long)]
        strict_enum: bool,

        /// Instance files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Summarize the schema graph
    Inspect {
        /// Schema document
        #[arg(short, long)]
        schema: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export the schema graph to GraphViz DOT
    Dot {
        /// Schema document
        #[arg(short, long)]
        schema: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// Write it to this file instead
        #[arg(long)]
        save: Option<PathBuf>,
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

/// Returns false when some instance failed validation
fn run(cli: Cli) -> Result<bool> {
    let config_path = cli.config.as_deref().map(path_str).transpose()?;
    let mut config = SchemaGraphConfig::load_from(config_path).context("loading configuration")?;

    match cli.command {
        Commands::Check { schema, strict_enum, paths } => {
            if strict_enum {
                config.validation.enum_equality = EnumEquality::Strict;
            }
            let graph = load_graph(&schema, &config)?;
            for item in graph.diagnostics().errors() {
                eprintln!("⚠️  {}", item);
            }

            let mut failures = 0;
            let mut checked = 0;
            for file in instance_files(&paths) {
                checked += 1;
                match check_file(&graph, &file) {
                    Ok(()) => println!("✅ {}", file.display()),
                    Err(e) => {
                        failures += 1;
                        println!("❌ {}", file.display());
                        println!("   └─ {:#}", e);
                    }
                }
            }

            println!();
            if failures > 0 {
                println!("❌ {} of {} files failed validation", failures, checked);
            } else {
                println!("✅ All {} files are valid", checked);
            }
            Ok(failures == 0)
        }

        Commands::Inspect { schema, json } => {
            let graph = load_graph(&schema, &config)?;
            let cycles = graph.cycles();

            if json {
                let report = json!({
                    "nodes": graph.len(),
                    "edges": graph.edge_count(),
                    "root": graph.root(),
                    "definitions": graph.definitions(),
                    "cycles": cycles,
                    "diagnostics": graph.diagnostics().all(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(true);
            }

            println!("📊 {}", schema.display());
            println!("   {} nodes, {} edges", graph.len(), graph.edge_count());
            println!();
            println!("Definitions ({}):", graph.definitions().len());
            for (name, id) in graph.definitions() {
                let kinds: Vec<&str> = graph.node(*id).kinds().iter().map(|k| k.name()).collect();
                println!("  {} {} [{}]", id, name, kinds.join(", "));
            }
            println!();
            println!("Cycles ({}):", cycles.len());
            for cycle in &cycles {
                let names = cycle.names(&graph);
                let label = if names.is_empty() { "anonymous".to_string() } else { names.join(" <-> ") };
                println!("  🔄 {} ({} nodes)", label, cycle.members.len());
            }
            if !graph.diagnostics().is_empty() {
                println!();
                print!("{}", graph.diagnostics());
            }
            Ok(true)
        }

        Commands::Dot { schema, output } => {
            let graph = load_graph(&schema, &config)?;
            let dot = graph.to_dot();
            match output {
                Some(path) => {
                    std::fs::write(&path, &dot).with_context(|| format!("writing {}", path.display()))?;
                    println!("✅ Exported DOT to: {}", path.display());
                }
                None => print!("{}", dot),
            }
            Ok(true)
        }

        Commands::Config { save } => {
            match save {
                Some(path) => {
                    config
                        .save(path_str(&path)?)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("✅ Saved configuration to: {}", path.display());
                }
                None => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(true)
        }
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("path {} is not valid UTF-8", path.display()))
}

fn load_graph(schema: &Path, config: &SchemaGraphConfig) -> Result<SchemaGraph> {
    SchemaGraph::from_file(schema, config).with_context(|| format!("building graph for {}", schema.display()))
}

fn instance_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        files.extend(found);
    }
    files
}

fn check_file(graph: &SchemaGraph, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content).context("parsing JSON")?;
    graph.validate(&value)?;
    Ok(())
}
