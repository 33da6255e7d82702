use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use restgen::{GenerateError, GeneratorConfig, generate_from_manifest};

/// Resolve an annotated class manifest into a REST client domain model.
#[derive(Debug, Parser)]
#[command(name = "restgen", version, about)]
struct Cli {
    /// Class manifest to resolve
    manifest: PathBuf,

    /// JSON generator configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Implicit nullability reporting: allow, warn or error
    #[arg(long, value_name = "LEVEL")]
    implicit_nullable: Option<String>,

    /// REST base path of the backend
    #[arg(long, value_name = "PATH")]
    base_path: Option<String>,

    /// Model date and time values as strings
    #[arg(long)]
    dates_as_string: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("restgen=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        match e.downcast_ref::<GenerateError>() {
            Some(GenerateError::Failed { .. }) => tracing::error!("{}", e),
            _ => eprintln!("Error: {:#}", e),
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            GeneratorConfig::from_json(&json)
                .with_context(|| format!("Invalid configuration {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };
    if let Some(level) = &cli.implicit_nullable {
        config = config.with_implicit_nullable(level)?;
    }
    if let Some(base_path) = cli.base_path {
        config.rest_base_path = base_path;
    }
    if cli.dates_as_string {
        config.dates_as_string = true;
    }

    let input = fs::read_to_string(&cli.manifest)
        .with_context(|| format!("Failed to read {}", cli.manifest.display()))?;
    let generation = generate_from_manifest(&input, &config)?;
    let json = serde_json::to_string_pretty(&generation.model)?;

    match &cli.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
