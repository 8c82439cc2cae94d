//! Runs one patch phase from a TOML run configuration and prints the
//! patched documents as XML.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use modcheck::{PatchPhase, RunConfig, TracingSink};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modcheck")]
#[command(about = "Apply ModCheck patch operations to JsonML documents", long_about = None)]
struct Cli {
    /// Run configuration (TOML)
    config: PathBuf,

    /// Emit verbose log messages and debug output
    #[arg(short, long)]
    verbose: bool,

    /// Print the per-operation timing report
    #[arg(short, long)]
    profile: bool,

    /// Write each patched document to this directory instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = RunConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.settings.verbose |= cli.verbose;
    config.settings.profile |= cli.profile;

    let mut packages = config.load_packages()?;
    let mut documents = config.load_documents()?;
    tracing::info!(
        packages = packages.len(),
        documents = documents.len(),
        mods = config.mods.len(),
        "starting patch phase"
    );

    let mut sink = TracingSink;
    let summary = PatchPhase::new(config.settings, &config.mods, &mut sink).run(&mut packages, &mut documents);
    tracing::info!(
        applied = summary.applied,
        failed = summary.failed,
        instrumented = summary.instrumented,
        "patch phase finished"
    );

    match &cli.output {
        Some(dir) => {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            for source in &documents {
                let path = dir.join(&source.name);
                fs::write(&path, source.document.to_xml())
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }
        None => {
            for source in &documents {
                println!("<!-- {} -->", source.name);
                println!("{}", source.document.to_xml());
            }
        }
    }
    Ok(())
}
