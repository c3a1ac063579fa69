// ABOUTME: Entry point for the hoist CLI application.
// ABOUTME: Parses arguments, initializes tracing, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hoist::config::{self, CONFIG_FILENAME, Config};
use hoist::error::Result;
use hoist::progress::OutputMode;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --verbose wins; otherwise RUST_LOG, falling back to warnings only
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init {
            service,
            project,
            force,
        } => {
            config::init_config(&cwd, service.as_deref(), project.as_deref(), force)?;
            println!("Created {CONFIG_FILENAME}");
            Ok(())
        }
        Commands::Deploy {
            destination,
            quiet,
            json,
        } => {
            let config = load_config(&cwd, destination.as_deref())?;
            let mode = if json {
                OutputMode::Json
            } else if quiet {
                OutputMode::Quiet
            } else {
                OutputMode::Normal
            };
            commands::deploy(config, &cwd, mode).await
        }
        Commands::Manifests { destination, image } => {
            let config = load_config(&cwd, destination.as_deref())?;
            commands::manifests(&config, image.as_deref())
        }
    }
}

fn load_config(cwd: &std::path::Path, destination: Option<&str>) -> Result<Config> {
    let config = Config::discover(cwd)?;
    match destination {
        Some(dest) => config.for_destination(dest),
        None => Ok(config),
    }
}
