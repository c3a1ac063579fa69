// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Build source remotely and deploy it to an existing GKE cluster")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new hoist.yml configuration file
    Init {
        /// Service name (DNS label)
        #[arg(short, long)]
        service: Option<String>,

        /// Cloud project id
        #[arg(short, long)]
        project: Option<String>,

        /// Overwrite an existing hoist.yml
        #[arg(long)]
        force: bool,
    },

    /// Package, build, and deploy the service
    Deploy {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,

        /// Only print errors and the final URL
        #[arg(short, long, conflicts_with = "json")]
        quiet: bool,

        /// Print progress as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the Deployment and Service descriptors without deploying
    Manifests {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,

        /// Image to reference instead of the derived registry image
        #[arg(long)]
        image: Option<String>,
    },
}
