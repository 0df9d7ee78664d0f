//! Orbit CLI - static site builder for component projects.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Static site builder for Orbit component projects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to orbit.toml config file
    #[arg(short, long, default_value = "orbit.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static site
    Build {
        /// Project root (defaults to config or ".")
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Production site URL used for canonical URLs and the sitemap
        #[arg(long)]
        site: Option<String>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Build {
            root,
            site,
            no_minify,
        } => {
            let overrides = commands::build::Overrides {
                root,
                site,
                minify: if no_minify { Some(false) } else { None },
            };
            commands::build::run(&cli.config, overrides).await?;
        }
    }

    Ok(())
}
