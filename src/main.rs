// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { all, package } => commands::cmd_build(
            cli.config.as_deref(),
            cli.source_dir,
            cli.output_dir,
            all,
            package,
        ),
        Commands::Status => {
            commands::cmd_status(cli.config.as_deref(), cli.source_dir, cli.output_dir)
        }
    }
}
