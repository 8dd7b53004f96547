// src/cli.rs
//! CLI definitions for debforge
//!
//! Argument parsing only; the command implementations live in the
//! `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "debforge")]
#[command(author, version, about = "Rebuild changed source packages into .deb artifacts and refresh the APT index", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: ~/.config/debforge/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Source code root, one directory per package (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Output directory for .deb files and the index (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build stale packages and refresh the repository index
    Build {
        /// Forcibly build all packages (overrides the file-update check)
        #[arg(short, long)]
        all: bool,

        /// Package name to build (built even if its artifact is current)
        #[arg(short, long, value_name = "NAME")]
        package: Option<String>,
    },

    /// Show which packages would be rebuilt, without building anything
    Status,
}
