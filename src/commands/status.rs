// src/commands/status.rs

//! Status command - report per-package staleness without building

use std::path::Path;
use std::path::PathBuf;

use anyhow::{Context, Result};

use debforge::staleness::{package_states, PackageState};
use debforge::BuildConfig;

pub fn cmd_status(
    config_path: Option<&Path>,
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = BuildConfig::load(config_path, source_dir, output_dir)
        .context("Failed to load configuration")?;

    let states = package_states(&config).context("Failed to scan packages")?;
    if states.is_empty() {
        println!("No packages found in {}", config.source_dir.display());
        return Ok(());
    }

    for (package, state) in states {
        println!("{package:<32} {}", label(state));
    }
    Ok(())
}

fn label(state: PackageState) -> &'static str {
    match state {
        PackageState::Stale => "stale",
        PackageState::Current => "current",
        PackageState::NeverBuilt => "no artifact yet",
        PackageState::NoControlFile => "no control file",
    }
}
