// src/commands/build.rs

//! Build command - run one orchestration pass

use std::path::Path;
use std::path::PathBuf;

use anyhow::{Context, Result};

use debforge::orchestrator;
use debforge::{BuildConfig, RunSelection};

/// Run a build pass over the configured source root.
///
/// Default selection is staleness-filtered; `--all` forces every
/// package and `--package` forces exactly one. If both are given, all
/// wins.
pub fn cmd_build(
    config_path: Option<&Path>,
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    all: bool,
    package: Option<String>,
) -> Result<()> {
    let config = BuildConfig::load(config_path, source_dir, output_dir)
        .context("Failed to load configuration")?;

    let selection = if all {
        RunSelection::All
    } else if let Some(name) = package {
        RunSelection::Package(name)
    } else {
        RunSelection::Stale
    };

    let report = orchestrator::run(&config, selection).context("Build pass failed")?;

    for (package, reason) in &report.skipped {
        println!("Skipped {package}: {reason}");
    }
    if report.built.is_empty() {
        println!("No packages built - repository index left untouched");
    } else {
        for package in &report.built {
            println!("Built {package}");
        }
        println!(
            "{} package(s) built, repository index refreshed",
            report.built.len()
        );
    }
    Ok(())
}
