// src/builder.rs

//! Per-package build lifecycle: bump, stage, package, release.
//!
//! The version bump is committed to disk before packaging runs. A
//! packaging failure therefore leaves a bumped version with no matching
//! artifact; the freshly written control file makes the package stale
//! again, so the next pass picks it up.

use std::fs;
use std::io::ErrorKind;

use tracing::{debug, info, warn};

use crate::config::BuildConfig;
use crate::control::{self, VersionBump};
use crate::error::{io_err, Error, Result};
use crate::runner::{CommandSpec, OutputFilter};
use crate::staging::StagingArea;

/// Terminal state of one package's build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A fresh artifact was produced
    Built {
        package: String,
        previous: String,
        version: String,
    },
    /// The package's version file was unusable; the run continues
    Skipped { package: String, reason: String },
}

/// Run one package through the build pipeline.
///
/// Version-file problems skip the package. Staging, packaging, and
/// cleanup failures are environment problems affecting every subsequent
/// package too, so they abort the whole run.
pub fn build_package(config: &BuildConfig, package: &str) -> Result<BuildOutcome> {
    let bump = match increment_version(config, package) {
        Ok(bump) => bump,
        Err(err) if err.is_package_recoverable() => {
            warn!("skipping package \"{package}\": {err}");
            return Ok(BuildOutcome::Skipped {
                package: package.to_string(),
                reason: err.to_string(),
            });
        }
        Err(err) => return Err(err),
    };

    info!("creating working dir");
    let staging = StagingArea::prepare(
        &config.tools.rsync,
        &config.package_source_dir(package),
        &config.output_dir,
    )?;

    let packaged = package_artifact(config, package, &staging);

    info!("cleaning up working directory");
    let released = staging.teardown();
    // A packaging failure outranks a cleanup failure.
    packaged?;
    released?;

    Ok(BuildOutcome::Built {
        package: package.to_string(),
        previous: bump.previous,
        version: bump.next,
    })
}

/// Bump the control file's patch version and commit it to disk.
fn increment_version(config: &BuildConfig, package: &str) -> Result<VersionBump> {
    let path = control::control_file_path(config, package);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(Error::MissingControlFile {
                package: package.to_string(),
                path,
            });
        }
        Err(err) => return Err(io_err(&path, err)),
    };

    let bump = control::bump_version(&path, &contents)?;
    info!(
        "incremented package version from {} to {}",
        bump.previous, bump.next
    );
    fs::write(&path, &bump.contents).map_err(|e| io_err(&path, e))?;
    Ok(bump)
}

/// Replace the package's artifact: delete any previous one, then run the
/// packaging tool against the staged tree.
fn package_artifact(config: &BuildConfig, package: &str, staging: &StagingArea) -> Result<()> {
    info!("building .deb file");
    let artifact = config.artifact_path(package);
    match fs::remove_file(&artifact) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(&artifact, err)),
    }

    let output = CommandSpec::new(&config.tools.dpkg_deb)
        .arg("--build")
        .arg(staging.path())
        .arg(&artifact)
        .current_dir(&config.output_dir)
        .filter(OutputFilter::DropBlankLines)
        .run()?;
    if !output.is_empty() {
        debug!("{output}");
    }
    Ok(())
}
