// src/staleness.rs

//! Rebuild policy: which packages need a fresh artifact.
//!
//! A package is stale when it has no artifact yet, or when any regular
//! file in its source tree is newer than the artifact. Directory mtimes
//! are ignored - the source-sync tool touches them unpredictably, so only
//! file timestamps carry signal.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::control::control_file_path;
use crate::error::{io_err, Result};

/// Decide whether `source_dir` has changed since `artifact` was built.
pub fn is_stale(source_dir: &Path, artifact: &Path) -> Result<bool> {
    let artifact_meta = match fs::metadata(artifact) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(io_err(artifact, err)),
    };
    let built_at = artifact_meta.modified().map_err(|e| io_err(artifact, e))?;
    any_file_newer_than(source_dir, built_at)
}

/// Recursive newer-than query over regular files only.
fn any_file_newer_than(dir: &Path, reference: SystemTime) -> Result<bool> {
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .map_err(|e| io_err(entry.path(), e.into()))?
            .modified()
            .map_err(|e| io_err(entry.path(), e))?;
        if modified > reference {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Scan the source root for build candidates, lexicographically sorted.
///
/// Entries that are not package directories (not a directory, or no
/// control file) are left out entirely. With `force_all` the staleness
/// check is bypassed and every package directory is a candidate.
pub fn select_candidates(config: &BuildConfig, force_all: bool) -> Result<Vec<String>> {
    let mut selected = Vec::new();
    for name in sorted_entries(config)? {
        let source_dir = config.package_source_dir(&name);
        if !source_dir.is_dir() || !control_file_path(config, &name).exists() {
            debug!("ignoring \"{name}\": not a package directory");
            continue;
        }
        if force_all || is_stale(&source_dir, &config.artifact_path(&name))? {
            selected.push(name);
        } else {
            info!("skipping package \"{name}\" - .deb file already current");
        }
    }
    Ok(selected)
}

/// Observed state of one package directory, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    /// Source changed since the artifact was built
    Stale,
    /// Artifact is newer than every source file
    Current,
    /// No artifact has been built yet
    NeverBuilt,
    /// Not buildable: the directory carries no control file
    NoControlFile,
}

/// Classify every directory under the source root, without building
/// anything. Read-only counterpart of [`select_candidates`].
pub fn package_states(config: &BuildConfig) -> Result<Vec<(String, PackageState)>> {
    let mut states = Vec::new();
    for name in sorted_entries(config)? {
        let source_dir = config.package_source_dir(&name);
        if !source_dir.is_dir() {
            continue;
        }
        let state = if !control_file_path(config, &name).exists() {
            PackageState::NoControlFile
        } else {
            let artifact = config.artifact_path(&name);
            if !artifact.exists() {
                PackageState::NeverBuilt
            } else if is_stale(&source_dir, &artifact)? {
                PackageState::Stale
            } else {
                PackageState::Current
            }
        };
        states.push((name, state));
    }
    Ok(states)
}

fn sorted_entries(config: &BuildConfig) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries =
        fs::read_dir(&config.source_dir).map_err(|e| io_err(&config.source_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&config.source_dir, e))?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => debug!("ignoring non-UTF-8 entry {:?}", name),
        }
    }
    names.sort();
    Ok(names)
}
