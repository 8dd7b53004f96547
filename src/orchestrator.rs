// src/orchestrator.rs

//! Top-level sequencing: resolve the package selection, build each
//! candidate in order, refresh the repository index when anything was
//! built.

use tracing::info;

use crate::builder::{build_package, BuildOutcome};
use crate::config::BuildConfig;
use crate::error::Result;
use crate::index;
use crate::runner::ensure_tools;
use crate::staleness::select_candidates;

/// The package set chosen for one orchestration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSelection {
    /// Staleness-filtered scan of the source root (the default)
    Stale,
    /// Every discoverable package, staleness ignored
    All,
    /// One named package, staleness ignored
    Package(String),
}

/// What one orchestration pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Packages that produced a fresh artifact, in build order
    pub built: Vec<String>,
    /// Packages skipped over a version-file problem, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Run one orchestration pass.
///
/// Candidates build strictly sequentially; a skip does not halt the
/// loop, any other failure does. The index refresh runs once at the
/// end, and only if at least one package was built.
pub fn run(config: &BuildConfig, selection: RunSelection) -> Result<RunReport> {
    ensure_tools(&config.tools)?;

    let candidates = resolve_selection(config, &selection)?;
    let mut report = RunReport::default();
    for package in &candidates {
        info!("Building package \"{package}\"");
        match build_package(config, package)? {
            BuildOutcome::Built {
                package,
                previous,
                version,
            } => {
                info!("done with \"{package}\" ({previous} -> {version})");
                report.built.push(package);
            }
            BuildOutcome::Skipped { package, reason } => {
                report.skipped.push((package, reason));
            }
        }
    }

    if report.built.is_empty() {
        info!("Not rebuilding APT repository metadata (no packages updated)");
    } else {
        index::refresh(config)?;
    }
    Ok(report)
}

/// Resolve the selection into a concrete ordered candidate list.
///
/// Explicit and force-all selections never consult the staleness query.
/// An explicit name is not pre-validated against the directory listing;
/// a bad name surfaces as a skip inside the build itself.
fn resolve_selection(config: &BuildConfig, selection: &RunSelection) -> Result<Vec<String>> {
    match selection {
        RunSelection::All => select_candidates(config, true),
        RunSelection::Stale => select_candidates(config, false),
        RunSelection::Package(name) => {
            // A pasted artifact name works too: "webapp.deb" builds "webapp".
            let name = name.strip_suffix(".deb").unwrap_or(name);
            Ok(vec![name.to_string()])
        }
    }
}
