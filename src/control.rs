// src/control.rs

//! Control file access and the patch-level version bump.
//!
//! A package's declared version lives on a `Version:` line inside
//! `DEBIAN/control`. The patch component - the final numeric group - is
//! the only part this tool ever rewrites.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::BuildConfig;
use crate::error::{Error, Result};

/// Location of the control file within a package's source tree
pub const CONTROL_FILE_RELATIVE: &str = "DEBIAN/control";

/// `Version: ` followed by one-or-more dot-terminated numeric groups and
/// a final numeric patch group.
static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(Version: )((?:\d+\.)+)(\d+)").unwrap());

pub fn control_file_path(config: &BuildConfig, package: &str) -> PathBuf {
    config.package_source_dir(package).join(CONTROL_FILE_RELATIVE)
}

/// Outcome of a successful patch-level bump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    /// Version string before the bump, e.g. `1.2.9`
    pub previous: String,
    /// Version string after the bump, e.g. `1.2.10`
    pub next: String,
    /// Full control file contents with only the version value rewritten
    pub contents: String,
}

/// Increment the patch component of the first `Version:` line.
///
/// Everything outside the matched version value is returned byte-identical.
/// `path` is only used to annotate the error when no version line matches.
pub fn bump_version(path: &Path, contents: &str) -> Result<VersionBump> {
    let malformed = || Error::MalformedVersion {
        path: path.to_path_buf(),
    };

    let caps = VERSION_LINE.captures(contents).ok_or_else(malformed)?;
    let stem = caps.get(2).unwrap();
    let patch_group = caps.get(3).unwrap();
    let patch: u64 = patch_group.as_str().parse().map_err(|_| malformed())?;

    let previous = format!("{}{}", stem.as_str(), patch);
    let next = format!("{}{}", stem.as_str(), patch + 1);

    let mut updated = String::with_capacity(contents.len() + 1);
    updated.push_str(&contents[..stem.start()]);
    updated.push_str(&next);
    updated.push_str(&contents[patch_group.end()..]);

    Ok(VersionBump {
        previous,
        next,
        contents: updated,
    })
}
