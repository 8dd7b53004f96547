// src/staging.rs

//! The staging area: a scrubbed copy of one package's source tree, the
//! only input handed to the packaging tool.
//!
//! There is a single staging path per output root and at most one live
//! [`StagingArea`] at a time - builds are strictly sequential. The path
//! is created fresh for every package and removed on every exit path of
//! that package's build.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use glob::Pattern;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{io_err, Result};
use crate::runner::CommandSpec;

/// Name of the staging directory under the output root
pub const STAGING_DIR_NAME: &str = ".workingDir";

/// Entries stripped from the staged tree before packaging: VCS metadata,
/// editor project files, bytecode caches, debug markers, repo docs.
const SCRUB_PATTERNS: &[&str] = &[
    ".svn",
    ".cache",
    ".project",
    ".pydevproject",
    "*.pyc",
    ".DEBUG",
    ".git",
    "README.md",
];

static SCRUB_GLOBS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    SCRUB_PATTERNS
        .iter()
        .map(|p| Pattern::new(p).unwrap())
        .collect()
});

/// An acquired staging directory. Dropping it removes the tree; prefer
/// the explicit [`teardown`](StagingArea::teardown) so removal failures
/// stay observable.
pub struct StagingArea {
    path: PathBuf,
    released: bool,
}

impl StagingArea {
    /// Deterministic staging path for an output root.
    pub fn path_under(output_dir: &Path) -> PathBuf {
        output_dir.join(STAGING_DIR_NAME)
    }

    /// Copy `source_dir` into the staging path and scrub it.
    ///
    /// A staging directory left behind by an interrupted run is removed
    /// first; the copy always starts from an absent path. A failed copy
    /// is an environment problem and propagates as fatal.
    pub fn prepare(rsync: &str, source_dir: &Path, output_dir: &Path) -> Result<StagingArea> {
        let path = Self::path_under(output_dir);
        remove_tree(&path)?;

        // rsync's trailing-slash contract: copy directory contents,
        // preserving attributes.
        CommandSpec::new(rsync)
            .arg("-a")
            .arg(with_trailing_slash(source_dir))
            .arg(with_trailing_slash(&path))
            .run()?;

        let area = StagingArea {
            path,
            released: false,
        };
        area.scrub()?;
        Ok(area)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staging tree. Idempotent: an already-absent path is
    /// not an error.
    pub fn teardown(mut self) -> Result<()> {
        self.released = true;
        remove_tree(&self.path)
    }

    /// Remove every entry whose name matches the scrub list, recursively.
    /// Entries that vanish while the walk is in progress are tolerated.
    fn scrub(&self) -> Result<()> {
        let mut doomed = Vec::new();
        let mut walker = WalkDir::new(&self.path).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_not_found(&err) => continue,
                Err(err) => {
                    let path = err.path().unwrap_or(&self.path).to_path_buf();
                    return Err(io_err(path, err.into()));
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if SCRUB_GLOBS.iter().any(|glob| glob.matches(&name)) {
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                doomed.push((entry.path().to_path_buf(), entry.file_type().is_dir()));
            }
        }
        for (path, is_dir) in doomed {
            if is_dir {
                remove_tree(&path)?;
            } else {
                remove_file_tolerant(&path)?;
            }
        }
        Ok(())
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if !self.released {
            if let Err(err) = remove_tree(&self.path) {
                warn!("failed to remove staging directory: {err}");
            }
        }
    }
}

fn with_trailing_slash(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_os_string();
    arg.push("/");
    arg
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|io| io.kind() == ErrorKind::NotFound)
        .unwrap_or(false)
}

fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn remove_file_tolerant(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(path, err)),
    }
}
