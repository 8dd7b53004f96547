// src/error.rs

//! Error types for debforge
//!
//! Two tiers matter to the build loop: problems confined to one package's
//! version file skip that package, everything else aborts the run. See
//! [`Error::is_package_recoverable`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can arise from an orchestration pass
#[derive(Error, Debug)]
pub enum Error {
    /// Control file exists but carries no parseable `Version:` line
    #[error("no Version: line found in {path}")]
    MalformedVersion { path: PathBuf },

    /// Package directory has no control file
    #[error("no control file found for {package} (expected {path})")]
    MissingControlFile { package: String, path: PathBuf },

    /// An I/O error, with annotated path for context
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("`{command}` failed with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// External tool could not be started at all
    #[error("failed to launch `{command}`: {source}")]
    CommandLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Required external tool is not installed
    #[error("required tool not found in PATH: {0}")]
    ToolNotFound(String),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is confined to a single package's version file.
    ///
    /// The build loop records such packages as skipped and moves on;
    /// any other error aborts the whole pass.
    pub fn is_package_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MalformedVersion { .. } | Error::MissingControlFile { .. }
        )
    }
}

/// Convenience constructor for [`Error::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
    Error::Io {
        path: path.into(),
        source,
    }
}
