// src/runner.rs

//! External process invocation with per-call output-capture policies.
//!
//! Every external tool the pipeline drives goes through [`CommandSpec`]:
//! the caller picks a working directory, whether stderr is kept, and how
//! captured stdout is post-processed. Invocation is synchronous - the
//! caller blocks until the tool exits, with no timeout.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::ToolPaths;
use crate::error::{Error, Result};

/// How captured stdout is post-processed before being returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFilter {
    /// Line endings normalized to `\n`, trailing newlines trimmed.
    #[default]
    Normalized,
    /// Normalized, and lines with no non-whitespace content dropped.
    DropBlankLines,
    /// Verbatim capture; blank-line structure preserved.
    Raw,
}

/// A single external command invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    filter: OutputFilter,
    discard_stderr: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            filter: OutputFilter::default(),
            discard_stderr: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn filter(mut self, filter: OutputFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Throw the tool's stderr away instead of capturing it.
    pub fn discard_stderr(mut self) -> Self {
        self.discard_stderr = true;
        self
    }

    /// Run the command to completion and return its captured stdout.
    ///
    /// A non-zero exit becomes [`Error::CommandFailed`] carrying whatever
    /// stderr was captured.
    pub fn run(&self) -> Result<String> {
        debug!("running: {}", self.display());

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        if self.discard_stderr {
            command.stderr(Stdio::null());
        }

        let output = command.output().map_err(|e| Error::CommandLaunch {
            command: self.display(),
            source: e,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            return Err(Error::CommandFailed {
                command: self.display(),
                status: output.status.to_string(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(apply_filter(stdout, self.filter))
    }

    fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

fn apply_filter(stdout: String, filter: OutputFilter) -> String {
    match filter {
        OutputFilter::Raw => stdout,
        OutputFilter::Normalized => normalize(&stdout),
        OutputFilter::DropBlankLines => {
            let normalized = normalize(&stdout);
            normalized
                .lines()
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

fn normalize(stdout: &str) -> String {
    stdout.replace("\r\n", "\n").trim_end_matches('\n').to_string()
}

/// Verify up front that every external tool is actually invocable, so a
/// missing install fails the pass before any control file is touched.
pub fn ensure_tools(tools: &ToolPaths) -> Result<()> {
    for tool in [&tools.rsync, &tools.dpkg_deb, &tools.dpkg_scanpackages] {
        which::which(Path::new(tool)).map_err(|_| Error::ToolNotFound(tool.clone()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_capture_trims_trailing_newlines() {
        let output = CommandSpec::new("printf")
            .arg("one\r\ntwo\n\n")
            .run()
            .unwrap();
        assert_eq!(output, "one\ntwo");
    }

    #[test]
    fn test_raw_capture_preserves_blank_lines() {
        let output = CommandSpec::new("printf")
            .arg("a\\n\\nb\\n")
            .filter(OutputFilter::Raw)
            .run()
            .unwrap();
        assert_eq!(output, "a\n\nb\n");
    }

    #[test]
    fn test_drop_blank_lines_filter() {
        let output = CommandSpec::new("printf")
            .arg("a\\n\\n  \\nb\\n")
            .filter(OutputFilter::DropBlankLines)
            .run()
            .unwrap();
        assert_eq!(output, "a\nb");
    }

    #[test]
    fn test_failure_carries_stderr() {
        let err = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo doom >&2; exit 3")
            .run()
            .unwrap_err();
        match err {
            Error::CommandFailed { stderr, .. } => assert_eq!(stderr, "doom"),
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_unlaunchable_program() {
        let err = CommandSpec::new("/nonexistent/debforge-no-such-tool")
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::CommandLaunch { .. }));
    }

    #[test]
    fn test_current_dir_applies() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = CommandSpec::new("pwd")
            .current_dir(dir.path())
            .run()
            .unwrap();
        // Canonicalize both sides; the tempdir may sit behind a symlink.
        assert_eq!(
            std::fs::canonicalize(&output).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn test_ensure_tools_reports_missing() {
        let tools = ToolPaths {
            rsync: "/nonexistent/debforge-no-such-tool".to_string(),
            ..ToolPaths::default()
        };
        let err = ensure_tools(&tools).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }
}
