// src/config.rs

//! Build configuration: the source-code root, the artifact output
//! directory, and the names of the external tools the pipeline drives.
//!
//! Settings come from a TOML file (default
//! `~/.config/debforge/config.toml`); command-line flags override file
//! values. Both directories are required - there is no interactive
//! prompting, a build tool has to work under cron.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{io_err, Error, Result};

/// External tool names, overridable for nonstandard installs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Source-tree synchronization into the staging area
    pub rsync: String,
    /// Binary package assembly
    pub dpkg_deb: String,
    /// Repository index scan
    pub dpkg_scanpackages: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            rsync: "rsync".to_string(),
            dpkg_deb: "dpkg-deb".to_string(),
            dpkg_scanpackages: "dpkg-scanpackages".to_string(),
        }
    }
}

/// Resolved configuration for one orchestration pass
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding one source tree per package
    pub source_dir: PathBuf,
    /// Directory receiving `.deb` artifacts and the repository index
    pub output_dir: PathBuf,
    /// External tool names
    pub tools: ToolPaths,
}

/// On-disk shape of the config file. Directories are optional here so
/// command-line flags can supply them.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    #[serde(default)]
    tools: Option<ToolPaths>,
}

impl BuildConfig {
    /// Load configuration, merging file values with flag overrides.
    ///
    /// An explicitly requested config file must exist; the default
    /// location is allowed to be absent as long as the flags fill in
    /// both directories.
    pub fn load(
        config_path: Option<&Path>,
        source_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Result<BuildConfig> {
        let (path, explicit) = match config_path {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        let file = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            toml::from_str::<ConfigFile>(&text).map_err(|e| {
                Error::ConfigError(format!("failed to parse {}: {e}", path.display()))
            })?
        } else if explicit {
            return Err(Error::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        } else {
            ConfigFile::default()
        };

        let source_dir = source_dir.or(file.source_dir).ok_or_else(|| {
            Error::ConfigError(format!(
                "source directory not set; add source_dir to {} or pass --source-dir",
                path.display()
            ))
        })?;
        let output_dir = output_dir.or(file.output_dir).ok_or_else(|| {
            Error::ConfigError(format!(
                "output directory not set; add output_dir to {} or pass --output-dir",
                path.display()
            ))
        })?;

        Ok(BuildConfig {
            source_dir,
            output_dir,
            tools: file.tools.unwrap_or_default(),
        })
    }

    /// Source tree for one package
    pub fn package_source_dir(&self, package: &str) -> PathBuf {
        self.source_dir.join(package)
    }

    /// Built-artifact path for one package. Its modification time is the
    /// record of the package's last successful build.
    pub fn artifact_path(&self, package: &str) -> PathBuf {
        self.output_dir.join(format!("{package}.deb"))
    }
}

fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("debforge").join("config.toml"))
        .ok_or_else(|| {
            Error::ConfigError("no configuration directory known for this platform".to_string())
        })
}
