// src/index.rs

//! APT repository index regeneration.
//!
//! Always a full rescan of the output directory - there is no
//! incremental path. Runs once per orchestration pass, and only when the
//! pass built at least one artifact.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use crate::config::BuildConfig;
use crate::error::{io_err, Result};
use crate::runner::{CommandSpec, OutputFilter};

/// Base name of the uncompressed index file
pub const INDEX_FILE_NAME: &str = "Packages";

/// Regenerate `Packages` and `Packages.gz` from the artifacts in the
/// output directory, overwriting any previous forms.
pub fn refresh(config: &BuildConfig) -> Result<()> {
    info!("rebuilding APT repository metadata");

    // The scan chats on stderr about every artifact; drop it. The
    // blank-line paragraph structure of stdout is load-bearing for APT
    // clients, so the capture stays unnormalized.
    let index = CommandSpec::new(&config.tools.dpkg_scanpackages)
        .arg("./")
        .arg("/dev/null")
        .current_dir(&config.output_dir)
        .filter(OutputFilter::Raw)
        .discard_stderr()
        .run()?;

    let index_path = config.output_dir.join(INDEX_FILE_NAME);
    fs::write(&index_path, &index).map_err(|e| io_err(&index_path, e))?;
    compress_index(&index_path)
}

/// Write `<index>.gz` next to the index at the highest compression
/// level, replacing any prior compressed form.
fn compress_index(index_path: &Path) -> Result<()> {
    let gz_path = index_path.with_extension("gz");
    let contents = fs::read(index_path).map_err(|e| io_err(index_path, e))?;

    let file = File::create(&gz_path).map_err(|e| io_err(&gz_path, e))?;
    let mut encoder = GzEncoder::new(file, Compression::best());
    encoder
        .write_all(&contents)
        .map_err(|e| io_err(&gz_path, e))?;
    encoder.finish().map_err(|e| io_err(&gz_path, e))?;
    Ok(())
}
