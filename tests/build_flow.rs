// tests/build_flow.rs

//! End-to-end orchestration tests.
//!
//! The external tools are substituted with small shell stubs injected
//! through the config's tool overrides: the sync stub is a plain
//! recursive copy, the packaging stub records the staged file list into
//! the artifact, and the index stub emits one paragraph per artifact.

use std::fs::{self, File};
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;

use debforge::orchestrator::{self, RunSelection};
use debforge::staging::STAGING_DIR_NAME;
use debforge::{BuildConfig, ToolPaths};

struct Fixture {
    _root: TempDir,
    config: BuildConfig,
}

fn write_stub(dir: &Path, name: &str, script: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let source_dir = root.path().join("code");
    let output_dir = root.path().join("debs");
    let bin_dir = root.path().join("bin");
    fs::create_dir_all(&source_dir).unwrap();
    fs::create_dir_all(&output_dir).unwrap();
    fs::create_dir_all(&bin_dir).unwrap();

    // rsync -a SRC/ DEST/ -> recursive copy of SRC's contents
    let rsync = write_stub(
        &bin_dir,
        "rsync",
        "#!/bin/sh\nmkdir -p \"$3\" && cp -R \"$2\". \"$3\"\n",
    );
    // dpkg-deb --build STAGING TARGET -> artifact holds the staged file list
    let dpkg_deb = write_stub(
        &bin_dir,
        "dpkg-deb",
        "#!/bin/sh\nls -A \"$2\" > \"$3\" && echo \"built $3\"\n",
    );
    // dpkg-scanpackages ./ /dev/null -> one paragraph per .deb, noise on stderr
    let dpkg_scanpackages = write_stub(
        &bin_dir,
        "dpkg-scanpackages",
        concat!(
            "#!/bin/sh\n",
            "for deb in *.deb; do\n",
            "  echo \"Package: ${deb%.deb}\"\n",
            "  echo \"Filename: ./$deb\"\n",
            "  echo\n",
            "done\n",
            "echo 'info: scanned' >&2\n",
        ),
    );

    let config = BuildConfig {
        source_dir,
        output_dir,
        tools: ToolPaths {
            rsync: rsync.to_string_lossy().into_owned(),
            dpkg_deb: dpkg_deb.to_string_lossy().into_owned(),
            dpkg_scanpackages: dpkg_scanpackages.to_string_lossy().into_owned(),
        },
    };
    Fixture {
        _root: root,
        config,
    }
}

fn add_package(config: &BuildConfig, name: &str, version: &str) {
    let dir = config.package_source_dir(name);
    fs::create_dir_all(dir.join("DEBIAN")).unwrap();
    fs::write(
        dir.join("DEBIAN/control"),
        format!("Package: {name}\nVersion: {version}\n"),
    )
    .unwrap();
    fs::write(dir.join("payload.txt"), "data\n").unwrap();
}

/// Give `name` an artifact that is newer than anything in its source
/// tree, so the staleness check sees it as current.
fn add_current_artifact(config: &BuildConfig, name: &str) {
    let path = config.artifact_path(name);
    fs::write(&path, "existing artifact").unwrap();
    let future = filetime::FileTime::from_unix_time(
        filetime::FileTime::now().unix_seconds() + 3600,
        0,
    );
    filetime::set_file_mtime(&path, future).unwrap();
}

fn control_contents(config: &BuildConfig, name: &str) -> String {
    fs::read_to_string(
        config
            .package_source_dir(name)
            .join("DEBIAN/control"),
    )
    .unwrap()
}

fn read_gz(path: &Path) -> String {
    let mut decoded = String::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    decoded
}

#[test]
fn stale_packages_build_and_index_refreshes() {
    let f = fixture();
    add_package(&f.config, "beta", "0.1.0");
    add_package(&f.config, "alpha", "1.2.3");

    let report = orchestrator::run(&f.config, RunSelection::Stale).unwrap();

    // Deterministic order, everything built (no prior artifacts).
    assert_eq!(report.built, vec!["alpha".to_string(), "beta".to_string()]);
    assert!(report.skipped.is_empty());
    assert!(f.config.artifact_path("alpha").exists());
    assert!(f.config.artifact_path("beta").exists());

    // Patch versions bumped and committed.
    assert!(control_contents(&f.config, "alpha").contains("Version: 1.2.4"));
    assert!(control_contents(&f.config, "beta").contains("Version: 0.1.1"));

    // Index written with paragraph structure intact, plus compressed form.
    let index = fs::read_to_string(f.config.output_dir.join("Packages")).unwrap();
    assert_eq!(
        index,
        "Package: alpha\nFilename: ./alpha.deb\n\nPackage: beta\nFilename: ./beta.deb\n\n"
    );
    assert_eq!(read_gz(&f.config.output_dir.join("Packages.gz")), index);

    // The staging directory never outlives the pass.
    assert!(!f.config.output_dir.join(STAGING_DIR_NAME).exists());
}

#[test]
fn current_packages_are_left_alone() {
    let f = fixture();
    add_package(&f.config, "alpha", "1.0.0");
    add_current_artifact(&f.config, "alpha");

    // Sentinel index files must survive a no-op pass untouched.
    let index_path = f.config.output_dir.join("Packages");
    let gz_path = f.config.output_dir.join("Packages.gz");
    fs::write(&index_path, "sentinel").unwrap();
    fs::write(&gz_path, "sentinel-gz").unwrap();

    let report = orchestrator::run(&f.config, RunSelection::Stale).unwrap();

    assert!(report.built.is_empty());
    assert_eq!(control_contents(&f.config, "alpha"), "Package: alpha\nVersion: 1.0.0\n");
    assert_eq!(fs::read_to_string(&index_path).unwrap(), "sentinel");
    assert_eq!(fs::read_to_string(&gz_path).unwrap(), "sentinel-gz");
}

#[test]
fn all_selection_rebuilds_current_packages() {
    let f = fixture();
    add_package(&f.config, "alpha", "1.0.0");
    add_current_artifact(&f.config, "alpha");

    let report = orchestrator::run(&f.config, RunSelection::All).unwrap();

    assert_eq!(report.built, vec!["alpha".to_string()]);
    assert!(control_contents(&f.config, "alpha").contains("Version: 1.0.1"));
}

#[test]
fn explicit_package_builds_regardless_of_staleness() {
    let f = fixture();
    add_package(&f.config, "alpha", "1.0.0");
    add_package(&f.config, "beta", "2.0.0");
    add_current_artifact(&f.config, "alpha");
    add_current_artifact(&f.config, "beta");

    let report =
        orchestrator::run(&f.config, RunSelection::Package("alpha".to_string())).unwrap();

    assert_eq!(report.built, vec!["alpha".to_string()]);
    // Only the selected package was touched.
    assert!(control_contents(&f.config, "alpha").contains("Version: 1.0.1"));
    assert_eq!(control_contents(&f.config, "beta"), "Package: beta\nVersion: 2.0.0\n");
    assert_eq!(
        fs::read_to_string(f.config.artifact_path("beta")).unwrap(),
        "existing artifact"
    );
}

#[test]
fn explicit_package_accepts_artifact_name() {
    let f = fixture();
    add_package(&f.config, "alpha", "1.0.0");

    let report =
        orchestrator::run(&f.config, RunSelection::Package("alpha.deb".to_string())).unwrap();
    assert_eq!(report.built, vec!["alpha".to_string()]);
}

#[test]
fn version_problem_skips_package_but_run_continues() {
    let f = fixture();
    add_package(&f.config, "beta", "2.0.0");
    // alpha's control file has no usable version line.
    let dir = f.config.package_source_dir("alpha");
    fs::create_dir_all(dir.join("DEBIAN")).unwrap();
    fs::write(dir.join("DEBIAN/control"), "Package: alpha\nVersion: latest\n").unwrap();
    fs::write(dir.join("payload.txt"), "data\n").unwrap();

    let report = orchestrator::run(&f.config, RunSelection::All).unwrap();

    assert_eq!(report.built, vec!["beta".to_string()]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "alpha");
    assert!(!f.config.artifact_path("alpha").exists());
    // The surviving package still reached the index.
    let index = fs::read_to_string(f.config.output_dir.join("Packages")).unwrap();
    assert!(index.contains("Package: beta"));
}

#[test]
fn explicit_missing_package_skips_and_leaves_index_alone() {
    let f = fixture();
    let gz_path = f.config.output_dir.join("Packages.gz");
    fs::write(&gz_path, "sentinel-gz").unwrap();

    let report =
        orchestrator::run(&f.config, RunSelection::Package("ghost".to_string())).unwrap();

    assert!(report.built.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].1.contains("no control file"));
    assert_eq!(fs::read_to_string(&gz_path).unwrap(), "sentinel-gz");
}

#[test]
fn scrubbed_entries_never_reach_the_artifact() {
    let f = fixture();
    add_package(&f.config, "alpha", "1.0.0");
    let dir = f.config.package_source_dir("alpha");
    fs::create_dir_all(dir.join(".git")).unwrap();
    fs::write(dir.join(".git/HEAD"), "ref").unwrap();
    fs::write(dir.join("cached.pyc"), "bytecode").unwrap();
    fs::write(dir.join("README.md"), "docs").unwrap();

    orchestrator::run(&f.config, RunSelection::Stale).unwrap();

    // The packaging stub recorded the staged file list.
    let listing = fs::read_to_string(f.config.artifact_path("alpha")).unwrap();
    assert!(listing.contains("payload.txt"));
    assert!(listing.contains("DEBIAN"));
    assert!(!listing.contains(".git"));
    assert!(!listing.contains("cached.pyc"));
    assert!(!listing.contains("README.md"));
    // The source tree itself is untouched by the scrub.
    assert!(dir.join(".git/HEAD").exists());
    assert!(dir.join("README.md").exists());
}

#[test]
fn leftover_staging_directory_does_not_break_the_next_pass() {
    let f = fixture();
    add_package(&f.config, "alpha", "1.0.0");
    // Remnant of an interrupted earlier run.
    let staging = f.config.output_dir.join(STAGING_DIR_NAME);
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("orphan.txt"), "junk").unwrap();

    let report = orchestrator::run(&f.config, RunSelection::Stale).unwrap();

    assert_eq!(report.built, vec!["alpha".to_string()]);
    let listing = fs::read_to_string(f.config.artifact_path("alpha")).unwrap();
    assert!(!listing.contains("orphan.txt"));
    assert!(!staging.exists());
}

#[test]
fn missing_tool_aborts_before_touching_anything() {
    let mut f = fixture();
    f.config.tools.dpkg_deb = "/nonexistent/debforge-no-such-tool".to_string();
    add_package(&f.config, "alpha", "1.0.0");

    let err = orchestrator::run(&f.config, RunSelection::Stale).unwrap_err();
    assert!(matches!(err, debforge::Error::ToolNotFound(_)));
    // Preflight failed the pass before any version bump.
    assert_eq!(control_contents(&f.config, "alpha"), "Package: alpha\nVersion: 1.0.0\n");
}
