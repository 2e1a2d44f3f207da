use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Number of columns in the galaxy property table.
pub const N_PROPERTIES: usize = 17;

/// Default stellar-particle threshold: a subhalo is a galaxy when it holds
/// strictly more star particles than this.
pub const DEFAULT_NSTARS_THRESHOLD: i64 = 20;

/// Default snapshot (z = 0).
pub const DEFAULT_SNAPNUM: u32 = 33;

/// Suites processed when none are named on the command line, in order.
pub const DEFAULT_SUITES: [&str; 2] = ["SIMBA", "IllustrisTNG"];

/// Snapshot number → redshift for the snapshots written by the LH runs.
const SNAPSHOT_REDSHIFTS: [(u32, f64); 6] = [
    (33, 0.0),
    (25, 0.5),
    (19, 1.0),
    (14, 1.5),
    (10, 2.0),
    (4, 3.0),
];

/// Look up the redshift of a snapshot.
pub fn snapshot_redshift(snapnum: u32) -> Result<f64, PipelineError> {
    SNAPSHOT_REDSHIFTS
        .iter()
        .find(|(snap, _)| *snap == snapnum)
        .map(|(_, z)| *z)
        .ok_or(PipelineError::UnknownSnapshot(snapnum))
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Everything both passes need to locate inputs, select galaxies and name
/// outputs. Built once in `main` and borrowed by each pass.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding one sub-directory per suite.
    pub root: PathBuf,
    pub snapnum: u32,
    /// Redshift of `snapnum`, resolved at construction.
    pub redshift: f64,
    pub nstars_threshold: i64,
    /// Catalog file extension; selects the reader.
    pub extension: String,
    /// Where the offset and galaxy tables are written.
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    /// Build a configuration, rejecting snapshots without a known redshift.
    pub fn new(root: impl Into<PathBuf>, snapnum: u32) -> Result<Self, PipelineError> {
        Ok(Self {
            root: root.into(),
            snapnum,
            redshift: snapshot_redshift(snapnum)?,
            nstars_threshold: DEFAULT_NSTARS_THRESHOLD,
            extension: "hdf5".to_string(),
            output_dir: PathBuf::from("."),
        })
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_threshold(mut self, nstars_threshold: i64) -> Self {
        self.nstars_threshold = nstars_threshold;
        self
    }

    /// `<root>/<suite>/LH/LH_<i>/fof_subhalo_tab_<snap:03>.<ext>`
    pub fn catalog_path(&self, suite: &str, realization: usize) -> PathBuf {
        self.root
            .join(suite)
            .join("LH")
            .join(format!("LH_{realization}"))
            .join(format!("fof_subhalo_tab_{:03}.{}", self.snapnum, self.extension))
    }

    /// Redshift as it appears in output file names, e.g. `0.50`.
    pub fn redshift_label(&self) -> String {
        format!("{:.2}", self.redshift)
    }

    pub fn offset_file(&self, suite: &str) -> PathBuf {
        self.output_dir
            .join(format!("offset_{suite}_z={}.txt", self.redshift_label()))
    }

    pub fn galaxy_file(&self, suite: &str) -> PathBuf {
        self.output_dir
            .join(format!("galaxies_{suite}_z={}.txt", self.redshift_label()))
    }
}

/// Expand a leading `~` to `$HOME`.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
