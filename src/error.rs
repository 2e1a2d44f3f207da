use std::path::PathBuf;

use thiserror::Error;

/// Failures the pipeline detects itself, as opposed to I/O or container
/// errors bubbling up from the readers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("snapshot {0} has no known redshift (expected one of 4, 10, 14, 19, 25, 33)")]
    UnknownSnapshot(u32),

    #[error(
        "{suite} realization {realization}: sizing pass recorded {expected} galaxies \
         but fill pass selected {found}"
    )]
    CountMismatch {
        suite: String,
        realization: usize,
        expected: u64,
        found: u64,
    },

    #[error("{suite}: offset table covers {recorded} realizations, {requested} requested")]
    RealizationCount {
        suite: String,
        recorded: usize,
        requested: usize,
    },

    #[error("{}: field {field} has shape {found:?}, expected width {width}", path.display())]
    FieldShape {
        path: PathBuf,
        field: &'static str,
        width: usize,
        found: Vec<usize>,
    },
}
