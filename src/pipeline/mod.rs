//! Two-pass extraction of one simulation suite.
//!
//! The sizing pass counts the galaxies of every realization and records
//! where each realization's rows start; the fill pass re-reads the same
//! files and writes the galaxy properties into a matrix allocated once from
//! that count. Both passes select galaxies through the same
//! [`StellarThreshold`](crate::data::filter::StellarThreshold).

pub mod catalog;
pub mod offsets;
pub mod properties;

use std::path::PathBuf;

use anyhow::Result;

use crate::config::PipelineConfig;
use crate::output::{write_offset_table, write_property_matrix};

/// Realizations between `info`-level progress lines.
pub const PROGRESS_EVERY: usize = 100;

/// Whether a pass that has finished `done` of `total` realizations reports.
pub(crate) fn progress_due(done: usize, total: usize) -> bool {
    done == total || done % PROGRESS_EVERY == 0
}

/// What [`run_suite`] produced.
#[derive(Debug, Clone)]
pub struct SuiteSummary {
    pub suite: String,
    pub n_galaxies: u64,
    pub offset_file: PathBuf,
    pub galaxy_file: PathBuf,
}

/// Run the sizing pass and the fill pass for `suite`, writing both tables.
pub fn run_suite(config: &PipelineConfig, suite: &str, n_realizations: usize) -> Result<SuiteSummary> {
    log::info!("{suite}: counting galaxies in {n_realizations} realizations");
    let offsets = offsets::sizing_pass(config, suite, n_realizations)?;
    let offset_file = config.offset_file(suite);
    write_offset_table(&offset_file, &offsets)?;
    log::info!("{suite}: total number of galaxies found: {}", offsets.total());

    let matrix = catalog::fill_pass(config, suite, n_realizations, &offsets)?;
    let galaxy_file = config.galaxy_file(suite);
    write_property_matrix(&galaxy_file, &matrix)?;
    log::info!(
        "{suite}: wrote {} and {}",
        offset_file.display(),
        galaxy_file.display()
    );

    Ok(SuiteSummary {
        suite: suite.to_string(),
        n_galaxies: offsets.total(),
        offset_file,
        galaxy_file,
    })
}
