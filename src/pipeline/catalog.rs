use anyhow::Result;

use super::offsets::OffsetTable;
use super::properties::GalaxyView;
use crate::config::{N_PROPERTIES, PipelineConfig};
use crate::data::filter::StellarThreshold;
use crate::data::loader::load_subhalos;
use crate::data::model::SubhaloField;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// PropertyMatrix – dense galaxies × properties table
// ---------------------------------------------------------------------------

/// Row-major `f32` table with [`N_PROPERTIES`] columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMatrix {
    data: Vec<f32>,
}

impl PropertyMatrix {
    /// A zero-filled matrix of `rows` galaxies.
    pub fn zeros(rows: usize) -> Self {
        Self {
            data: vec![0.0; rows * N_PROPERTIES],
        }
    }

    pub fn rows(&self) -> usize {
        self.data.len() / N_PROPERTIES
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * N_PROPERTIES..(i + 1) * N_PROPERTIES]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(N_PROPERTIES)
    }

    /// Mutable view of `count` consecutive rows starting at `start`.
    fn block_mut(&mut self, start: usize, count: usize) -> &mut [f32] {
        &mut self.data[start * N_PROPERTIES..(start + count) * N_PROPERTIES]
    }
}

// ---------------------------------------------------------------------------
// Fill pass
// ---------------------------------------------------------------------------

/// Extract the properties of every galaxy of `suite` into a matrix sized by
/// the sizing pass. Each realization's rows go to the slice `offsets`
/// recorded for it; a realization whose galaxy count no longer matches that
/// slice aborts the pass.
pub fn fill_pass(
    config: &PipelineConfig,
    suite: &str,
    n_realizations: usize,
    offsets: &OffsetTable,
) -> Result<PropertyMatrix> {
    if offsets.len() != n_realizations {
        return Err(PipelineError::RealizationCount {
            suite: suite.to_string(),
            recorded: offsets.len(),
            requested: n_realizations,
        }
        .into());
    }

    let threshold = StellarThreshold::new(config.nstars_threshold);
    let fields: Vec<SubhaloField> = StellarThreshold::required_fields()
        .into_iter()
        .chain(GalaxyView::FIELDS)
        .collect();

    let mut matrix = PropertyMatrix::zeros(usize::try_from(offsets.total())?);

    for (i, entry) in offsets.entries().iter().enumerate() {
        let path = config.catalog_path(suite, i);
        let table = load_subhalos(&path, &fields)?;
        let view = GalaxyView::new(&table)?;
        let selected = threshold.selected_rows(&table)?;

        if selected.len() as u64 != entry.len {
            return Err(PipelineError::CountMismatch {
                suite: suite.to_string(),
                realization: i,
                expected: entry.len,
                found: selected.len() as u64,
            }
            .into());
        }

        let block = matrix.block_mut(entry.start as usize, selected.len());
        for (out, &row) in block.chunks_exact_mut(N_PROPERTIES).zip(&selected) {
            view.write_row(row, out);
        }
        log::debug!("{suite} LH_{i}: wrote rows {}..{}", entry.start, entry.end());
        if super::progress_due(i + 1, n_realizations) {
            log::info!("{suite}: extracted properties of {}/{n_realizations} realizations", i + 1);
        }
    }

    Ok(matrix)
}
