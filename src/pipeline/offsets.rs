use anyhow::Result;

use crate::config::PipelineConfig;
use crate::data::filter::StellarThreshold;
use crate::data::loader::load_subhalos;

// ---------------------------------------------------------------------------
// OffsetTable – where each realization's galaxies live in the galaxy table
// ---------------------------------------------------------------------------

/// Row range of one realization inside the concatenated galaxy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetEntry {
    pub start: u64,
    pub len: u64,
}

impl OffsetEntry {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Per-realization `(start, len)` pairs. Entries are only ever appended via
/// [`OffsetTable::push`], so they tile `0..total()` without gaps or overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    entries: Vec<OffsetEntry>,
    total: u64,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next realization's galaxy count.
    pub fn push(&mut self, len: u64) -> OffsetEntry {
        let entry = OffsetEntry { start: self.total, len };
        self.entries.push(entry);
        self.total += len;
        entry
    }

    pub fn get(&self, realization: usize) -> Option<OffsetEntry> {
        self.entries.get(realization).copied()
    }

    pub fn entries(&self) -> &[OffsetEntry] {
        &self.entries
    }

    /// Number of realizations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total galaxies across all realizations.
    pub fn total(&self) -> u64 {
        self.total
    }
}

// ---------------------------------------------------------------------------
// Sizing pass
// ---------------------------------------------------------------------------

/// Count the galaxies of every realization of `suite` and lay them out
/// back to back.
pub fn sizing_pass(config: &PipelineConfig, suite: &str, n_realizations: usize) -> Result<OffsetTable> {
    let threshold = StellarThreshold::new(config.nstars_threshold);
    let mut offsets = OffsetTable::new();

    for i in 0..n_realizations {
        let path = config.catalog_path(suite, i);
        let table = load_subhalos(&path, &StellarThreshold::required_fields())?;
        let n_gal = threshold.selected_rows(&table)?.len() as u64;

        let entry = offsets.push(n_gal);
        log::debug!("{suite} LH_{i}: {n_gal} galaxies at offset {}", entry.start);
        if super::progress_due(i + 1, n_realizations) {
            log::info!("{suite}: counted galaxies in {}/{n_realizations} realizations", i + 1);
        }
    }

    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_partition_the_rows() {
        let mut offsets = OffsetTable::new();
        for len in [3, 0, 7, 1] {
            offsets.push(len);
        }

        let mut expected_start = 0;
        for entry in offsets.entries() {
            assert_eq!(entry.start, expected_start);
            expected_start += entry.len;
        }
        let last = offsets.get(3).unwrap();
        assert_eq!(last.end(), offsets.total());
        assert_eq!(offsets.total(), 11);
        assert_eq!(offsets.get(1), Some(OffsetEntry { start: 3, len: 0 }));
        assert_eq!(offsets.get(4), None);
    }

    #[test]
    fn empty_table_has_zero_total() {
        let offsets = OffsetTable::new();
        assert!(offsets.is_empty());
        assert_eq!(offsets.total(), 0);
    }
}
