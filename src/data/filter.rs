use anyhow::{Context, Result};

use super::model::{STAR_TYPE, SubhaloField, SubhaloTable};

// ---------------------------------------------------------------------------
// Galaxy selection: stellar-particle threshold
// ---------------------------------------------------------------------------

/// Retains subhalos with strictly more star particles than `min_stars`.
///
/// The sizing pass and the fill pass both select through
/// [`StellarThreshold::selected_rows`], so the row counts they see for a
/// given file cannot diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StellarThreshold {
    pub min_stars: i64,
}

impl StellarThreshold {
    pub fn new(min_stars: i64) -> Self {
        Self { min_stars }
    }

    pub fn retains(&self, n_stars: i64) -> bool {
        n_stars > self.min_stars
    }

    /// Fields a table must contain for [`Self::selected_rows`].
    pub fn required_fields() -> [SubhaloField; 1] {
        [SubhaloField::LenType]
    }

    /// Indices of retained subhalos, in file order.
    pub fn selected_rows(&self, table: &SubhaloTable) -> Result<Vec<usize>> {
        let len_type = table
            .column(SubhaloField::LenType)
            .context("selection needs SubhaloLenType")?;

        Ok((0..len_type.len())
            .filter(|&row| self.retains(len_type.get_int(row, STAR_TYPE)))
            .collect())
    }
}
