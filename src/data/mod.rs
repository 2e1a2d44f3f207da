/// Data layer: subhalo fields, catalog loading, and galaxy selection.
///
/// Architecture:
/// ```text
///  fof_subhalo_tab_NNN.{hdf5,parquet,json}
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read requested /Subhalo fields → SubhaloTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SubhaloTable  │  one Column per field, row = subhalo
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  stellar-particle threshold → selected row indices
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;

#[cfg(test)]
pub(crate) mod fixtures;
