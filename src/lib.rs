//! Galaxy property catalogs from FoF/Subfind subhalo files.
//!
//! For every realization of a simulation suite the pipeline selects the
//! subhalos holding more than a threshold of star particles, and writes
//! two plain-text tables per suite: an offset index locating each
//! realization's rows, and the 17-column galaxy property table.

pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod pipeline;
