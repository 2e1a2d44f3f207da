use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use galaxy_catalog::config::{self, DEFAULT_SNAPNUM, DEFAULT_SUITES, PipelineConfig};
use galaxy_catalog::pipeline::run_suite;

/// Build per-galaxy property tables and offset indices for the LH
/// realizations of each simulation suite.
///
/// Only `-n` is needed for a standard run. The remaining options exist to
/// point the pipeline at another archive layout or at synthetic catalogs;
/// their defaults are the fixed archive root, snapshot 33 (z=0), the SIMBA
/// and IllustrisTNG suites, `.hdf5` catalogs and the working directory.
#[derive(Parser, Debug)]
#[command(name = "galaxy-catalog")]
struct Args {
    /// Size of the probed catalogues. Can be reduced to create smaller datasets.
    #[arg(short = 'n', long = "n_realizations", default_value_t = 1000)]
    n_realizations: usize,

    /// Archive root holding `<suite>/LH/LH_<i>/` catalogs.
    #[arg(long, default_value = "~/Data/FOF_Subfind")]
    root: PathBuf,

    /// Snapshot to read: 33 (z=0), 25 (z=0.5), 19 (z=1), 14 (z=1.5), 10 (z=2), 4 (z=3).
    #[arg(long, default_value_t = DEFAULT_SNAPNUM)]
    snapnum: u32,

    /// Suite to process; repeat for several. Defaults to SIMBA then IllustrisTNG.
    #[arg(long = "suite")]
    suites: Vec<String>,

    /// Catalog file extension (hdf5, parquet or json).
    #[arg(long, default_value = "hdf5")]
    extension: String,

    /// Directory the offset and galaxy tables are written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = PipelineConfig::new(config::expand_home(&args.root), args.snapnum)?
        .with_extension(args.extension)
        .with_output_dir(args.output_dir);
    log::info!("Redshift: {:.2}", config.redshift);

    let suites = if args.suites.is_empty() {
        DEFAULT_SUITES.iter().map(|s| s.to_string()).collect()
    } else {
        args.suites
    };

    for suite in &suites {
        let summary = run_suite(&config, suite, args.n_realizations)?;
        log::info!("{}: {} galaxies", summary.suite, summary.n_galaxies);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_reproduce_standard_run() {
        let args = Args::try_parse_from(["galaxy-catalog"]).unwrap();
        assert_eq!(args.n_realizations, 1000);
        assert_eq!(args.root, PathBuf::from("~/Data/FOF_Subfind"));
        assert_eq!(args.snapnum, 33);
        assert!(args.suites.is_empty());
        assert_eq!(args.extension, "hdf5");
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn realization_count_has_short_and_long_forms() {
        let short = Args::try_parse_from(["galaxy-catalog", "-n", "25"]).unwrap();
        let long = Args::try_parse_from(["galaxy-catalog", "--n_realizations", "25"]).unwrap();
        assert_eq!(short.n_realizations, 25);
        assert_eq!(long.n_realizations, 25);
    }
}
