//! Writes a synthetic `<root>/<suite>/LH/LH_<i>/fof_subhalo_tab_<snap>.<ext>`
//! tree so the pipeline can run without the simulation archive.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, Float32Array, Float32Builder, Int32Array, Int32Builder, ListBuilder};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use galaxy_catalog::config::{DEFAULT_SNAPNUM, DEFAULT_SUITES, PipelineConfig};
use galaxy_catalog::data::model::{STAR_TYPE, SubhaloField};

#[derive(Parser, Debug)]
#[command(name = "generate-sample")]
struct Args {
    /// Output root; suites are created beneath it.
    #[arg(long, default_value = "sample_fof")]
    root: PathBuf,

    #[arg(short = 'n', long = "n_realizations", default_value_t = 10)]
    n_realizations: usize,

    #[arg(long, default_value_t = DEFAULT_SNAPNUM)]
    snapnum: u32,

    /// Catalog format: parquet or json.
    #[arg(long, default_value = "parquet")]
    format: String,

    /// Upper bound on subhalos per realization.
    #[arg(long, default_value_t = 200)]
    max_subhalos: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One realization: for every field, `rows × width` values.
type Catalog = Vec<(SubhaloField, Vec<Vec<f64>>)>;

/// Loosely scaled subhalos; the star count spans the selection threshold.
fn generate_catalog(rng: &mut SimpleRng, n: usize) -> Catalog {
    let mut catalog: Catalog = SubhaloField::ALL.iter().map(|&f| (f, Vec::with_capacity(n))).collect();

    for _ in 0..n {
        let log_mass = rng.uniform(-1.5, 2.5);
        let mass = 10f64.powf(log_mass);
        let stars = (10f64.powf(log_mass + 1.0) * rng.uniform(0.5, 1.5)).floor();
        let star_mass = stars * 1e-4;
        let gas_mass = mass * rng.uniform(0.05, 0.2);
        let radius = 10.0 * mass.cbrt();
        let vmax = 60.0 * mass.powf(0.3) + rng.gauss(0.0, 5.0).abs();
        let mag = -16.0 - 2.5 * star_mass.max(1e-6).log10();

        for (field, rows) in catalog.iter_mut() {
            let row = match field {
                SubhaloField::LenType => {
                    let mut counts = vec![(gas_mass * 1e3).floor(), (mass * 1e3).floor(), 0.0, 0.0, 0.0, 0.0];
                    counts[STAR_TYPE] = stars;
                    counts
                }
                SubhaloField::MassType => {
                    let mut masses = vec![gas_mass, mass - gas_mass - star_mass, 0.0, 0.0, 0.0, 0.0];
                    masses[STAR_TYPE] = star_mass;
                    masses
                }
                SubhaloField::BhMass => vec![star_mass * 1e-3],
                SubhaloField::Mass => vec![mass],
                SubhaloField::Vmax => vec![vmax],
                SubhaloField::VelDisp => vec![vmax * rng.uniform(0.5, 0.7)],
                SubhaloField::GasMetallicity => vec![rng.uniform(0.0, 0.03)],
                SubhaloField::StarMetallicity => vec![rng.uniform(0.0, 0.04)],
                SubhaloField::Sfr => vec![gas_mass * rng.uniform(0.0, 0.5)],
                SubhaloField::Spin | SubhaloField::Vel => {
                    (0..3).map(|_| rng.gauss(0.0, vmax)).collect()
                }
                SubhaloField::HalfmassRadType => {
                    let mut radii = vec![radius * 1.5, radius, 0.0, 0.0, 0.0, 0.0];
                    radii[STAR_TYPE] = radius * 0.3;
                    radii
                }
                SubhaloField::HalfmassRad => vec![radius],
                SubhaloField::VmaxRad => vec![radius * 1.2],
                SubhaloField::StellarPhotometrics => {
                    (0..8).map(|band| mag - 0.4 * band as f64 + rng.gauss(0.0, 0.1)).collect()
                }
            };
            rows.push(row);
        }
    }
    catalog
}

fn write_json(path: &Path, catalog: &Catalog) -> Result<()> {
    let mut group = Map::new();
    for (field, rows) in catalog {
        let cell = |v: f64| {
            if field.is_integral() {
                JsonValue::from(v as i64)
            } else {
                JsonValue::from(v as f32 as f64)
            }
        };
        let values: Vec<JsonValue> = rows
            .iter()
            .map(|row| match row.as_slice() {
                [v] if field.width() == 1 => cell(*v),
                _ => JsonValue::Array(row.iter().map(|&v| cell(v)).collect()),
            })
            .collect();
        group.insert(field.name().to_string(), JsonValue::Array(values));
    }

    let mut doc = Map::new();
    doc.insert("Subhalo".to_string(), JsonValue::Object(group));
    std::fs::write(path, serde_json::to_string(&doc)?)
        .with_context(|| format!("writing {}", path.display()))
}

fn write_parquet(path: &Path, catalog: &Catalog) -> Result<()> {
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();

    for (field, rows) in catalog {
        let array: ArrayRef = match (field.width(), field.is_integral()) {
            (1, false) => Arc::new(Float32Array::from_iter_values(rows.iter().map(|r| r[0] as f32))),
            (1, true) => Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r[0] as i32))),
            (_, false) => {
                let mut builder = ListBuilder::new(Float32Builder::new());
                for row in rows {
                    builder.values().append_slice(&row.iter().map(|&v| v as f32).collect::<Vec<_>>());
                    builder.append(true);
                }
                Arc::new(builder.finish())
            }
            (_, true) => {
                let mut builder = ListBuilder::new(Int32Builder::new());
                for row in rows {
                    builder.values().append_slice(&row.iter().map(|&v| v as i32).collect::<Vec<_>>());
                    builder.append(true);
                }
                Arc::new(builder.finish())
            }
        };
        fields.push(Field::new(field.name(), array.data_type().clone(), false));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let format = args.format.to_ascii_lowercase();
    if format != "parquet" && format != "json" {
        bail!("Unsupported sample format: {format} (expected parquet or json)");
    }
    let config = PipelineConfig::new(args.root.clone(), args.snapnum)?.with_extension(format.clone());
    let mut rng = SimpleRng::new(args.seed);

    for suite in DEFAULT_SUITES {
        for i in 0..args.n_realizations {
            let n = 1 + (rng.next_u64() as usize) % args.max_subhalos.max(1);
            let catalog = generate_catalog(&mut rng, n);

            let path = config.catalog_path(suite, i);
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            }
            match format.as_str() {
                "json" => write_json(&path, &catalog)?,
                _ => write_parquet(&path, &catalog)?,
            }
        }
        log::info!("{suite}: wrote {} realizations under {}", args.n_realizations, args.root.display());
    }

    // Matching invocation of the pipeline.
    println!(
        "galaxy-catalog --root {} --extension {format} -n {}",
        args.root.display(),
        args.n_realizations
    );
    Ok(())
}
