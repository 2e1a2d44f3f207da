use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// SubhaloField – the /Subhalo datasets the pipeline reads
// ---------------------------------------------------------------------------

/// A named dataset of the `/Subhalo` group in a FoF/Subfind catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubhaloField {
    /// Particle counts per type (gas, DM, unused, tracers, stars, BHs).
    LenType,
    /// Mass per particle type, 1e10 Msun/h.
    MassType,
    BhMass,
    Mass,
    Vmax,
    VelDisp,
    GasMetallicity,
    StarMetallicity,
    Sfr,
    Spin,
    Vel,
    HalfmassRadType,
    HalfmassRad,
    VmaxRad,
    /// U, B, V, K, g, r, i, z magnitudes.
    StellarPhotometrics,
}

impl SubhaloField {
    pub const ALL: [SubhaloField; 15] = [
        SubhaloField::LenType,
        SubhaloField::MassType,
        SubhaloField::BhMass,
        SubhaloField::Mass,
        SubhaloField::Vmax,
        SubhaloField::VelDisp,
        SubhaloField::GasMetallicity,
        SubhaloField::StarMetallicity,
        SubhaloField::Sfr,
        SubhaloField::Spin,
        SubhaloField::Vel,
        SubhaloField::HalfmassRadType,
        SubhaloField::HalfmassRad,
        SubhaloField::VmaxRad,
        SubhaloField::StellarPhotometrics,
    ];

    /// Dataset name inside the `/Subhalo` group.
    pub fn name(self) -> &'static str {
        match self {
            SubhaloField::LenType => "SubhaloLenType",
            SubhaloField::MassType => "SubhaloMassType",
            SubhaloField::BhMass => "SubhaloBHMass",
            SubhaloField::Mass => "SubhaloMass",
            SubhaloField::Vmax => "SubhaloVmax",
            SubhaloField::VelDisp => "SubhaloVelDisp",
            SubhaloField::GasMetallicity => "SubhaloGasMetallicity",
            SubhaloField::StarMetallicity => "SubhaloStarMetallicity",
            SubhaloField::Sfr => "SubhaloSFR",
            SubhaloField::Spin => "SubhaloSpin",
            SubhaloField::Vel => "SubhaloVel",
            SubhaloField::HalfmassRadType => "SubhaloHalfmassRadType",
            SubhaloField::HalfmassRad => "SubhaloHalfmassRad",
            SubhaloField::VmaxRad => "SubhaloVmaxRad",
            SubhaloField::StellarPhotometrics => "SubhaloStellarPhotometrics",
        }
    }

    /// Number of components per subhalo (1 for scalars).
    pub fn width(self) -> usize {
        match self {
            SubhaloField::LenType | SubhaloField::MassType | SubhaloField::HalfmassRadType => 6,
            SubhaloField::Spin | SubhaloField::Vel => 3,
            SubhaloField::StellarPhotometrics => 8,
            _ => 1,
        }
    }

    /// Whether the dataset holds integer counts rather than floats.
    pub fn is_integral(self) -> bool {
        matches!(self, SubhaloField::LenType)
    }
}

/// Particle-type slot of star particles in the per-type fields.
pub const STAR_TYPE: usize = 4;

// ---------------------------------------------------------------------------
// Column – one field's values for every subhalo
// ---------------------------------------------------------------------------

/// Row-major values of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub width: usize,
    pub data: ColumnData,
}

impl Column {
    pub fn ints(width: usize, values: Vec<i64>) -> Self {
        Self { width, data: ColumnData::Int(values) }
    }

    pub fn floats(width: usize, values: Vec<f64>) -> Self {
        Self { width, data: ColumnData::Float(values) }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        let flat = match &self.data {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
        };
        if self.width == 0 { 0 } else { flat / self.width }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component `k` of row `row` as an `f64`.
    pub fn get(&self, row: usize, k: usize) -> f64 {
        let i = row * self.width + k;
        match &self.data {
            ColumnData::Int(v) => v[i] as f64,
            ColumnData::Float(v) => v[i],
        }
    }

    /// Component `k` of row `row` as an integer count. Float columns are
    /// truncated.
    pub fn get_int(&self, row: usize, k: usize) -> i64 {
        let i = row * self.width + k;
        match &self.data {
            ColumnData::Int(v) => v[i],
            ColumnData::Float(v) => v[i] as i64,
        }
    }

    /// Euclidean norm of row `row` across all components.
    pub fn norm(&self, row: usize) -> f64 {
        (0..self.width)
            .map(|k| self.get(row, k).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

// ---------------------------------------------------------------------------
// SubhaloTable – the fields read from one catalog file
// ---------------------------------------------------------------------------

/// The requested fields of one catalog file, all with the same row count.
#[derive(Debug, Clone, Default)]
pub struct SubhaloTable {
    columns: BTreeMap<SubhaloField, Column>,
    n_rows: usize,
}

impl SubhaloTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. Returns `false` (and leaves the table untouched) when its
    /// row count disagrees with the fields already present.
    pub fn insert(&mut self, field: SubhaloField, column: Column) -> bool {
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return false;
        }
        self.n_rows = column.len();
        self.columns.insert(field, column);
        true
    }

    pub fn column(&self, field: SubhaloField) -> Option<&Column> {
        self.columns.get(&field)
    }

    /// Number of subhalos.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }
}
