use anyhow::{Context, Result};

use crate::config::N_PROPERTIES;
use crate::data::model::{Column, STAR_TYPE, SubhaloField, SubhaloTable};

/// Simulation mass unit, in Msun/h.
pub const MASS_UNIT: f64 = 1e10;

/// ckpc/h → cMpc/h.
pub const LENGTH_UNIT: f64 = 1e-3;

/// Slots of the U, K and g bands in `SubhaloStellarPhotometrics`.
const BAND_U: usize = 0;
const BAND_K: usize = 3;
const BAND_G: usize = 4;

/// One column of the galaxy table. The discriminant is the column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    GasMass,
    StellarMass,
    BlackHoleMass,
    TotalMass,
    Vmax,
    VelocityDispersion,
    GasMetallicity,
    StellarMetallicity,
    StarFormationRate,
    Spin,
    PeculiarVelocity,
    StellarRadius,
    TotalRadius,
    VmaxRadius,
    MagnitudeU,
    MagnitudeK,
    MagnitudeG,
}

impl Property {
    pub const ALL: [Property; N_PROPERTIES] = [
        Property::GasMass,
        Property::StellarMass,
        Property::BlackHoleMass,
        Property::TotalMass,
        Property::Vmax,
        Property::VelocityDispersion,
        Property::GasMetallicity,
        Property::StellarMetallicity,
        Property::StarFormationRate,
        Property::Spin,
        Property::PeculiarVelocity,
        Property::StellarRadius,
        Property::TotalRadius,
        Property::VmaxRadius,
        Property::MagnitudeU,
        Property::MagnitudeK,
        Property::MagnitudeG,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column label with unit, as written in the table header.
    pub fn label(self) -> &'static str {
        match self {
            Property::GasMass => "gas mass [Msun/h]",
            Property::StellarMass => "stellar mass [Msun/h]",
            Property::BlackHoleMass => "black-hole mass [Msun/h]",
            Property::TotalMass => "total mass [Msun/h]",
            Property::Vmax => "Vmax [km/s]",
            Property::VelocityDispersion => "velocity dispersion [km/s]",
            Property::GasMetallicity => "gas metallicity",
            Property::StellarMetallicity => "stars metallicity",
            Property::StarFormationRate => "star-formation rate [Msun/yr]",
            Property::Spin => "spin [(kpc/h)(km/s)]",
            Property::PeculiarVelocity => "peculiar velocity [km/s]",
            Property::StellarRadius => "stellar radius [Mpc/h]",
            Property::TotalRadius => "total radius [Mpc/h]",
            Property::VmaxRadius => "Vmax radius [Mpc/h]",
            Property::MagnitudeU => "U [mag]",
            Property::MagnitudeK => "K [mag]",
            Property::MagnitudeG => "g [mag]",
        }
    }
}

// ---------------------------------------------------------------------------
// GalaxyView – property extraction over one loaded catalog
// ---------------------------------------------------------------------------

/// The columns of one catalog that the galaxy properties derive from.
pub struct GalaxyView<'a> {
    mass_type: &'a Column,
    bh_mass: &'a Column,
    mass: &'a Column,
    vmax: &'a Column,
    vel_disp: &'a Column,
    gas_metallicity: &'a Column,
    star_metallicity: &'a Column,
    sfr: &'a Column,
    spin: &'a Column,
    vel: &'a Column,
    halfmass_rad_type: &'a Column,
    halfmass_rad: &'a Column,
    vmax_rad: &'a Column,
    photometrics: &'a Column,
}

impl<'a> GalaxyView<'a> {
    /// Fields the view needs, on top of the selection fields.
    pub const FIELDS: [SubhaloField; 14] = [
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

    pub fn new(table: &'a SubhaloTable) -> Result<Self> {
        let field = |f: SubhaloField| {
            table
                .column(f)
                .with_context(|| format!("{} not loaded", f.name()))
        };
        Ok(Self {
            mass_type: field(SubhaloField::MassType)?,
            bh_mass: field(SubhaloField::BhMass)?,
            mass: field(SubhaloField::Mass)?,
            vmax: field(SubhaloField::Vmax)?,
            vel_disp: field(SubhaloField::VelDisp)?,
            gas_metallicity: field(SubhaloField::GasMetallicity)?,
            star_metallicity: field(SubhaloField::StarMetallicity)?,
            sfr: field(SubhaloField::Sfr)?,
            spin: field(SubhaloField::Spin)?,
            vel: field(SubhaloField::Vel)?,
            halfmass_rad_type: field(SubhaloField::HalfmassRadType)?,
            halfmass_rad: field(SubhaloField::HalfmassRad)?,
            vmax_rad: field(SubhaloField::VmaxRad)?,
            photometrics: field(SubhaloField::StellarPhotometrics)?,
        })
    }

    /// Value of `property` for subhalo `row`, in output units.
    pub fn value(&self, property: Property, row: usize) -> f64 {
        match property {
            Property::GasMass => self.mass_type.get(row, 0) * MASS_UNIT,
            Property::StellarMass => self.mass_type.get(row, STAR_TYPE) * MASS_UNIT,
            Property::BlackHoleMass => self.bh_mass.get(row, 0) * MASS_UNIT,
            Property::TotalMass => self.mass.get(row, 0) * MASS_UNIT,
            Property::Vmax => self.vmax.get(row, 0),
            Property::VelocityDispersion => self.vel_disp.get(row, 0),
            Property::GasMetallicity => self.gas_metallicity.get(row, 0),
            Property::StellarMetallicity => self.star_metallicity.get(row, 0),
            Property::StarFormationRate => self.sfr.get(row, 0),
            Property::Spin => self.spin.norm(row),
            Property::PeculiarVelocity => self.vel.norm(row),
            Property::StellarRadius => self.halfmass_rad_type.get(row, STAR_TYPE) * LENGTH_UNIT,
            Property::TotalRadius => self.halfmass_rad.get(row, 0) * LENGTH_UNIT,
            Property::VmaxRadius => self.vmax_rad.get(row, 0) * LENGTH_UNIT,
            Property::MagnitudeU => self.photometrics.get(row, BAND_U),
            Property::MagnitudeK => self.photometrics.get(row, BAND_K),
            Property::MagnitudeG => self.photometrics.get(row, BAND_G),
        }
    }

    /// Fill one output row with every property of subhalo `row`.
    pub fn write_row(&self, row: usize, out: &mut [f32]) {
        for (slot, property) in out.iter_mut().zip(Property::ALL) {
            *slot = self.value(property, row) as f32;
        }
    }
}

/// Table header: all column labels joined as `| a | b | ... |`.
pub fn header() -> String {
    let labels: Vec<&str> = Property::ALL.iter().map(|p| p.label()).collect();
    format!("| {} |", labels.join(" | "))
}
