//! SI quantity aliases used in property packs.

use uom::si::f64::{
    AvailableEnergy as UomAvailableEnergy, MassDensity as UomMassDensity,
    Pressure as UomPressure, SpecificHeatCapacity as UomSpecificHeatCapacity,
    ThermodynamicTemperature as UomThermodynamicTemperature, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;
pub type SpecEnergy = UomAvailableEnergy;
pub type SpecHeat = UomSpecificHeatCapacity;
pub type Temperature = UomThermodynamicTemperature;
pub type Velocity = UomVelocity;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kg_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn j_per_kg(v: f64) -> SpecEnergy {
    use uom::si::available_energy::joule_per_kilogram;
    SpecEnergy::new::<joule_per_kilogram>(v)
}

#[inline]
pub fn j_per_kg_k(v: f64) -> SpecHeat {
    use uom::si::specific_heat_capacity::joule_per_kilogram_kelvin;
    SpecHeat::new::<joule_per_kilogram_kelvin>(v)
}

pub mod constants {
    /// Universal gas constant [J/(kmol·K)]
    pub const R_UNIVERSAL: f64 = 8314.47;

    /// Standard pressure [Pa]
    pub const P_STD: f64 = 1.0e5;

    /// Standard temperature [K]
    pub const T_STD: f64 = 298.15;
}
