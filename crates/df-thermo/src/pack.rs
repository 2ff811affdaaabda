use df_core::units::{Density, Pressure, SpecEnergy, SpecHeat, Temperature, Velocity};
use df_core::units::{j_per_kg, j_per_kg_k, k, kg_m3, mps, pa};
use serde::{Deserialize, Serialize};

/// Closure properties of one state, gathered in a single evaluation.
/// Quantities serialize as their SI values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThermoPropertyPack {
    /// Pressure [Pa]
    pub p: Pressure,

    /// Temperature [K]
    pub t: Temperature,

    /// Density [kg/m³]
    pub rho: Density,

    /// Specific internal energy [J/kg]
    pub e: SpecEnergy,

    /// Specific enthalpy [J/kg]
    pub h: SpecEnergy,

    /// Specific heat capacity at constant volume [J/(kg·K)]
    pub cv: SpecHeat,

    /// Specific heat capacity at constant pressure [J/(kg·K)]
    pub cp: SpecHeat,

    /// Grüneisen coefficient plus one, Γ (dimensionless)
    pub gamma: f64,

    /// Speed of sound [m/s]
    pub c: Velocity,
}

impl ThermoPropertyPack {
    /// Build a pack from raw SI values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_si(
        p: f64,
        t: f64,
        rho: f64,
        e: f64,
        h: f64,
        cv: f64,
        cp: f64,
        gamma: f64,
        c: f64,
    ) -> Self {
        Self {
            p: pa(p),
            t: k(t),
            rho: kg_m3(rho),
            e: j_per_kg(e),
            h: j_per_kg(h),
            cv: j_per_kg_k(cv),
            cp: j_per_kg_k(cp),
            gamma,
            c: mps(c),
        }
    }

    /// Ratio of specific heats.
    pub fn cp_by_cv(&self) -> f64 {
        self.cp.value / self.cv.value
    }

    /// Return a summary string of all contained properties (for debugging).
    pub fn summary(&self) -> String {
        format!(
            "Pack(P={:.0}Pa,T={:.1}K,ρ={:.3}kg/m³,e={:.1}J/kg,h={:.1}J/kg,cv={:.1},cp={:.1}J/kg·K,Γ={:.3},c={:.0}m/s)",
            self.p.value,
            self.t.value,
            self.rho.value,
            self.e.value,
            self.h.value,
            self.cv.value,
            self.cp.value,
            self.gamma,
            self.c.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_values() {
        let pack = ThermoPropertyPack::from_si(1.0e5, 300.0, 1.2, 2.1e5, 2.9e5, 718.0, 1005.0, 1.4, 347.0);
        let s = pack.summary();
        assert!(s.contains("P=100000Pa"));
        assert!(s.contains("T=300.0K"));
        assert!((pack.cp_by_cv() - 1005.0 / 718.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_si_values() {
        let pack = ThermoPropertyPack::from_si(1.0e5, 300.0, 1.2, 2.1e5, 2.9e5, 718.0, 1005.0, 1.4, 347.0);
        let json = serde_json::to_value(&pack).unwrap();
        assert_eq!(json["p"], 1.0e5);
        assert_eq!(json["c"], 347.0);
        let back: ThermoPropertyPack = serde_json::from_value(json).unwrap();
        assert_eq!(back.t.value, 300.0);
    }
}
