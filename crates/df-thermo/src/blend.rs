//! Progress-variable blending of an unreacted and a reacted material.

use serde::{Deserialize, Serialize};

use crate::eos::Departure;
use crate::error::{ThermoError, ThermoResult};
use crate::material::Material;
use crate::pack::ThermoPropertyPack;

/// x·qr + (1 − x)·qu
#[inline]
pub fn blend(x: f64, qr: f64, qu: f64) -> f64 {
    x * qr + (1.0 - x) * qu
}

/// x·qr² + (1 − x)·qu²
#[inline]
pub fn blend_sqr(x: f64, qr: f64, qu: f64) -> f64 {
    x * qr * qr + (1.0 - x) * qu * qu
}

/// Blends quantities that may fail, evaluating only the endpoints that carry weight.
fn blend_with<R, U>(x: f64, reacted: R, unreacted: U) -> ThermoResult<f64>
where
    R: FnOnce() -> ThermoResult<f64>,
    U: FnOnce() -> ThermoResult<f64>,
{
    if x <= 0.0 {
        unreacted()
    } else if x >= 1.0 {
        reacted()
    } else {
        Ok(blend(x, reacted()?, unreacted()?))
    }
}

/// Closure interpolating two materials by the blend weight x ∈ [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedThermo {
    pub unreacted: Material,
    pub reacted: Material,
}

impl BlendedThermo {
    pub fn new(unreacted: Material, reacted: Material) -> Self {
        Self {
            unreacted,
            reacted,
        }
    }

    pub fn validate(&self) -> ThermoResult<()> {
        self.unreacted.validate()?;
        self.reacted.validate()
    }

    pub fn molecular_weight(&self, x: f64) -> f64 {
        blend(x, self.reacted.molecular_weight, self.unreacted.molecular_weight)
    }

    pub fn pressure(&self, rho: f64, e: f64, x: f64) -> f64 {
        blend(x, self.reacted.pressure(rho, e), self.unreacted.pressure(rho, e))
    }

    pub fn gamma(&self, rho: f64, e: f64, x: f64) -> f64 {
        blend(x, self.reacted.gamma(rho, e), self.unreacted.gamma(rho, e))
    }

    pub fn pi(&self, rho: f64, e: f64, x: f64) -> f64 {
        blend(x, self.reacted.pi(rho, e), self.unreacted.pi(rho, e))
    }

    pub fn dp_drho(&self, rho: f64, e: f64, x: f64) -> f64 {
        blend(x, self.reacted.dp_drho(rho, e), self.unreacted.dp_drho(rho, e))
    }

    pub fn dp_de(&self, rho: f64, e: f64, x: f64) -> f64 {
        blend(x, self.reacted.dp_de(rho, e), self.unreacted.dp_de(rho, e))
    }

    /// Blended energy departure; a placeholder if either side is one.
    pub fn e_departure(&self, rho: f64, e: f64, x: f64) -> Departure {
        let r = self.reacted.e_departure(rho, e);
        let u = self.unreacted.e_departure(rho, e);
        let v = blend(x, r.value(), u.value());
        if r.is_supported() && u.is_supported() {
            Departure::Exact(v)
        } else {
            Departure::Placeholder(v)
        }
    }

    /// x·c_r² + (1 − x)·c_u² from the unclamped material c².
    pub fn c_sqr(&self, rho: f64, e: f64, x: f64) -> f64 {
        blend(x, self.reacted.c_sqr(rho, e), self.unreacted.c_sqr(rho, e))
    }

    pub fn speed_of_sound(&self, rho: f64, e: f64, x: f64) -> f64 {
        self.c_sqr(rho, e, x).max(0.0).sqrt()
    }

    /// Each material is inverted on its own before the temperatures are blended.
    pub fn temperature(&self, rho: f64, e: f64, x: f64, guess: f64) -> ThermoResult<f64> {
        blend_with(
            x,
            || self.reacted.temperature(rho, e, guess),
            || self.unreacted.temperature(rho, e, guess),
        )
    }

    /// Internal energy at (ρ, T); each material is evaluated before blending.
    pub fn energy(&self, rho: f64, t: f64, x: f64) -> ThermoResult<f64> {
        blend_with(
            x,
            || self.reacted.energy(rho, t),
            || self.unreacted.energy(rho, t),
        )
    }

    pub fn cv(&self, rho: f64, e: f64, t: f64, x: f64) -> f64 {
        blend(x, self.reacted.cv(rho, e, t), self.unreacted.cv(rho, e, t))
    }

    pub fn cp(&self, rho: f64, e: f64, t: f64, x: f64) -> f64 {
        blend(x, self.reacted.cp(rho, e, t), self.unreacted.cp(rho, e, t))
    }

    pub fn cp_by_cv(&self, rho: f64, e: f64, t: f64, x: f64) -> f64 {
        blend(
            x,
            self.reacted.cp_by_cv(rho, e, t),
            self.unreacted.cp_by_cv(rho, e, t),
        )
    }

    pub fn h(&self, rho: f64, e: f64, x: f64) -> f64 {
        blend(x, self.reacted.h(rho, e), self.unreacted.h(rho, e))
    }

    pub fn property_pack(
        &self,
        rho: f64,
        e: f64,
        x: f64,
        guess: f64,
    ) -> ThermoResult<ThermoPropertyPack> {
        let t = self.temperature(rho, e, x, guess)?;
        Ok(ThermoPropertyPack::from_si(
            self.pressure(rho, e, x),
            t,
            rho,
            e,
            self.h(rho, e, x),
            self.cv(rho, e, t, x),
            self.cp(rho, e, t, x),
            self.gamma(rho, e, x),
            self.speed_of_sound(rho, e, x),
        ))
    }
}

const ENERGY_MAX_ITER: usize = 50;
const ENERGY_REL_TOL: f64 = 1e-10;

/// Thermodynamic model of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PhaseThermo {
    /// Inert phase; the blend weight is ignored.
    Single(Material),
    /// Reacting phase blended by x = λ^m.
    Detonating(BlendedThermo),
}

impl PhaseThermo {
    pub fn validate(&self) -> ThermoResult<()> {
        match self {
            PhaseThermo::Single(m) => m.validate(),
            PhaseThermo::Detonating(b) => b.validate(),
        }
    }

    pub fn is_detonating(&self) -> bool {
        matches!(self, PhaseThermo::Detonating(_))
    }

    pub fn name(&self) -> &str {
        match self {
            PhaseThermo::Single(m) => &m.name,
            PhaseThermo::Detonating(b) => &b.unreacted.name,
        }
    }

    pub fn molecular_weight(&self, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.molecular_weight,
            PhaseThermo::Detonating(b) => b.molecular_weight(x),
        }
    }

    pub fn pressure(&self, rho: f64, e: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.pressure(rho, e),
            PhaseThermo::Detonating(b) => b.pressure(rho, e, x),
        }
    }

    pub fn gamma(&self, rho: f64, e: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.gamma(rho, e),
            PhaseThermo::Detonating(b) => b.gamma(rho, e, x),
        }
    }

    pub fn pi(&self, rho: f64, e: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.pi(rho, e),
            PhaseThermo::Detonating(b) => b.pi(rho, e, x),
        }
    }

    pub fn dp_drho(&self, rho: f64, e: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.dp_drho(rho, e),
            PhaseThermo::Detonating(b) => b.dp_drho(rho, e, x),
        }
    }

    pub fn dp_de(&self, rho: f64, e: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.dp_de(rho, e),
            PhaseThermo::Detonating(b) => b.dp_de(rho, e, x),
        }
    }

    pub fn e_departure(&self, rho: f64, e: f64, x: f64) -> Departure {
        match self {
            PhaseThermo::Single(m) => m.e_departure(rho, e),
            PhaseThermo::Detonating(b) => b.e_departure(rho, e, x),
        }
    }

    pub fn c_sqr(&self, rho: f64, e: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.c_sqr(rho, e),
            PhaseThermo::Detonating(b) => b.c_sqr(rho, e, x),
        }
    }

    pub fn speed_of_sound(&self, rho: f64, e: f64, x: f64) -> f64 {
        self.c_sqr(rho, e, x).max(0.0).sqrt()
    }

    pub fn temperature(&self, rho: f64, e: f64, x: f64, guess: f64) -> ThermoResult<f64> {
        match self {
            PhaseThermo::Single(m) => m.temperature(rho, e, guess),
            PhaseThermo::Detonating(b) => b.temperature(rho, e, x, guess),
        }
    }

    pub fn energy(&self, rho: f64, t: f64, x: f64) -> ThermoResult<f64> {
        match self {
            PhaseThermo::Single(m) => m.energy(rho, t),
            PhaseThermo::Detonating(b) => b.energy(rho, t, x),
        }
    }

    pub fn cv(&self, rho: f64, e: f64, t: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.cv(rho, e, t),
            PhaseThermo::Detonating(b) => b.cv(rho, e, t, x),
        }
    }

    pub fn cp(&self, rho: f64, e: f64, t: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.cp(rho, e, t),
            PhaseThermo::Detonating(b) => b.cp(rho, e, t, x),
        }
    }

    pub fn cp_by_cv(&self, rho: f64, e: f64, t: f64, x: f64) -> f64 {
        match self {
            PhaseThermo::Single(m) => m.cp_by_cv(rho, e, t),
            PhaseThermo::Detonating(b) => b.cp_by_cv(rho, e, t, x),
        }
    }

    /// Specific internal energy giving pressure `p` at density `rho`.
    ///
    /// Starts from the frozen-Γ estimate e = (p + Π)/((Γ − 1)ρ) and refines
    /// with Newton steps on p(ρ, e).
    pub fn energy_for_pressure(&self, rho: f64, p: f64, x: f64) -> ThermoResult<f64> {
        if !rho.is_finite() || rho <= 0.0 || !p.is_finite() {
            return Err(ThermoError::NonPhysical {
                what: "density or pressure for energy inversion",
            });
        }
        let frozen = |e: f64| (p + self.pi(rho, e, x)) / ((self.gamma(rho, e, x) - 1.0) * rho);
        let mut e = frozen(frozen(0.0));
        for _ in 0..ENERGY_MAX_ITER {
            let residual = self.pressure(rho, e, x) - p;
            if residual.abs() <= ENERGY_REL_TOL * p.abs().max(1.0) {
                return Ok(e);
            }
            let slope = self.dp_de(rho, e, x);
            if !slope.is_finite() || slope.abs() < f64::EPSILON {
                break;
            }
            e -= residual / slope;
        }
        Err(ThermoError::ConvergenceFailed {
            what: "energy from pressure",
        })
    }

    pub fn property_pack(
        &self,
        rho: f64,
        e: f64,
        x: f64,
        guess: f64,
    ) -> ThermoResult<ThermoPropertyPack> {
        match self {
            PhaseThermo::Single(m) => {
                let t = m.temperature(rho, e, guess)?;
                Ok(ThermoPropertyPack::from_si(
                    m.pressure(rho, e),
                    t,
                    rho,
                    e,
                    m.h(rho, e),
                    m.cv(rho, e, t),
                    m.cp(rho, e, t),
                    m.gamma(rho, e),
                    m.speed_of_sound(rho, e),
                ))
            }
            PhaseThermo::Detonating(b) => b.property_pack(rho, e, x, guess),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caloric::CaloricModel;
    use crate::eos::EquationOfState;

    fn gas(gamma: f64, cv: f64) -> Material {
        Material::new(
            "gas",
            28.0,
            EquationOfState::IdealGas { gamma },
            CaloricModel::ConstantCv { cv, e_ref: 0.0 },
        )
        .unwrap()
    }

    #[test]
    fn blend_endpoints_are_exact() {
        assert_eq!(blend(0.0, 3.0, 7.0), 7.0);
        assert_eq!(blend(1.0, 3.0, 7.0), 3.0);
        assert_eq!(blend_sqr(1.0, 3.0, 7.0), 9.0);
        assert_eq!(blend_sqr(0.0, 3.0, 7.0), 49.0);
    }

    #[test]
    fn temperature_blends_after_inversion() {
        let b = BlendedThermo::new(gas(1.4, 700.0), gas(1.3, 1400.0));
        let e = 1.0e6;
        let tu = b.unreacted.temperature(1.0, e, 300.0).unwrap();
        let tr = b.reacted.temperature(1.0, e, 300.0).unwrap();
        let t = b.temperature(1.0, e, 0.5, 300.0).unwrap();
        assert!((t - 0.5 * (tu + tr)).abs() < 1e-9);
    }

    #[test]
    fn energy_for_pressure_inverts_pressure() {
        let p = PhaseThermo::Detonating(BlendedThermo::new(gas(1.4, 700.0), gas(1.25, 900.0)));
        let e = p.energy_for_pressure(1.1, 2.0e5, 0.4).unwrap();
        assert!((p.pressure(1.1, e, 0.4) - 2.0e5).abs() < 1e-4);
    }

    #[test]
    fn single_phase_ignores_weight() {
        let p = PhaseThermo::Single(gas(1.4, 718.0));
        assert_eq!(p.pressure(1.2, 2.0e5, 0.0), p.pressure(1.2, 2.0e5, 0.7));
        assert!(!p.is_detonating());
    }
}
