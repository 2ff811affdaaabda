//! A single material: equation of state plus caloric model.

use df_core::constants::R_UNIVERSAL;
use serde::{Deserialize, Serialize};

use crate::caloric::CaloricModel;
use crate::eos::{Departure, EquationOfState};
use crate::error::{ThermoError, ThermoResult};

/// Named material with molecular weight [kg/kmol].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub molecular_weight: f64,
    pub eos: EquationOfState,
    pub caloric: CaloricModel,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        molecular_weight: f64,
        eos: EquationOfState,
        caloric: CaloricModel,
    ) -> ThermoResult<Self> {
        let material = Self {
            name: name.into(),
            molecular_weight,
            eos,
            caloric,
        };
        material.validate()?;
        Ok(material)
    }

    pub fn validate(&self) -> ThermoResult<()> {
        if !self.molecular_weight.is_finite() || self.molecular_weight <= 0.0 {
            return Err(ThermoError::InvalidArg {
                what: "molecular weight must be positive",
            });
        }
        self.eos.validate()?;
        self.caloric.validate()
    }

    /// Specific gas constant [J/(kg·K)].
    pub fn r(&self) -> f64 {
        R_UNIVERSAL / self.molecular_weight
    }

    pub fn gamma(&self, rho: f64, e: f64) -> f64 {
        self.eos.gamma(rho, e)
    }

    pub fn pi(&self, rho: f64, e: f64) -> f64 {
        self.eos.pi(rho, e)
    }

    pub fn pressure(&self, rho: f64, e: f64) -> f64 {
        self.eos.pressure(rho, e)
    }

    pub fn dp_drho(&self, rho: f64, e: f64) -> f64 {
        self.eos.dp_drho(rho, e)
    }

    pub fn dp_de(&self, rho: f64, e: f64) -> f64 {
        self.eos.dp_de(rho, e)
    }

    pub fn c_sqr(&self, rho: f64, e: f64) -> f64 {
        self.eos.c_sqr(rho, e)
    }

    pub fn speed_of_sound(&self, rho: f64, e: f64) -> f64 {
        self.c_sqr(rho, e).max(0.0).sqrt()
    }

    pub fn e_departure(&self, rho: f64, e: f64) -> Departure {
        self.eos.e_departure(rho, e)
    }

    /// Temperature from (ρ, e): solves es(T) = e − E(ρ, e).
    pub fn temperature(&self, rho: f64, e: f64, guess: f64) -> ThermoResult<f64> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ThermoError::NonPhysical { what: "density" });
        }
        let es = e - self.e_departure(rho, e).value();
        self.caloric.temperature(es, guess)
    }

    /// Internal energy at (ρ, T): es(T) + E(ρ).
    pub fn energy(&self, rho: f64, t: f64) -> ThermoResult<f64> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ThermoError::NonPhysical { what: "density" });
        }
        if !t.is_finite() || t <= 0.0 {
            return Err(ThermoError::NonPhysical { what: "temperature" });
        }
        let es = self.caloric.es(t);
        Ok(es + self.e_departure(rho, es).value())
    }

    pub fn cv(&self, rho: f64, e: f64, t: f64) -> f64 {
        self.caloric.cv(t) + self.eos.cv_departure(rho, e).value()
    }

    pub fn cp_minus_cv(&self, rho: f64, e: f64, t: f64) -> Departure {
        self.eos.cp_minus_cv(rho, e, t, self.caloric.cv(t), self.r())
    }

    pub fn cp(&self, rho: f64, e: f64, t: f64) -> f64 {
        self.caloric.cv(t)
            + self.cp_minus_cv(rho, e, t).value()
            + self.eos.cp_departure(rho, e).value()
    }

    pub fn cp_by_cv(&self, rho: f64, e: f64, t: f64) -> f64 {
        self.cp(rho, e, t) / self.cv(rho, e, t)
    }

    /// Specific enthalpy h = e + p/ρ + H(ρ, e).
    pub fn h(&self, rho: f64, e: f64) -> f64 {
        e + self.pressure(rho, e) / rho + self.eos.h_departure(rho, e).value()
    }

    /// Specific entropy relative to standard conditions.
    pub fn s(&self, rho: f64, e: f64, t: f64) -> f64 {
        let r = self.cp_minus_cv(rho, e, t).value();
        let p = self.pressure(rho, e);
        self.caloric.entropy(t, r) + self.eos.s_departure(p, rho, t, self.r()).value()
    }

    pub fn has_closed_form_calorics(&self) -> bool {
        self.eos.has_closed_form_calorics()
    }
}
