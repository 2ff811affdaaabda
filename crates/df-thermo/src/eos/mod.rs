//! Mie–Grüneisen style equations of state.
//!
//! Every law is written as `p = (Γ − 1)ρe − Π(ρ, e)`. Closures only need Γ, Π
//! and their analytic derivatives; pressure, its derivatives and the sound
//! speed follow from those.

mod doan_nickel;
mod jwl;

pub use doan_nickel::DoanNickelCoeffs;
pub use jwl::JwlCoeffs;

use df_core::SMALL;
use df_core::constants::P_STD;
use serde::{Deserialize, Serialize};

use crate::error::{ThermoError, ThermoResult};

/// A departure-function value, flagged when the law has no closed form for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Departure {
    /// Exact value for this law.
    Exact(f64),
    /// Stand-in value; the law does not define this quantity.
    Placeholder(f64),
}

impl Departure {
    pub fn value(self) -> f64 {
        match self {
            Departure::Exact(v) | Departure::Placeholder(v) => v,
        }
    }

    pub fn is_supported(self) -> bool {
        matches!(self, Departure::Exact(_))
    }
}

/// Closed family of equations of state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EquationOfState {
    /// p = (γ − 1)ρe
    IdealGas { gamma: f64 },
    /// p = (γ − 1)ρe − γa
    StiffenedGas { gamma: f64, a: f64 },
    /// Jones–Wilkins–Lee products law.
    Jwl(JwlCoeffs),
    /// Sigmoid Mie–Grüneisen law with energy- and density-dependent Γ.
    DoanNickel(DoanNickelCoeffs),
}

impl EquationOfState {
    /// Check parameters for physical plausibility.
    pub fn validate(&self) -> ThermoResult<()> {
        match self {
            EquationOfState::IdealGas { gamma } => check_gamma(*gamma),
            EquationOfState::StiffenedGas { gamma, a } => {
                check_gamma(*gamma)?;
                if !a.is_finite() || *a < 0.0 {
                    return Err(ThermoError::InvalidArg {
                        what: "stiffened gas a must be finite and non-negative",
                    });
                }
                Ok(())
            }
            EquationOfState::Jwl(c) => c.validate(),
            EquationOfState::DoanNickel(c) => c.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EquationOfState::IdealGas { .. } => "idealGas",
            EquationOfState::StiffenedGas { .. } => "stiffenedGas",
            EquationOfState::Jwl(_) => "JWL",
            EquationOfState::DoanNickel(_) => "DoanNickel",
        }
    }

    /// Grüneisen coefficient plus one, Γ.
    pub fn gamma(&self, rho: f64, e: f64) -> f64 {
        match self {
            EquationOfState::IdealGas { gamma } | EquationOfState::StiffenedGas { gamma, .. } => {
                *gamma
            }
            EquationOfState::Jwl(c) => c.gamma(),
            EquationOfState::DoanNickel(c) => c.gamma(rho, e),
        }
    }

    pub fn dgamma_drho(&self, rho: f64, e: f64) -> f64 {
        match self {
            EquationOfState::DoanNickel(c) => c.eval(rho, e).dgamma_drho,
            _ => 0.0,
        }
    }

    pub fn dgamma_de(&self, rho: f64, e: f64) -> f64 {
        match self {
            EquationOfState::DoanNickel(c) => c.eval(rho, e).dgamma_de,
            _ => 0.0,
        }
    }

    /// Reference pressure term Π.
    pub fn pi(&self, rho: f64, _e: f64) -> f64 {
        match self {
            EquationOfState::IdealGas { .. } | EquationOfState::DoanNickel(_) => 0.0,
            EquationOfState::StiffenedGas { gamma, a } => gamma * a,
            EquationOfState::Jwl(c) => c.pi(rho),
        }
    }

    pub fn dpi_drho(&self, rho: f64, _e: f64) -> f64 {
        match self {
            EquationOfState::Jwl(c) => c.dpi_drho(rho),
            _ => 0.0,
        }
    }

    pub fn dpi_de(&self, _rho: f64, _e: f64) -> f64 {
        0.0
    }

    pub fn pressure(&self, rho: f64, e: f64) -> f64 {
        (self.gamma(rho, e) - 1.0) * rho * e - self.pi(rho, e)
    }

    /// ∂p/∂ρ at constant e.
    pub fn dp_drho(&self, rho: f64, e: f64) -> f64 {
        (self.gamma(rho, e) - 1.0) * e + rho * e * self.dgamma_drho(rho, e)
            - self.dpi_drho(rho, e)
    }

    /// ∂p/∂e at constant ρ.
    pub fn dp_de(&self, rho: f64, e: f64) -> f64 {
        (self.gamma(rho, e) - 1.0) * rho + rho * e * self.dgamma_de(rho, e) - self.dpi_de(rho, e)
    }

    /// Squared speed of sound, c² = ∂p/∂ρ|e + p/ρ² ∂p/∂e|ρ.
    pub fn c_sqr(&self, rho: f64, e: f64) -> f64 {
        let p = self.pressure(rho, e);
        self.dp_drho(rho, e) + p / (rho * rho) * self.dp_de(rho, e)
    }

    /// Energy departure from the caloric reference, E(ρ, e).
    pub fn e_departure(&self, rho: f64, _e: f64) -> Departure {
        match self {
            EquationOfState::IdealGas { .. } => Departure::Exact(0.0),
            EquationOfState::StiffenedGas { a, .. } => Departure::Exact(a / rho),
            EquationOfState::Jwl(c) => Departure::Exact(c.e_departure(rho)),
            EquationOfState::DoanNickel(_) => Departure::Placeholder(0.0),
        }
    }

    /// d(E departure)/dρ at constant temperature.
    fn de_departure_drho(&self, rho: f64) -> f64 {
        match self {
            EquationOfState::StiffenedGas { a, .. } => -a / (rho * rho),
            EquationOfState::Jwl(c) => c.de_departure_drho(rho),
            _ => 0.0,
        }
    }

    pub fn cv_departure(&self, _rho: f64, _e: f64) -> Departure {
        match self {
            EquationOfState::DoanNickel(_) => Departure::Placeholder(0.0),
            _ => Departure::Exact(0.0),
        }
    }

    pub fn cp_departure(&self, _rho: f64, _e: f64) -> Departure {
        match self {
            EquationOfState::DoanNickel(_) => Departure::Placeholder(0.0),
            _ => Departure::Exact(0.0),
        }
    }

    pub fn h_departure(&self, _rho: f64, _e: f64) -> Departure {
        match self {
            EquationOfState::DoanNickel(_) => Departure::Placeholder(0.0),
            _ => Departure::Exact(0.0),
        }
    }

    /// cp − cv given temperature, caloric cv and the specific gas constant.
    ///
    /// Uses T (∂p/∂T)²ρ / (ρ² (∂p/∂ρ)T) with ∂p/∂T|ρ = ∂p/∂e·cv.
    pub fn cp_minus_cv(&self, rho: f64, e: f64, t: f64, cv: f64, r: f64) -> Departure {
        match self {
            EquationOfState::IdealGas { gamma } => Departure::Exact((gamma - 1.0) * cv),
            EquationOfState::DoanNickel(_) => Departure::Placeholder(r),
            _ => {
                let dp_de = self.dp_de(rho, e);
                let dp_drho_t = self.dp_drho(rho, e) + dp_de * self.de_departure_drho(rho);
                let denom = rho * rho * dp_drho_t;
                let value = t * (dp_de * cv).powi(2) / denom;
                if denom.abs() > SMALL && value.is_finite() && value > 0.0 {
                    Departure::Exact(value)
                } else {
                    Departure::Placeholder(r)
                }
            }
        }
    }

    /// Entropy departure at pressure `p`.
    pub fn s_departure(&self, p: f64, _rho: f64, _t: f64, r: f64) -> Departure {
        match self {
            EquationOfState::IdealGas { .. } => Departure::Exact(-r * (p.max(SMALL) / P_STD).ln()),
            EquationOfState::StiffenedGas { a, .. } => {
                Departure::Exact(-r * ((p + a).max(SMALL) / P_STD).ln())
            }
            EquationOfState::Jwl(_) | EquationOfState::DoanNickel(_) => {
                Departure::Placeholder(-r * (p.max(SMALL) / P_STD).ln())
            }
        }
    }

    /// Whether E, Cv, Cp, H and S departures are all exact.
    pub fn has_closed_form_calorics(&self) -> bool {
        !matches!(self, EquationOfState::DoanNickel(_))
    }
}

fn check_gamma(gamma: f64) -> ThermoResult<()> {
    if !gamma.is_finite() || gamma <= 1.0 {
        return Err(ThermoError::InvalidArg {
            what: "gamma must be finite and greater than one",
        });
    }
    Ok(())
}
