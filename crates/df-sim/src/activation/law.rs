use df_thermo::LookupTable1D;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Reaction-progress rate laws, dλ/dt = f(λ, p, T).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivationLaw {
    /// No kinetics; only detonation points change λ.
    #[default]
    None,
    /// Constant rate k [1/s].
    Linear { rate: f64 },
    /// G (1 − λ)^a p^b above `p_min`.
    PressureBased {
        coefficient: f64,
        lambda_exponent: f64,
        pressure_exponent: f64,
        #[serde(default)]
        p_min: f64,
    },
    /// A (1 − λ)^a exp(−Ta / T) above `t_min`.
    Arrhenius {
        pre_exponential: f64,
        activation_temperature: f64,
        lambda_exponent: f64,
        #[serde(default)]
        t_min: f64,
    },
    /// (1 − λ)^a · table(p).
    Tabulated {
        table: LookupTable1D,
        lambda_exponent: f64,
    },
}

fn remaining(lambda: f64, exponent: f64) -> f64 {
    (1.0 - lambda).max(0.0).powf(exponent)
}

impl ActivationLaw {
    pub fn name(&self) -> &'static str {
        match self {
            ActivationLaw::None => "none",
            ActivationLaw::Linear { .. } => "linear",
            ActivationLaw::PressureBased { .. } => "pressureBased",
            ActivationLaw::Arrhenius { .. } => "Arrhenius",
            ActivationLaw::Tabulated { .. } => "tabulated",
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let ok = match self {
            ActivationLaw::None => true,
            ActivationLaw::Linear { rate } => rate.is_finite() && *rate >= 0.0,
            ActivationLaw::PressureBased {
                coefficient,
                lambda_exponent,
                pressure_exponent,
                p_min,
            } => {
                coefficient.is_finite()
                    && *coefficient >= 0.0
                    && lambda_exponent.is_finite()
                    && *lambda_exponent >= 0.0
                    && pressure_exponent.is_finite()
                    && p_min.is_finite()
            }
            ActivationLaw::Arrhenius {
                pre_exponential,
                activation_temperature,
                lambda_exponent,
                t_min,
            } => {
                pre_exponential.is_finite()
                    && *pre_exponential >= 0.0
                    && activation_temperature.is_finite()
                    && *activation_temperature >= 0.0
                    && lambda_exponent.is_finite()
                    && *lambda_exponent >= 0.0
                    && t_min.is_finite()
            }
            ActivationLaw::Tabulated {
                lambda_exponent, ..
            } => lambda_exponent.is_finite() && *lambda_exponent >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(SimError::Config {
                what: "activation law coefficients must be finite and non-negative",
            })
        }
    }

    /// True when λ can only change through detonation points.
    pub fn needs_detonation_points(&self) -> bool {
        matches!(self, ActivationLaw::None)
    }

    /// Reaction rate dλ/dt for one cell.
    pub fn rate(&self, lambda: f64, p: f64, t: f64) -> f64 {
        match self {
            ActivationLaw::None => 0.0,
            ActivationLaw::Linear { rate } => *rate,
            ActivationLaw::PressureBased {
                coefficient,
                lambda_exponent,
                pressure_exponent,
                p_min,
            } => {
                if p > *p_min && p > 0.0 {
                    coefficient * remaining(lambda, *lambda_exponent) * p.powf(*pressure_exponent)
                } else {
                    0.0
                }
            }
            ActivationLaw::Arrhenius {
                pre_exponential,
                activation_temperature,
                lambda_exponent,
                t_min,
            } => {
                if t > *t_min && t > 0.0 {
                    pre_exponential
                        * remaining(lambda, *lambda_exponent)
                        * (-activation_temperature / t).exp()
                } else {
                    0.0
                }
            }
            ActivationLaw::Tabulated {
                table,
                lambda_exponent,
            } => remaining(lambda, *lambda_exponent) * table.lookup(p),
        }
    }
}
