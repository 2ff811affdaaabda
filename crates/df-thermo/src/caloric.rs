//! Caloric (temperature-dependent) part of a material model.
//!
//! Sensible energy is measured from `T_STD`: es(T_STD) = e_ref.

use df_core::constants::T_STD;
use serde::{Deserialize, Serialize};

use crate::error::{ThermoError, ThermoResult};

/// Bracket for the temperature inversion [K].
const T_LOW: f64 = 1.0;
const T_HIGH: f64 = 1.0e5;
const MAX_ITER: usize = 100;
const REL_TOL: f64 = 1e-12;

/// Closed family of caloric models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CaloricModel {
    /// Constant specific heat at constant volume.
    ConstantCv {
        cv: f64,
        #[serde(default)]
        e_ref: f64,
    },
    /// cv(T) = Σ cᵢ Tⁱ.
    CvPolynomial {
        coeffs: Vec<f64>,
        #[serde(default)]
        e_ref: f64,
    },
}

impl CaloricModel {
    pub fn validate(&self) -> ThermoResult<()> {
        match self {
            CaloricModel::ConstantCv { cv, e_ref } => {
                if !cv.is_finite() || *cv <= 0.0 || !e_ref.is_finite() {
                    return Err(ThermoError::InvalidArg {
                        what: "cv must be positive and finite",
                    });
                }
            }
            CaloricModel::CvPolynomial { coeffs, e_ref } => {
                if coeffs.is_empty() || coeffs.iter().any(|c| !c.is_finite()) || !e_ref.is_finite()
                {
                    return Err(ThermoError::InvalidArg {
                        what: "cv polynomial needs finite coefficients",
                    });
                }
                if self.cv(T_STD) <= 0.0 {
                    return Err(ThermoError::InvalidArg {
                        what: "cv polynomial must be positive at standard temperature",
                    });
                }
            }
        }
        Ok(())
    }

    pub fn cv(&self, t: f64) -> f64 {
        match self {
            CaloricModel::ConstantCv { cv, .. } => *cv,
            CaloricModel::CvPolynomial { coeffs, .. } => {
                coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
            }
        }
    }

    /// Sensible internal energy es(T).
    pub fn es(&self, t: f64) -> f64 {
        match self {
            CaloricModel::ConstantCv { cv, e_ref } => e_ref + cv * (t - T_STD),
            CaloricModel::CvPolynomial { coeffs, e_ref } => {
                e_ref
                    + coeffs
                        .iter()
                        .enumerate()
                        .map(|(i, c)| {
                            let n = (i + 1) as i32;
                            c * (t.powi(n) - T_STD.powi(n)) / n as f64
                        })
                        .sum::<f64>()
            }
        }
    }

    /// Caloric entropy relative to `T_STD`, with `r` = cp − cv.
    pub fn entropy(&self, t: f64, r: f64) -> f64 {
        let ln_ratio = (t / T_STD).ln();
        let cv_part = match self {
            CaloricModel::ConstantCv { cv, .. } => cv * ln_ratio,
            CaloricModel::CvPolynomial { coeffs, .. } => coeffs
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    if i == 0 {
                        c * ln_ratio
                    } else {
                        let n = i as i32;
                        c * (t.powi(n) - T_STD.powi(n)) / n as f64
                    }
                })
                .sum(),
        };
        cv_part + r * ln_ratio
    }

    /// Invert es(T) = `es_target`.
    pub fn temperature(&self, es_target: f64, guess: f64) -> ThermoResult<f64> {
        if !es_target.is_finite() {
            return Err(ThermoError::NonPhysical {
                what: "sensible energy",
            });
        }
        match self {
            CaloricModel::ConstantCv { cv, e_ref } => {
                let t = T_STD + (es_target - e_ref) / cv;
                if t > 0.0 {
                    Ok(t)
                } else {
                    Err(ThermoError::NonPhysical {
                        what: "temperature from sensible energy",
                    })
                }
            }
            CaloricModel::CvPolynomial { .. } => self.solve_temperature(es_target, guess),
        }
    }

    /// Newton iteration safeguarded by bisection on [T_LOW, T_HIGH].
    fn solve_temperature(&self, target: f64, guess: f64) -> ThermoResult<f64> {
        let mut lo = T_LOW;
        let mut hi = T_HIGH;
        let r_lo = self.es(lo) - target;
        let r_hi = self.es(hi) - target;
        if r_lo > 0.0 || r_hi < 0.0 {
            return Err(ThermoError::NonPhysical {
                what: "sensible energy outside temperature bracket",
            });
        }

        let mut t = if guess.is_finite() && guess > lo && guess < hi {
            guess
        } else {
            T_STD
        };

        for _ in 0..MAX_ITER {
            let residual = self.es(t) - target;
            if residual > 0.0 {
                hi = t;
            } else {
                lo = t;
            }

            let slope = self.cv(t);
            let mut next = if slope > 0.0 { t - residual / slope } else { f64::NAN };
            if !(next > lo && next < hi) {
                next = 0.5 * (lo + hi);
            }

            if (next - t).abs() <= REL_TOL * t.abs().max(1.0) {
                return Ok(next);
            }
            t = next;
        }

        Err(ThermoError::ConvergenceFailed {
            what: "temperature from sensible energy",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::{Tolerances, nearly_equal};
    use proptest::prelude::*;

    fn poly() -> CaloricModel {
        CaloricModel::CvPolynomial {
            coeffs: vec![600.0, 0.4, 1.0e-4],
            e_ref: 0.0,
        }
    }

    #[test]
    fn constant_cv_inverts_exactly() {
        let c = CaloricModel::ConstantCv {
            cv: 718.0,
            e_ref: 0.0,
        };
        let t = c.temperature(c.es(450.0), 300.0).unwrap();
        assert!(nearly_equal(t, 450.0, Tolerances::default()));
        assert!(c.temperature(-1.0e9, 300.0).is_err());
    }

    #[test]
    fn polynomial_reference_point() {
        let c = poly();
        assert_eq!(c.es(T_STD), 0.0);
        assert!(nearly_equal(c.entropy(T_STD, 287.0), 0.0, Tolerances::default()));
        assert!(nearly_equal(c.cv(T_STD), 600.0 + 0.4 * T_STD + 1.0e-4 * T_STD * T_STD, Tolerances::default()));
    }

    #[test]
    fn polynomial_rejects_unbracketed_energy() {
        let c = poly();
        assert!(c.temperature(c.es(T_HIGH) * 2.0, 300.0).is_err());
    }

    #[test]
    fn validate_checks_sign() {
        let bad = CaloricModel::CvPolynomial {
            coeffs: vec![-10.0],
            e_ref: 0.0,
        };
        assert!(bad.validate().is_err());
        assert!(poly().validate().is_ok());
    }

    proptest! {
        #[test]
        fn polynomial_inversion_round_trips(t in 50.0_f64..8000.0, guess in 10.0_f64..20000.0) {
            let c = poly();
            let back = c.temperature(c.es(t), guess).unwrap();
            let tol = Tolerances { abs: 1e-8, rel: 1e-9 };
            prop_assert!(nearly_equal(back, t, tol));
        }
    }
}
