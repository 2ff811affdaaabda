//! Explicit multi-stage schemes in low-storage (Shu–Osher) form.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Coefficients of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

/// Closed set of time schemes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimeScheme {
    /// Forward Euler.
    Euler,
    /// Explicit trapezoid (Heun).
    Rk2,
    /// Two-stage strong-stability-preserving RK.
    Rk2Ssp,
    /// Three-stage strong-stability-preserving RK.
    #[default]
    Rk3Ssp,
    /// Classical fourth-order RK.
    Rk4,
    /// User tableau: `a[i]` has `i` entries and `b[i]` has `i + 1`.
    Custom { a: Vec<Vec<f64>>, b: Vec<Vec<f64>> },
}

impl TimeScheme {
    pub fn name(&self) -> &'static str {
        match self {
            TimeScheme::Euler => "Euler",
            TimeScheme::Rk2 => "RK2",
            TimeScheme::Rk2Ssp => "RK2-SSP",
            TimeScheme::Rk3Ssp => "RK3-SSP",
            TimeScheme::Rk4 => "RK4",
            TimeScheme::Custom { .. } => "custom",
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        let TimeScheme::Custom { a, b } = self else {
            return Ok(());
        };
        if a.is_empty() || a.len() != b.len() {
            return Err(SimError::Config {
                what: "custom scheme needs matching, non-empty a and b lists",
            });
        }
        for (i, (ai, bi)) in a.iter().zip(b).enumerate() {
            if ai.len() != i || bi.len() != i + 1 {
                return Err(SimError::Config {
                    what: "custom scheme stage i needs i a-coefficients and i+1 b-coefficients",
                });
            }
            if ai.iter().chain(bi).any(|v| !v.is_finite()) {
                return Err(SimError::Config {
                    what: "custom scheme coefficients must be finite",
                });
            }
        }
        Ok(())
    }

    /// Per-stage coefficients.
    pub fn stages(&self) -> Vec<Stage> {
        let table: Vec<(Vec<f64>, Vec<f64>)> = match self {
            TimeScheme::Euler => vec![(vec![], vec![1.0])],
            TimeScheme::Rk2 => vec![(vec![], vec![1.0]), (vec![1.0], vec![0.5, 0.5])],
            TimeScheme::Rk2Ssp => vec![(vec![], vec![1.0]), (vec![0.5], vec![0.0, 0.5])],
            TimeScheme::Rk3Ssp => vec![
                (vec![], vec![1.0]),
                (vec![0.75], vec![0.0, 0.25]),
                (vec![1.0 / 3.0, 0.0], vec![0.0, 0.0, 2.0 / 3.0]),
            ],
            TimeScheme::Rk4 => vec![
                (vec![], vec![0.5]),
                (vec![1.0], vec![0.0, 0.5]),
                (vec![1.0, 0.0], vec![0.0, 0.0, 1.0]),
                (
                    vec![1.0, 0.0, 0.0],
                    vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
                ),
            ],
            TimeScheme::Custom { a, b } => a.iter().cloned().zip(b.iter().cloned()).collect(),
        };
        table.into_iter().map(|(a, b)| Stage { a, b }).collect()
    }

    pub fn n_steps(&self) -> usize {
        self.stages().len()
    }

    /// Which stage values and rates a later stage reads.
    pub fn store_flags(&self) -> (Vec<bool>, Vec<bool>) {
        let stages = self.stages();
        let n = stages.len();
        let mut fields = vec![false; n];
        let mut deltas = vec![false; n];
        for stage in &stages {
            for (k, &a) in stage.a.iter().enumerate() {
                fields[k] |= a != 0.0;
            }
            // the last entry is the stage's own fresh rate
            let previous = stage.b.len().saturating_sub(1);
            for (k, &b) in stage.b[..previous].iter().enumerate() {
                deltas[k] |= b != 0.0;
            }
        }
        (fields, deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tableaux_are_well_formed() {
        for s in [
            TimeScheme::Euler,
            TimeScheme::Rk2,
            TimeScheme::Rk2Ssp,
            TimeScheme::Rk3Ssp,
            TimeScheme::Rk4,
        ] {
            let stages = s.stages();
            for (i, st) in stages.iter().enumerate() {
                assert_eq!(st.a.len(), i, "{}", s.name());
                assert_eq!(st.b.len(), i + 1, "{}", s.name());
            }
            // consistency: a constant rate advances q by exactly dt
            let total: f64 = stages.last().unwrap().b.iter().sum();
            let a_sum: f64 = stages.last().unwrap().a.iter().sum();
            assert!(total > 0.0 && a_sum <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn store_flags_follow_nonzero_coefficients() {
        assert_eq!(TimeScheme::Euler.store_flags(), (vec![false], vec![false]));
        assert_eq!(
            TimeScheme::Rk2.store_flags(),
            (vec![true, false], vec![true, false])
        );
        assert_eq!(
            TimeScheme::Rk2Ssp.store_flags(),
            (vec![true, false], vec![false, false])
        );
        assert_eq!(
            TimeScheme::Rk3Ssp.store_flags(),
            (vec![true, false, false], vec![false, false, false])
        );
        assert_eq!(
            TimeScheme::Rk4.store_flags(),
            (vec![true, false, false, false], vec![true, true, true, false])
        );
    }

    #[test]
    fn custom_validation() {
        let ok = TimeScheme::Custom {
            a: vec![vec![], vec![1.0]],
            b: vec![vec![1.0], vec![0.5, 0.5]],
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.stages(), TimeScheme::Rk2.stages());

        let bad = TimeScheme::Custom {
            a: vec![vec![1.0]],
            b: vec![vec![1.0]],
        };
        assert!(matches!(bad.validate(), Err(SimError::Config { .. })));
    }

    #[test]
    fn scheme_serde_tag() {
        let s: TimeScheme = serde_yaml::from_str("type: Rk4").unwrap();
        assert_eq!(s, TimeScheme::Rk4);
    }
}
