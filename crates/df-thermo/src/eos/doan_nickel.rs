use df_core::SMALL;
use serde::{Deserialize, Serialize};

use crate::error::{ThermoError, ThermoResult};

/// Energy scaling into 10¹⁰ erg/g.
const E_SCALE: f64 = 1e-6;
/// Floor on switch widths.
const MIN_WIDTH: f64 = 1e-10;

fn default_exp_max() -> f64 {
    40.0
}

/// Doan–Nickel sigmoid Mie–Grüneisen coefficients.
///
/// Γ = g(e)·(ρ/ρ₀)^A(e) + 1 where three logistic switches blend the low-energy,
/// dissociation and ionisation regimes. Energies are in scaled units
/// (`e · 1e-6`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoanNickelCoeffs {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub g: f64,
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub e1: f64,
    pub e2: f64,
    pub e3: f64,
    pub e1_offset: f64,
    pub e11: f64,
    pub delta_e1: f64,
    pub delta_e1_pow: f64,
    pub e22: f64,
    pub e2_pow: f64,
    pub delta_e2: f64,
    pub delta_e2_pow: f64,
    pub e33: f64,
    pub delta_e3: f64,
    pub rho0: f64,
    #[serde(default = "default_exp_max")]
    pub exp_max: f64,
}

/// Γ and its analytic derivatives at one state.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GammaEval {
    pub gamma: f64,
    pub dgamma_drho: f64,
    pub dgamma_de: f64,
}

/// Logistic switch value and its derivative w.r.t. its argument.
#[derive(Debug, Clone, Copy)]
struct Switch {
    f: f64,
    df: f64,
}

impl DoanNickelCoeffs {
    pub(crate) fn validate(&self) -> ThermoResult<()> {
        if !self.rho0.is_finite() || self.rho0 <= 0.0 {
            return Err(ThermoError::InvalidArg {
                what: "Doan-Nickel rho0 must be positive",
            });
        }
        if [self.e1, self.e2, self.e3].iter().any(|&v| !v.is_finite() || v <= 0.0) {
            return Err(ThermoError::InvalidArg {
                what: "Doan-Nickel E1, E2, E3 must be positive",
            });
        }
        if !self.exp_max.is_finite() || self.exp_max <= 0.0 {
            return Err(ThermoError::InvalidArg {
                what: "Doan-Nickel expMax must be positive",
            });
        }
        Ok(())
    }

    fn switch(&self, z: f64) -> Switch {
        if z >= self.exp_max {
            Switch {
                f: 1.0 / (self.exp_max.exp() + 1.0),
                df: 0.0,
            }
        } else {
            let f = 1.0 / (z.exp() + 1.0);
            Switch { f, df: -f * (1.0 - f) }
        }
    }

    /// exp(−e/Eᵢ) with the argument clamped, and its derivative w.r.t. e.
    fn decay(&self, e: f64, scale: f64) -> (f64, f64) {
        let arg = -e / scale;
        if arg >= self.exp_max {
            (self.exp_max.exp(), 0.0)
        } else {
            let x = arg.exp();
            (x, -x / scale)
        }
    }

    pub(crate) fn gamma(&self, rho: f64, e: f64) -> f64 {
        self.eval(rho, e).gamma
    }

    /// Γ, ∂Γ/∂ρ and ∂Γ/∂e (unscaled e) at (ρ, e).
    pub(crate) fn eval(&self, rho: f64, e_in: f64) -> GammaEval {
        let rho = rho.max(SMALL);
        let e = e_in * E_SCALE;
        let r = rho / self.rho0;
        let ln_r = r.ln();

        // Width r^p with the floor removing its density dependence
        let width = |base: f64, pow: f64| {
            let w = base * r.powf(pow);
            if w > MIN_WIDTH {
                (w, pow * w / rho)
            } else {
                (MIN_WIDTH, 0.0)
            }
        };

        let i1 = self.e1_offset + self.e11 * r.log10();
        let i1_rho = self.e11 / (rho * std::f64::consts::LN_10);
        let (d1, d1_rho) = width(self.delta_e1, self.delta_e1_pow);
        let z1 = (e - i1) / d1;
        let z1_rho = -i1_rho / d1 - z1 * d1_rho / d1;
        let z1_e = 1.0 / d1;

        let i2 = self.e22 * r.powf(self.e2_pow);
        let i2_rho = self.e2_pow * i2 / rho;
        let (d2, d2_rho) = width(self.delta_e2, self.delta_e2_pow);
        let z2 = (i2 - e) / d2;
        let z2_rho = i2_rho / d2 - z2 * d2_rho / d2;
        let z2_e = -1.0 / d2;

        let d3 = self.delta_e3.max(MIN_WIDTH);
        let z3 = (self.e33 - e) / d3;
        let z3_e = -1.0 / d3;

        let s1 = self.switch(z1);
        let s2 = self.switch(z2);
        let s3 = self.switch(z3);
        let (f1, f1_rho, f1_e) = (s1.f, s1.df * z1_rho, s1.df * z1_e);
        let (f2, f2_rho, f2_e) = (s2.f, s2.df * z2_rho, s2.df * z2_e);
        let (f3, f3_e) = (s3.f, s3.df * z3_e);

        let (log_e, log_e_e) = if e > SMALL {
            (e.log10(), 1.0 / (e * std::f64::consts::LN_10))
        } else {
            (SMALL.log10(), 0.0)
        };

        let mix = self.a1 * f1 + self.a2 * (1.0 - f1) * (1.0 - f2);
        let mix_d = |df1: f64, df2: f64| {
            self.a1 * df1 - self.a2 * (df1 * (1.0 - f2) + (1.0 - f1) * df2)
        };
        let exponent = mix * log_e + self.a3 * f2;
        let exponent_rho = mix_d(f1_rho, f2_rho) * log_e + self.a3 * f2_rho;
        let exponent_e = mix_d(f1_e, f2_e) * log_e + mix * log_e_e + self.a3 * f2_e;

        let (x1, x1_e) = self.decay(e, self.e1);
        let (x2, x2_e) = self.decay(e, self.e2);
        let (x3, x3_e) = self.decay(e, self.e3);

        let poly = self.a
            + self.b * x1 * f1
            + self.c * x2 * (1.0 - f1)
            + self.d * x3 * f2
            + self.g * f3;
        let poly_rho = self.b * x1 * f1_rho - self.c * x2 * f1_rho + self.d * x3 * f2_rho;
        let poly_e = self.b * (x1_e * f1 + x1 * f1_e)
            + self.c * (x2_e * (1.0 - f1) - x2 * f1_e)
            + self.d * (x3_e * f2 + x3 * f2_e)
            + self.g * f3_e;

        let r_pow = (exponent * ln_r).exp();
        GammaEval {
            gamma: poly * r_pow + 1.0,
            dgamma_drho: r_pow * (poly_rho + poly * (exponent_rho * ln_r + exponent / rho)),
            dgamma_de: E_SCALE * r_pow * (poly_e + poly * exponent_e * ln_r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Smooth coefficient set for derivative checks; not a calibrated material.
    fn fixture() -> DoanNickelCoeffs {
        DoanNickelCoeffs {
            a: 0.161,
            b: 0.255,
            c: 0.30,
            d: 0.05,
            g: 0.18,
            a1: 0.01,
            a2: 0.04,
            a3: 0.05,
            e1: 4.0,
            e2: 0.5,
            e3: 1.0,
            e1_offset: 3.0,
            e11: 0.1,
            delta_e1: 1.0,
            delta_e1_pow: 0.5,
            e22: 10.0,
            e2_pow: 0.1,
            delta_e2: 2.0,
            delta_e2_pow: 0.3,
            e33: 30.0,
            delta_e3: 5.0,
            rho0: 1.225,
            exp_max: 40.0,
        }
    }

    fn check_rho(c: &DoanNickelCoeffs, rho: f64, e: f64) -> Result<(), String> {
        let h = 1e-6 * rho;
        let fd = (c.gamma(rho + h, e) - c.gamma(rho - h, e)) / (2.0 * h);
        let an = c.eval(rho, e).dgamma_drho;
        let floor = 1e-8 * c.gamma(rho, e) / rho;
        if (an - fd).abs() <= 1e-6 * fd.abs() + floor {
            Ok(())
        } else {
            Err(format!("dGamma/drho rho={rho} e={e} an={an} fd={fd}"))
        }
    }

    fn check_e(c: &DoanNickelCoeffs, rho: f64, e: f64) -> Result<(), String> {
        let h = 1e-6 * e.abs();
        let fd = (c.gamma(rho, e + h) - c.gamma(rho, e - h)) / (2.0 * h);
        let an = c.eval(rho, e).dgamma_de;
        let floor = 1e-8 * c.gamma(rho, e) / e.abs();
        if (an - fd).abs() <= 1e-6 * fd.abs() + floor {
            Ok(())
        } else {
            Err(format!("dGamma/de rho={rho} e={e} an={an} fd={fd}"))
        }
    }

    #[test]
    fn gamma_exceeds_one() {
        let c = fixture();
        for &(rho, e) in &[(1.0, 1.0e6), (1.6, 3.0e6), (2.5, 1.5e7)] {
            assert!(c.gamma(rho, e) > 1.0);
        }
    }

    #[test]
    fn derivatives_match_central_differences() {
        let c = fixture();
        for &(rho, e) in &[(1.0, 1.0e6), (1.6, 3.0e6), (2.5, 1.5e7), (0.9, 6.0e5)] {
            check_rho(&c, rho, e).unwrap();
            check_e(&c, rho, e).unwrap();
        }
    }

    #[test]
    fn clamped_switch_has_zero_derivative() {
        let c = fixture();
        let s = c.switch(c.exp_max + 5.0);
        assert_eq!(s.df, 0.0);
        assert!(s.f > 0.0 && s.f < 1e-15);
    }

    #[test]
    fn floored_width_is_density_independent() {
        let mut c = fixture();
        c.delta_e1 = 0.0;
        let g = c.eval(1.3, 3.0e6);
        assert!(g.gamma.is_finite());
        assert!(g.dgamma_drho.is_finite());
    }

    proptest! {
        #[test]
        fn derivatives_match_across_range(rho in 0.8_f64..3.0, e in 5.0e5_f64..2.0e7) {
            let c = fixture();
            prop_assert!(check_rho(&c, rho, e).is_ok(), "{:?}", check_rho(&c, rho, e));
            prop_assert!(check_e(&c, rho, e).is_ok(), "{:?}", check_e(&c, rho, e));
        }
    }
}
