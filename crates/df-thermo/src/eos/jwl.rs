use serde::{Deserialize, Serialize};

use crate::error::{ThermoError, ThermoResult};

/// Jones–Wilkins–Lee coefficients.
///
/// p = A(1 − ω/(R₁V))e^{−R₁V} + B(1 − ω/(R₂V))e^{−R₂V} + ωρe, with V = ρ₀/ρ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwlCoeffs {
    pub a: f64,
    pub b: f64,
    pub r1: f64,
    pub r2: f64,
    pub omega: f64,
    pub rho0: f64,
}

impl JwlCoeffs {
    pub(crate) fn validate(&self) -> ThermoResult<()> {
        let all = [self.a, self.b, self.r1, self.r2, self.omega, self.rho0];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ThermoError::InvalidArg {
                what: "JWL coefficients must be finite",
            });
        }
        if self.r1 <= 0.0 || self.r2 <= 0.0 || self.omega <= 0.0 || self.rho0 <= 0.0 {
            return Err(ThermoError::InvalidArg {
                what: "JWL r1, r2, omega and rho0 must be positive",
            });
        }
        Ok(())
    }

    fn terms(&self) -> [(f64, f64); 2] {
        [(self.a, self.r1), (self.b, self.r2)]
    }

    pub(crate) fn gamma(&self) -> f64 {
        self.omega + 1.0
    }

    pub(crate) fn pi(&self, rho: f64) -> f64 {
        let v = self.rho0 / rho;
        -self
            .terms()
            .iter()
            .map(|&(a, r)| a * (1.0 - self.omega / (r * v)) * (-r * v).exp())
            .sum::<f64>()
    }

    pub(crate) fn dpi_drho(&self, rho: f64) -> f64 {
        let v = self.rho0 / rho;
        let w = self.omega;
        // dV/dρ = −V/ρ and Π carries a leading minus sign
        self.terms()
            .iter()
            .map(|&(a, r)| a * (-r * v).exp() * (w / (r * v * v) - r + w / v))
            .sum::<f64>()
            * v
            / rho
    }

    pub(crate) fn e_departure(&self, rho: f64) -> f64 {
        let v = self.rho0 / rho;
        self.terms()
            .iter()
            .map(|&(a, r)| a / (self.rho0 * r) * (-r * v).exp())
            .sum()
    }

    pub(crate) fn de_departure_drho(&self, rho: f64) -> f64 {
        let v = self.rho0 / rho;
        self.terms()
            .iter()
            .map(|&(a, r)| a * (-r * v).exp() / (rho * rho))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eos::EquationOfState;

    fn tnt() -> JwlCoeffs {
        JwlCoeffs {
            a: 3.712e11,
            b: 3.231e9,
            r1: 4.15,
            r2: 0.95,
            omega: 0.30,
            rho0: 1630.0,
        }
    }

    #[test]
    fn pressure_matches_textbook_form() {
        let c = tnt();
        let eos = EquationOfState::Jwl(c.clone());
        let (rho, e) = (1800.0, 4.0e6);
        let v = c.rho0 / rho;
        let expected = c.a * (1.0 - c.omega / (c.r1 * v)) * (-c.r1 * v).exp()
            + c.b * (1.0 - c.omega / (c.r2 * v)) * (-c.r2 * v).exp()
            + c.omega * rho * e;
        let p = eos.pressure(rho, e);
        assert!((p - expected).abs() <= 1e-9 * expected.abs());
    }

    #[test]
    fn analytic_pi_derivative_matches_central_difference() {
        let c = tnt();
        for rho in [900.0, 1630.0, 2200.0] {
            let h = 1e-5 * rho;
            let fd = (c.pi(rho + h) - c.pi(rho - h)) / (2.0 * h);
            let an = c.dpi_drho(rho);
            assert!((an - fd).abs() <= 1e-6 * fd.abs() + 1e-3, "rho={rho} an={an} fd={fd}");
        }
    }

    #[test]
    fn energy_departure_derivative_matches_central_difference() {
        let c = tnt();
        let rho = 1700.0;
        let h = 1e-5 * rho;
        let fd = (c.e_departure(rho + h) - c.e_departure(rho - h)) / (2.0 * h);
        let an = c.de_departure_drho(rho);
        assert!((an - fd).abs() <= 1e-6 * fd.abs());
    }
}
