//! The multi-stage integration contract.

use crate::error::SimResult;

/// Time information handed to each stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTime {
    /// Time at the end of the step [s].
    pub t: f64,
    /// Step size [s].
    pub dt: f64,
}

/// A system advanced by an explicit multi-stage scheme.
///
/// Per step the driver calls, for every stage i: `update()` then
/// `solve(time, i, aᵢ, bᵢ)`. `set_ode_fields` runs once before the first step
/// and `clear_ode_fields` once after the last (also on failure).
pub trait IntegrationSystem {
    /// Derive primitive variables from conserved ones.
    fn decode(&mut self) -> SimResult<()>;

    /// Derive conserved variables from primitive ones.
    fn encode(&mut self);

    /// Recompute fluxes for the current state.
    fn update(&mut self) -> SimResult<()>;

    /// Apply stage `stepi` with coefficients `ai` (len `stepi`) and `bi`
    /// (len `stepi + 1`).
    fn solve(&mut self, time: &StepTime, stepi: usize, ai: &[f64], bi: &[f64]) -> SimResult<()>;

    /// Allocate storage for the flagged stages.
    fn set_ode_fields(
        &mut self,
        n_steps: usize,
        store_fields: &[bool],
        store_deltas: &[bool],
    ) -> SimResult<()>;

    /// Release all stage storage. Safe to call repeatedly.
    fn clear_ode_fields(&mut self);

    /// Largest stable step for the given Courant number, if the system knows one.
    fn stable_dt(&self, _courant: f64) -> Option<f64> {
        None
    }
}
