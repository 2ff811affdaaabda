//! Two-phase compressible system: volume fraction and phase masses.
//!
//! Phase 1 is the reacting phase when an activation model is attached. The
//! mixture closure assumes pressure equilibrium between the phases.

use std::sync::Arc;

use df_core::clip;
use df_mesh::{Mesh, Vector3};
use df_thermo::PhaseThermo;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::activation::{ActivationInputs, ActivationModel};
use crate::error::{SimError, SimResult};
use crate::flux::{CellPrimitives, FaceFluxes, FluxKind, FluxScheme};
use crate::slots::StagedField;
use crate::system::{IntegrationSystem, StepTime};

const T_GUESS: f64 = 300.0;

fn default_alpha_min() -> f64 {
    1e-6
}

fn default_rho_min() -> f64 {
    1e-6
}

/// Numerical floors and flux selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoPhaseSettings {
    #[serde(default = "default_alpha_min")]
    pub alpha_min: f64,
    #[serde(default = "default_rho_min")]
    pub rho_min: f64,
    #[serde(default)]
    pub flux: FluxKind,
}

impl Default for TwoPhaseSettings {
    fn default() -> Self {
        Self {
            alpha_min: default_alpha_min(),
            rho_min: default_rho_min(),
            flux: FluxKind::default(),
        }
    }
}

impl TwoPhaseSettings {
    pub fn validate(&self) -> SimResult<()> {
        if !self.alpha_min.is_finite() || self.alpha_min <= 0.0 || self.alpha_min >= 0.5 {
            return Err(SimError::Config {
                what: "alpha_min must lie in (0, 0.5)",
            });
        }
        if !self.rho_min.is_finite() || self.rho_min <= 0.0 {
            return Err(SimError::Config {
                what: "rho_min must be positive",
            });
        }
        Ok(())
    }
}

/// Initial primitive state, one entry per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoPhaseInit {
    pub alpha: Vec<f64>,
    pub rho1: Vec<f64>,
    pub rho2: Vec<f64>,
    pub velocity: Vec<Vector3<f64>>,
    pub p: Vec<f64>,
}

impl TwoPhaseInit {
    pub fn uniform(
        n_cells: usize,
        alpha: f64,
        rho1: f64,
        rho2: f64,
        velocity: Vector3<f64>,
        p: f64,
    ) -> Self {
        Self {
            alpha: vec![alpha; n_cells],
            rho1: vec![rho1; n_cells],
            rho2: vec![rho2; n_cells],
            velocity: vec![velocity; n_cells],
            p: vec![p; n_cells],
        }
    }

    fn validate(&self, n_cells: usize) -> SimResult<()> {
        let lens = [
            self.alpha.len(),
            self.rho1.len(),
            self.rho2.len(),
            self.velocity.len(),
            self.p.len(),
        ];
        if lens.iter().any(|&l| l != n_cells) {
            return Err(SimError::InvalidArg {
                what: "initial field length differs from cell count",
            });
        }
        if self.alpha.iter().any(|a| !(0.0..=1.0).contains(a)) {
            return Err(SimError::NonPhysical {
                what: "initial volume fraction outside [0, 1]",
            });
        }
        if self
            .rho1
            .iter()
            .chain(&self.rho2)
            .any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(SimError::NonPhysical {
                what: "initial phase density must be positive",
            });
        }
        if self.p.iter().any(|p| !p.is_finite()) {
            return Err(SimError::NonPhysical {
                what: "initial pressure must be finite",
            });
        }
        Ok(())
    }
}

/// Running counts of values clipped by `decode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainDiagnostics {
    pub alpha_clipped: usize,
    pub rho_clipped: usize,
    pub decode_calls: usize,
}

#[derive(Debug, Clone, Copy)]
struct ClosureCell {
    p: f64,
    t: f64,
    t1: f64,
    t2: f64,
    c: f64,
}

/// Volume fraction and phase-mass transport with an equilibrium-pressure closure.
pub struct TwoPhaseSystem {
    mesh: Arc<Mesh>,
    phases: [PhaseThermo; 2],
    settings: TwoPhaseSettings,
    flux: Box<dyn FluxScheme + Send + Sync>,
    activation: Option<ActivationModel>,

    // conserved
    alpha: Vec<f64>,
    alpha_rho1: Vec<f64>,
    alpha_rho2: Vec<f64>,

    // primitive
    rho1: Vec<f64>,
    rho2: Vec<f64>,
    rho: Vec<f64>,
    e: Vec<f64>,
    p: Vec<f64>,
    t: Vec<f64>,
    t1: Vec<f64>,
    t2: Vec<f64>,
    c: Vec<f64>,
    velocity: Vec<Vector3<f64>>,

    fluxes: FaceFluxes,
    staged: [StagedField; 3],
    diagnostics: DomainDiagnostics,
}

impl TwoPhaseSystem {
    pub fn new(
        mesh: Arc<Mesh>,
        phases: [PhaseThermo; 2],
        settings: TwoPhaseSettings,
        init: TwoPhaseInit,
        activation: Option<ActivationModel>,
    ) -> SimResult<Self> {
        settings.validate()?;
        for phase in &phases {
            phase.validate()?;
        }
        if phases[1].is_detonating() {
            return Err(SimError::Config {
                what: "only phase 1 may be detonating",
            });
        }
        let n = mesh.n_cells();
        init.validate(n)?;

        let x: Vec<f64> = match &activation {
            Some(model) => model.lambda_pow_field(),
            None => vec![0.0; n],
        };
        let e1 = (0..n)
            .into_par_iter()
            .map(|i| phases[0].energy_for_pressure(init.rho1[i], init.p[i], x[i]))
            .collect::<Result<Vec<_>, _>>()?;
        let e2 = (0..n)
            .into_par_iter()
            .map(|i| phases[1].energy_for_pressure(init.rho2[i], init.p[i], 0.0))
            .collect::<Result<Vec<_>, _>>()?;
        let e: Vec<f64> = (0..n)
            .map(|i| {
                let m1 = init.alpha[i] * init.rho1[i];
                let m2 = (1.0 - init.alpha[i]) * init.rho2[i];
                (m1 * e1[i] + m2 * e2[i]) / (m1 + m2)
            })
            .collect();

        let mut system = Self {
            flux: settings.flux.build(),
            mesh,
            phases,
            settings,
            activation,
            alpha: init.alpha,
            alpha_rho1: vec![0.0; n],
            alpha_rho2: vec![0.0; n],
            rho1: init.rho1,
            rho2: init.rho2,
            rho: vec![0.0; n],
            e,
            p: init.p,
            t: vec![T_GUESS; n],
            t1: vec![T_GUESS; n],
            t2: vec![T_GUESS; n],
            c: vec![0.0; n],
            velocity: init.velocity,
            fluxes: FaceFluxes::zeros(0),
            staged: [
                StagedField::new("alpha"),
                StagedField::new("alpha_rho1"),
                StagedField::new("alpha_rho2"),
            ],
            diagnostics: DomainDiagnostics::default(),
        };
        system.fluxes = FaceFluxes::zeros(system.mesh.n_faces());
        system.encode();
        system.decode()?;
        system.refresh_closure()?;
        Ok(system)
    }

    /// Replace the flux scheme chosen by the settings.
    pub fn with_flux_scheme(mut self, flux: Box<dyn FluxScheme + Send + Sync>) -> Self {
        self.flux = flux;
        self
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn phases(&self) -> &[PhaseThermo; 2] {
        &self.phases
    }

    pub fn settings(&self) -> &TwoPhaseSettings {
        &self.settings
    }

    pub fn flux_scheme(&self) -> &dyn FluxScheme {
        self.flux.as_ref()
    }

    pub fn activation(&self) -> Option<&ActivationModel> {
        self.activation.as_ref()
    }

    pub fn lambda(&self) -> Option<&[f64]> {
        self.activation.as_ref().map(|a| a.lambda())
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn alpha_rho1(&self) -> &[f64] {
        &self.alpha_rho1
    }

    pub fn alpha_rho2(&self) -> &[f64] {
        &self.alpha_rho2
    }

    pub fn rho1(&self) -> &[f64] {
        &self.rho1
    }

    pub fn rho2(&self) -> &[f64] {
        &self.rho2
    }

    /// Mixture density.
    pub fn rho(&self) -> &[f64] {
        &self.rho
    }

    /// Mixture specific internal energy [J/kg].
    pub fn e(&self) -> &[f64] {
        &self.e
    }

    pub fn p(&self) -> &[f64] {
        &self.p
    }

    /// Mass-weighted mixture temperature [K].
    pub fn t(&self) -> &[f64] {
        &self.t
    }

    pub fn t1(&self) -> &[f64] {
        &self.t1
    }

    pub fn t2(&self) -> &[f64] {
        &self.t2
    }

    /// Mixture speed of sound [m/s].
    pub fn c(&self) -> &[f64] {
        &self.c
    }

    pub fn velocity(&self) -> &[Vector3<f64>] {
        &self.velocity
    }

    pub fn fluxes(&self) -> &FaceFluxes {
        &self.fluxes
    }

    pub fn diagnostics(&self) -> &DomainDiagnostics {
        &self.diagnostics
    }

    pub fn reset_diagnostics(&mut self) {
        self.diagnostics = DomainDiagnostics::default();
    }

    /// Velocity supplied by a momentum solver.
    pub fn set_velocity(&mut self, velocity: Vec<Vector3<f64>>) -> SimResult<()> {
        if velocity.len() != self.mesh.n_cells() {
            return Err(SimError::InvalidArg {
                what: "velocity length differs from cell count",
            });
        }
        self.velocity = velocity;
        Ok(())
    }

    /// Internal energy supplied by an energy solver; refreshes the closure.
    pub fn set_internal_energy(&mut self, e: Vec<f64>) -> SimResult<()> {
        if e.len() != self.mesh.n_cells() {
            return Err(SimError::InvalidArg {
                what: "energy length differs from cell count",
            });
        }
        if e.iter().any(|v| !v.is_finite()) {
            return Err(SimError::NonPhysical {
                what: "internal energy must be finite",
            });
        }
        self.e = e;
        self.refresh_closure()
    }

    /// Mixture internal energy of `cell` with both phases at temperature `t`.
    pub fn energy_at_temperature(&self, cell: usize, t: f64) -> SimResult<f64> {
        let n = self.mesh.n_cells();
        if cell >= n {
            return Err(SimError::InvalidArg {
                what: "cell index out of range",
            });
        }
        let x = self
            .activation
            .as_ref()
            .map_or(0.0, |model| model.lambda_pow(cell));
        let e1 = self.phases[0].energy(self.rho1[cell], t, x)?;
        let e2 = self.phases[1].energy(self.rho2[cell], t, 0.0)?;
        let (m1, m2) = (self.alpha_rho1[cell], self.alpha_rho2[cell]);
        Ok((m1 * e1 + m2 * e2) / (m1 + m2))
    }

    /// Volumetric energy release from reaction [W/m³].
    pub fn e_source(&self) -> Vec<f64> {
        match &self.activation {
            Some(model) => model.e_source(&self.alpha_rho1),
            None => vec![0.0; self.mesh.n_cells()],
        }
    }

    /// Pressure-equilibrium closure: p, phase and mixture temperatures, c.
    fn refresh_closure(&mut self) -> SimResult<()> {
        let n = self.mesh.n_cells();
        let x: Vec<f64> = match &self.activation {
            Some(model) => model.lambda_pow_field(),
            None => vec![0.0; n],
        };
        let rho_min = self.settings.rho_min;
        let [phase1, phase2] = &self.phases;
        let cells = (0..n)
            .into_par_iter()
            .map(|i| {
                let a1 = self.alpha[i];
                let a2 = 1.0 - a1;
                let (r1, r2, e) = (self.rho1[i], self.rho2[i], self.e[i]);
                let pi1 = phase1.pi(r1, e, x[i]);
                let pi2 = phase2.pi(r2, e, 0.0);
                let xi1 = 1.0 / (phase1.gamma(r1, e, x[i]) - 1.0);
                let xi2 = 1.0 / (phase2.gamma(r2, e, 0.0) - 1.0);
                let denom = a1 * xi1 + a2 * xi2;
                if !denom.is_finite() || denom <= 0.0 {
                    return Err(SimError::NonPhysical {
                        what: "mixture Grüneisen weight",
                    });
                }
                let rho = self.rho[i].max(rho_min);
                let p = (rho * e - a1 * pi1 * xi1 - a2 * pi2 * xi2) / denom;
                let e1 = (p + pi1) * xi1 / r1;
                let e2 = (p + pi2) * xi2 / r2;
                let t1 = phase1.temperature(r1, e1, x[i], self.t1[i])?;
                let t2 = phase2.temperature(r2, e2, 0.0, self.t2[i])?;
                let y1 = (self.alpha_rho1[i] / rho).clamp(0.0, 1.0);
                let y2 = 1.0 - y1;
                let c_sqr = (y1 * xi1 * phase1.c_sqr(r1, e1, x[i])
                    + y2 * xi2 * phase2.c_sqr(r2, e2, 0.0))
                    / denom;
                Ok(ClosureCell {
                    p,
                    t: y1 * t1 + y2 * t2,
                    t1,
                    t2,
                    c: c_sqr.max(0.0).sqrt(),
                })
            })
            .collect::<SimResult<Vec<_>>>()?;

        for (i, cell) in cells.into_iter().enumerate() {
            self.p[i] = cell.p;
            self.t[i] = cell.t;
            self.t1[i] = cell.t1;
            self.t2[i] = cell.t2;
            self.c[i] = cell.c;
        }
        Ok(())
    }

    fn set_all_ode_fields(
        &mut self,
        n_steps: usize,
        store_fields: &[bool],
        store_deltas: &[bool],
    ) -> SimResult<()> {
        for field in &mut self.staged {
            field.set_ode_fields(n_steps, store_fields, store_deltas)?;
        }
        if let Some(model) = &mut self.activation {
            model.set_ode_fields(n_steps, store_fields, store_deltas)?;
        }
        Ok(())
    }
}

impl IntegrationSystem for TwoPhaseSystem {
    fn decode(&mut self) -> SimResult<()> {
        let alpha_min = self.settings.alpha_min;
        let rho_min = self.settings.rho_min;
        let decoded: Vec<(f64, f64, f64, bool, usize)> = self
            .alpha
            .par_iter()
            .zip(self.alpha_rho1.par_iter())
            .zip(self.alpha_rho2.par_iter())
            .map(|((&alpha, &ar1), &ar2)| {
                let (clipped, alpha_moved) = clip(alpha, alpha_min, 1.0 - alpha_min);
                let rho1 = ar1 / clipped.max(alpha_min);
                let rho2 = ar2 / (1.0 - clipped).max(alpha_min);
                // NaN compares false and is floored too
                let floor = |r: f64| if r >= rho_min { (r, 0) } else { (rho_min, 1) };
                let (rho1, c1) = floor(rho1);
                let (rho2, c2) = floor(rho2);
                (clipped, rho1, rho2, alpha_moved, c1 + c2)
            })
            .collect();

        let mut alpha_clipped = 0;
        let mut rho_clipped = 0;
        for (i, (alpha, rho1, rho2, a_clip, r_clips)) in decoded.into_iter().enumerate() {
            self.alpha[i] = alpha;
            self.rho1[i] = rho1;
            self.rho2[i] = rho2;
            self.rho[i] = self.alpha_rho1[i] + self.alpha_rho2[i];
            alpha_clipped += usize::from(a_clip);
            rho_clipped += r_clips;
        }

        self.diagnostics.decode_calls += 1;
        self.diagnostics.alpha_clipped += alpha_clipped;
        self.diagnostics.rho_clipped += rho_clipped;
        if alpha_clipped + rho_clipped > 0 {
            tracing::warn!(
                alpha_clipped,
                rho_clipped,
                "clipped out-of-range cells while decoding"
            );
        }
        Ok(())
    }

    fn encode(&mut self) {
        self.alpha_rho1
            .par_iter_mut()
            .zip(self.alpha_rho2.par_iter_mut())
            .enumerate()
            .for_each(|(i, (ar1, ar2))| {
                let a = self.alpha[i];
                *ar1 = a * self.rho1[i];
                *ar2 = (1.0 - a) * self.rho2[i];
            });
    }

    fn update(&mut self) -> SimResult<()> {
        let prims = CellPrimitives {
            alpha: &self.alpha,
            rho1: &self.rho1,
            rho2: &self.rho2,
            velocity: &self.velocity,
            p: &self.p,
            c: &self.c,
        };
        self.flux.face_fluxes(&self.mesh, &prims, &mut self.fluxes)
    }

    fn solve(&mut self, time: &StepTime, stepi: usize, ai: &[f64], bi: &[f64]) -> SimResult<()> {
        if self.fluxes.len() != self.mesh.n_faces() {
            return Err(SimError::InvalidArg {
                what: "face fluxes not computed; call update first",
            });
        }
        tracing::debug!(stage = stepi, t = time.t, dt = time.dt, "two-phase stage");

        let div_phi = self.mesh.divergence(&self.fluxes.phi);
        let div_alpha_phi = self.mesh.divergence(&self.fluxes.alpha_phi);
        let d_alpha: Vec<f64> = (0..self.alpha.len())
            .into_par_iter()
            .map(|i| -(div_alpha_phi[i] - self.alpha[i] * div_phi[i]))
            .collect();
        let d_alpha_rho1: Vec<f64> = self
            .mesh
            .divergence(&self.fluxes.alpha_rho_phi1)
            .into_iter()
            .map(|d| -d)
            .collect();
        let d_alpha_rho2: Vec<f64> = self
            .mesh
            .divergence(&self.fluxes.alpha_rho_phi2)
            .into_iter()
            .map(|d| -d)
            .collect();

        let alpha_rho1_start = self.alpha_rho1.clone();
        let [alpha_field, mass1_field, mass2_field] = &mut self.staged;
        alpha_field.advance(stepi, ai, bi, time.dt, &mut self.alpha, &d_alpha)?;
        mass1_field.advance(stepi, ai, bi, time.dt, &mut self.alpha_rho1, &d_alpha_rho1)?;
        mass2_field.advance(stepi, ai, bi, time.dt, &mut self.alpha_rho2, &d_alpha_rho2)?;

        if let Some(model) = &mut self.activation {
            let inputs = ActivationInputs {
                rho: &self.rho1,
                p: &self.p,
                t: &self.t1,
                alpha_rho: &alpha_rho1_start,
                alpha_rho_new: &self.alpha_rho1,
                alpha_rho_phi: &self.fluxes.alpha_rho_phi1,
            };
            model.solve(time, stepi, ai, bi, &inputs)?;
        }

        self.decode()?;
        self.refresh_closure()
    }

    fn set_ode_fields(
        &mut self,
        n_steps: usize,
        store_fields: &[bool],
        store_deltas: &[bool],
    ) -> SimResult<()> {
        let result = self.set_all_ode_fields(n_steps, store_fields, store_deltas);
        if result.is_err() {
            self.clear_ode_fields();
        }
        result
    }

    fn clear_ode_fields(&mut self) {
        for field in &mut self.staged {
            field.clear_ode_fields();
        }
        if let Some(model) = &mut self.activation {
            model.clear_ode_fields();
        }
    }

    /// courant · min over cells of 2V / Σ (|u·n| + c)·A, summed over the
    /// internal faces of the cell. Boundary faces carry no flux.
    fn stable_dt(&self, courant: f64) -> Option<f64> {
        let mut wave = vec![0.0; self.mesh.n_cells()];
        for face in self.mesh.internal_faces() {
            let Some(nb) = face.neighbour else { continue };
            for cell in [face.owner, nb] {
                let un = self.velocity[cell].dot(&face.normal).abs();
                wave[cell] += (un + self.c[cell]) * face.area;
            }
        }
        let dt = self
            .mesh
            .cells()
            .par_iter()
            .zip(wave.par_iter())
            .map(|(cell, &w)| {
                if w > 0.0 {
                    2.0 * cell.volume / w
                } else {
                    f64::INFINITY
                }
            })
            .reduce(|| f64::INFINITY, f64::min);
        dt.is_finite().then_some(courant * dt)
    }
}
