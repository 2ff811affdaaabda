//! Reaction progress (λ) with detonation-point ignition.
//!
//! λ is advanced with the same stage protocol as the flow fields. After each
//! stage it is limited and ignition is applied; any change this makes is
//! folded back into the stored stage rate so later stages and the energy
//! source stay consistent with the λ actually reached.

mod detonation;
mod law;

pub use detonation::DetonationPoint;
pub use law::ActivationLaw;

use std::sync::Arc;

use df_mesh::{Mesh, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::slots::{StagedField, check_stage};
use crate::system::StepTime;

fn one() -> f64 {
    1.0
}

fn enabled() -> bool {
    true
}

/// Ignition site definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetonationPointDef {
    pub position: [f64; 3],
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub radius: f64,
}

/// Spherical region given an initial λ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaSeed {
    pub center: [f64; 3],
    pub radius: f64,
    pub value: f64,
}

/// Configuration of the activation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationSettings {
    #[serde(default)]
    pub law: ActivationLaw,
    /// Specific detonation energy [J/kg].
    pub e0: f64,
    /// Blend exponent m in x = λ^m.
    #[serde(default = "one")]
    pub lambda_exponent: f64,
    #[serde(default)]
    pub initial_lambda: f64,
    #[serde(default = "enabled")]
    pub limit: bool,
    /// Largest λ increase per step when limiting.
    #[serde(default = "one")]
    pub max_d_lambda: f64,
    /// Transport λ with the reacting phase's mass flux.
    #[serde(default)]
    pub advect: bool,
    #[serde(default)]
    pub detonation_points: Vec<DetonationPointDef>,
    #[serde(default)]
    pub seeds: Vec<LambdaSeed>,
}

impl ActivationSettings {
    pub fn validate(&self) -> SimResult<()> {
        self.law.validate()?;
        if self.law.needs_detonation_points() && self.detonation_points.is_empty() {
            return Err(SimError::Config {
                what: "activation without kinetics needs detonation points",
            });
        }
        if !self.e0.is_finite() {
            return Err(SimError::Config {
                what: "e0 must be finite",
            });
        }
        if !self.lambda_exponent.is_finite() || self.lambda_exponent <= 0.0 {
            return Err(SimError::Config {
                what: "lambda exponent must be positive",
            });
        }
        if !self.max_d_lambda.is_finite() || self.max_d_lambda <= 0.0 {
            return Err(SimError::Config {
                what: "max_d_lambda must be positive",
            });
        }
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.initial_lambda) || self.seeds.iter().any(|s| !in_unit(s.value)) {
            return Err(SimError::Config {
                what: "initial lambda values must lie in [0, 1]",
            });
        }
        Ok(())
    }
}

/// Per-cell inputs of the reacting phase for one stage.
#[derive(Debug, Clone, Copy)]
pub struct ActivationInputs<'a> {
    /// Phase density at stage start.
    pub rho: &'a [f64],
    /// Pressure at stage start.
    pub p: &'a [f64],
    /// Phase temperature at stage start.
    pub t: &'a [f64],
    /// Phase mass αρ at stage start.
    pub alpha_rho: &'a [f64],
    /// Phase mass αρ after this stage's update.
    pub alpha_rho_new: &'a [f64],
    /// Phase mass flux per face.
    pub alpha_rho_phi: &'a [f64],
}

/// Reaction-progress model of the reacting phase.
#[derive(Debug, Clone)]
pub struct ActivationModel {
    mesh: Arc<Mesh>,
    law: ActivationLaw,
    e0: f64,
    lambda_exponent: f64,
    limit: bool,
    max_d_lambda: f64,
    advect: bool,
    rho_min: f64,
    lambda: Vec<f64>,
    lambda_step_start: Vec<f64>,
    ddt_lambda: Vec<f64>,
    points: Vec<DetonationPoint>,
    field: StagedField,
}

impl ActivationModel {
    pub fn new(mesh: Arc<Mesh>, settings: &ActivationSettings, rho_min: f64) -> SimResult<Self> {
        settings.validate()?;
        let n = mesh.n_cells();
        let mut lambda = vec![settings.initial_lambda; n];
        for seed in &settings.seeds {
            let center = Vector3::from(seed.center);
            for cell in mesh.cells_within(&center, seed.radius) {
                lambda[cell] = seed.value;
            }
        }

        let mut points = settings
            .detonation_points
            .iter()
            .map(|d| DetonationPoint::new(&mesh, Vector3::from(d.position), d.delay, d.radius))
            .collect::<SimResult<Vec<_>>>()?;
        for point in &mut points {
            point.update(0.0);
            if point.activated() {
                for &cell in point.cells() {
                    lambda[cell] = 1.0;
                }
            }
        }

        Ok(Self {
            mesh,
            law: settings.law.clone(),
            e0: settings.e0,
            lambda_exponent: settings.lambda_exponent,
            limit: settings.limit,
            max_d_lambda: settings.max_d_lambda,
            advect: settings.advect,
            rho_min,
            lambda_step_start: lambda.clone(),
            lambda,
            ddt_lambda: vec![0.0; n],
            points,
            field: StagedField::new("lambda"),
        })
    }

    pub fn lambda(&self) -> &[f64] {
        &self.lambda
    }

    /// Reaction rate of the latest stage, including folded corrections.
    pub fn ddt_lambda(&self) -> &[f64] {
        &self.ddt_lambda
    }

    pub fn e0(&self) -> f64 {
        self.e0
    }

    pub fn law(&self) -> &ActivationLaw {
        &self.law
    }

    pub fn points(&self) -> &[DetonationPoint] {
        &self.points
    }

    pub fn lambda_exponent(&self) -> f64 {
        self.lambda_exponent
    }

    /// λ^m for one cell.
    pub fn lambda_pow(&self, cell: usize) -> f64 {
        self.lambda[cell].powf(self.lambda_exponent)
    }

    pub fn lambda_pow_field(&self) -> Vec<f64> {
        self.lambda
            .par_iter()
            .map(|l| l.powf(self.lambda_exponent))
            .collect()
    }

    /// Volumetric energy release e0·αρ·dλ/dt [W/m³].
    pub fn e_source(&self, alpha_rho: &[f64]) -> Vec<f64> {
        alpha_rho
            .par_iter()
            .zip(self.ddt_lambda.par_iter())
            .map(|(ar, d)| self.e0 * ar * d)
            .collect()
    }

    pub fn set_ode_fields(
        &mut self,
        n_steps: usize,
        store_fields: &[bool],
        store_deltas: &[bool],
    ) -> SimResult<()> {
        self.field.set_ode_fields(n_steps, store_fields, store_deltas)
    }

    pub fn clear_ode_fields(&mut self) {
        self.field.clear_ode_fields();
    }

    /// Clamp λ to [0, 1]; with limiting, also keep each cell within
    /// [λⁿ, λⁿ + max_d_lambda] of its value at the start of the step.
    pub fn limit(&mut self) {
        let limit = self.limit;
        let max_d = self.max_d_lambda;
        self.lambda
            .par_iter_mut()
            .zip(self.lambda_step_start.par_iter())
            .for_each(|(l, &start)| {
                if limit {
                    *l = l.min(start + max_d).max(start);
                }
                *l = l.clamp(0.0, 1.0);
            });
    }

    /// Advance λ through stage `stepi`.
    pub fn solve(
        &mut self,
        time: &StepTime,
        stepi: usize,
        ai: &[f64],
        bi: &[f64],
        inputs: &ActivationInputs,
    ) -> SimResult<()> {
        check_stage(stepi, ai, bi, self.field.n_steps())?;
        let n = self.lambda.len();
        let lens = [
            inputs.rho.len(),
            inputs.p.len(),
            inputs.t.len(),
            inputs.alpha_rho.len(),
            inputs.alpha_rho_new.len(),
        ];
        if lens.iter().any(|&l| l != n) || inputs.alpha_rho_phi.len() != self.mesh.n_faces() {
            return Err(SimError::InvalidArg {
                what: "activation input length differs from mesh size",
            });
        }
        if stepi == 0 {
            self.lambda_step_start.copy_from_slice(&self.lambda);
        }

        let reaction: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| self.law.rate(self.lambda[i], inputs.p[i], inputs.t[i]))
            .collect();

        let rho_min = self.rho_min;
        let mass_floor = |i: usize| inputs.alpha_rho_new[i].max(rho_min);
        if self.advect {
            let face_flux = self.upwind_lambda_flux(inputs.alpha_rho_phi);
            let div = self.mesh.divergence(&face_flux);
            let mut q: Vec<f64> = inputs
                .alpha_rho
                .iter()
                .zip(&self.lambda)
                .map(|(ar, l)| ar * l)
                .collect();
            let fresh: Vec<f64> = (0..n)
                .map(|i| -div[i] + inputs.alpha_rho[i] * reaction[i])
                .collect();
            self.field
                .advance(stepi, ai, bi, time.dt, &mut q, &fresh)?;
            for (i, l) in self.lambda.iter_mut().enumerate() {
                *l = q[i] / mass_floor(i);
            }
        } else {
            self.field
                .advance(stepi, ai, bi, time.dt, &mut self.lambda, &reaction)?;
        }
        let combined = self.lambda.clone();

        self.limit();
        for point in &mut self.points {
            if point.update(time.t) {
                tracing::debug!(
                    t = time.t,
                    delay = point.delay(),
                    cells = point.cells().len(),
                    "detonation point ignited"
                );
            }
            if point.activated() {
                for &cell in point.cells() {
                    self.lambda[cell] = 1.0;
                }
            }
        }

        let correction: Vec<f64> = self
            .lambda
            .iter()
            .zip(&combined)
            .map(|(l, c)| l - c)
            .collect();
        let b = bi[stepi];
        let scale = if b != 0.0 && time.dt > 0.0 {
            1.0 / (time.dt * b)
        } else {
            0.0
        };
        for i in 0..n {
            self.ddt_lambda[i] = reaction[i] + correction[i] * scale;
        }

        if self.advect {
            let correction_q: Vec<f64> = (0..n).map(|i| correction[i] * mass_floor(i)).collect();
            self.field.fold_correction(stepi, bi, time.dt, &correction_q)
        } else {
            self.field.fold_correction(stepi, bi, time.dt, &correction)
        }
    }

    /// Face flux αρφ·λ with λ taken from the upwind cell.
    fn upwind_lambda_flux(&self, alpha_rho_phi: &[f64]) -> Vec<f64> {
        self.mesh
            .faces()
            .par_iter()
            .zip(alpha_rho_phi.par_iter())
            .map(|(face, &flux)| match face.neighbour {
                None => 0.0,
                Some(n) => {
                    let donor = if flux >= 0.0 { face.owner } else { n };
                    flux * self.lambda[donor]
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::TimeScheme;
    use df_mesh::MeshBuilder;
    use proptest::prelude::*;

    fn mesh(n: usize) -> Arc<Mesh> {
        Arc::new(
            MeshBuilder::structured_box([n, 1, 1], [0.0; 3], [1.0, 0.1, 0.1])
                .build()
                .unwrap(),
        )
    }

    fn settings(law: ActivationLaw) -> ActivationSettings {
        ActivationSettings {
            law,
            e0: 4.0e6,
            lambda_exponent: 1.0,
            initial_lambda: 0.0,
            limit: true,
            max_d_lambda: 1.0,
            advect: false,
            detonation_points: vec![],
            seeds: vec![],
        }
    }

    struct Inputs {
        rho: Vec<f64>,
        p: Vec<f64>,
        t: Vec<f64>,
        ar: Vec<f64>,
        phi: Vec<f64>,
    }

    impl Inputs {
        fn uniform(mesh: &Mesh, p: f64) -> Self {
            let n = mesh.n_cells();
            Self {
                rho: vec![1600.0; n],
                p: vec![p; n],
                t: vec![300.0; n],
                ar: vec![1600.0; n],
                phi: vec![0.0; mesh.n_faces()],
            }
        }

        fn view(&self) -> ActivationInputs<'_> {
            ActivationInputs {
                rho: &self.rho,
                p: &self.p,
                t: &self.t,
                alpha_rho: &self.ar,
                alpha_rho_new: &self.ar,
                alpha_rho_phi: &self.phi,
            }
        }
    }

    fn step(model: &mut ActivationModel, scheme: &TimeScheme, t: f64, dt: f64, inputs: &Inputs) {
        let time = StepTime { t: t + dt, dt };
        for (i, stage) in scheme.stages().iter().enumerate() {
            model.solve(&time, i, &stage.a, &stage.b, &inputs.view()).unwrap();
        }
    }

    fn prepare(model: &mut ActivationModel, scheme: &TimeScheme) {
        let (f, d) = scheme.store_flags();
        model.set_ode_fields(scheme.n_steps(), &f, &d).unwrap();
    }

    #[test]
    fn linear_rate_advances_lambda() {
        let m = mesh(4);
        let mut model =
            ActivationModel::new(m.clone(), &settings(ActivationLaw::Linear { rate: 1.0e3 }), 1e-6).unwrap();
        let scheme = TimeScheme::Rk2;
        prepare(&mut model, &scheme);
        let inputs = Inputs::uniform(&m, 1.0e5);
        step(&mut model, &scheme, 0.0, 1.0e-4, &inputs);
        for &l in model.lambda() {
            assert!((l - 0.1).abs() < 1e-12);
        }
        for &d in model.ddt_lambda() {
            assert!((d - 1.0e3).abs() < 1e-9);
        }
    }

    #[test]
    fn max_d_lambda_caps_step_increment() {
        let m = mesh(3);
        let mut s = settings(ActivationLaw::Linear { rate: 1.0e4 });
        s.max_d_lambda = 0.05;
        let mut model = ActivationModel::new(m.clone(), &s, 1e-6).unwrap();
        let scheme = TimeScheme::Rk2;
        prepare(&mut model, &scheme);
        let inputs = Inputs::uniform(&m, 1.0e5);
        step(&mut model, &scheme, 0.0, 1.0e-4, &inputs);
        for &l in model.lambda() {
            assert!((l - 0.05).abs() < 1e-12);
        }
        // folded rate reproduces the limited increment: λ = dt · dλ/dt
        for &d in model.ddt_lambda() {
            assert!(d < 1.0e4);
        }
        // stored stage-0 rate was folded to the capped value
        let stored = model.field.delta().get(0).unwrap()[0];
        assert!((stored - 0.05 / 1.0e-4).abs() < 1e-6);
    }

    #[test]
    fn detonation_point_ignites_on_time() {
        let m = mesh(10);
        let mut s = settings(ActivationLaw::None);
        s.detonation_points = vec![DetonationPointDef {
            position: [0.05, 0.05, 0.05],
            delay: 2.0e-6,
            radius: 0.0,
        }];
        let mut model = ActivationModel::new(m.clone(), &s, 1e-6).unwrap();
        let scheme = TimeScheme::Euler;
        prepare(&mut model, &scheme);
        let inputs = Inputs::uniform(&m, 1.0e5);

        step(&mut model, &scheme, 0.0, 1.0e-6, &inputs);
        assert!(!model.points()[0].activated());
        assert_eq!(model.lambda()[0], 0.0);

        step(&mut model, &scheme, 1.0e-6, 1.0e-6, &inputs);
        assert!(model.points()[0].activated());
        assert_eq!(model.lambda()[0], 1.0);
        assert_eq!(model.lambda()[1], 0.0);
        assert!(model.e_source(&inputs.ar)[0] > 0.0);

        // stays ignited
        step(&mut model, &scheme, 2.0e-6, 1.0e-6, &inputs);
        assert_eq!(model.lambda()[0], 1.0);
    }

    #[test]
    fn zero_delay_ignites_at_construction() {
        let m = mesh(10);
        let mut s = settings(ActivationLaw::None);
        s.detonation_points = vec![DetonationPointDef {
            position: [0.5, 0.05, 0.05],
            delay: 0.0,
            radius: 0.11,
        }];
        let model = ActivationModel::new(m, &s, 1e-6).unwrap();
        assert_eq!(model.lambda()[4], 1.0);
        assert_eq!(model.lambda()[5], 1.0);
        assert_eq!(model.lambda()[3], 0.0);
    }

    #[test]
    fn seeds_override_initial_value() {
        let m = mesh(10);
        let mut s = settings(ActivationLaw::Linear { rate: 0.0 });
        s.initial_lambda = 0.2;
        s.seeds = vec![LambdaSeed {
            center: [0.95, 0.05, 0.05],
            radius: 0.06,
            value: 0.7,
        }];
        let model = ActivationModel::new(m, &s, 1e-6).unwrap();
        assert_eq!(model.lambda()[0], 0.2);
        assert_eq!(model.lambda()[9], 0.7);
        assert!((model.lambda_pow(9) - 0.7).abs() < 1e-15);
    }

    #[test]
    fn advected_lambda_matches_local_without_flux() {
        let m = mesh(4);
        let law = ActivationLaw::Linear { rate: 500.0 };
        let mut local = ActivationModel::new(m.clone(), &settings(law.clone()), 1e-6).unwrap();
        let mut s = settings(law);
        s.advect = true;
        let mut advected = ActivationModel::new(m.clone(), &s, 1e-6).unwrap();
        let scheme = TimeScheme::Rk3Ssp;
        prepare(&mut local, &scheme);
        prepare(&mut advected, &scheme);
        let inputs = Inputs::uniform(&m, 1.0e5);
        step(&mut local, &scheme, 0.0, 1.0e-4, &inputs);
        step(&mut advected, &scheme, 0.0, 1.0e-4, &inputs);
        for (a, b) in local.lambda().iter().zip(advected.lambda()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_law_without_points_is_rejected() {
        let m = mesh(2);
        assert!(matches!(
            ActivationModel::new(m, &settings(ActivationLaw::None), 1e-6),
            Err(SimError::Config { .. })
        ));
    }

    #[test]
    fn set_then_clear_restores_storage() {
        let m = mesh(2);
        let law = ActivationLaw::Linear { rate: 0.0 };
        let mut model = ActivationModel::new(m, &settings(law), 1e-6).unwrap();
        let before = model.field.clone();
        prepare(&mut model, &TimeScheme::Rk4);
        model.clear_ode_fields();
        assert_eq!(model.field, before);
    }

    proptest! {
        #[test]
        fn limited_lambda_is_bounded_and_monotone(
            coefficient in 0.0_f64..1.0e-2,
            p in 1.0e4_f64..1.0e6,
            dt in 1.0e-7_f64..1.0e-4,
            max_d in 0.01_f64..1.0,
            steps in 1_usize..15,
        ) {
            let m = mesh(3);
            let mut s = settings(ActivationLaw::PressureBased {
                coefficient,
                lambda_exponent: 0.5,
                pressure_exponent: 1.0,
                p_min: 0.0,
            });
            s.max_d_lambda = max_d;
            let mut model = ActivationModel::new(m.clone(), &s, 1e-6).unwrap();
            let scheme = TimeScheme::Rk3Ssp;
            prepare(&mut model, &scheme);
            let inputs = Inputs::uniform(&m, p);
            let mut previous = model.lambda().to_vec();
            let mut t = 0.0;
            for _ in 0..steps {
                step(&mut model, &scheme, t, dt, &inputs);
                t += dt;
                for (l, prev) in model.lambda().iter().zip(&previous) {
                    prop_assert!((0.0..=1.0).contains(l));
                    prop_assert!(*l >= *prev);
                    prop_assert!(*l - *prev <= max_d + 1e-12);
                }
                previous = model.lambda().to_vec();
            }
        }
    }
}
