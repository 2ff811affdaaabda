//! Face flux schemes for the two-phase transport equations.

use df_mesh::{Face, Mesh, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Cell-centred primitive state read by a flux scheme.
#[derive(Debug, Clone, Copy)]
pub struct CellPrimitives<'a> {
    pub alpha: &'a [f64],
    pub rho1: &'a [f64],
    pub rho2: &'a [f64],
    pub velocity: &'a [Vector3<f64>],
    pub p: &'a [f64],
    pub c: &'a [f64],
}

impl CellPrimitives<'_> {
    fn check(&self, n_cells: usize) -> SimResult<()> {
        let lens = [
            self.alpha.len(),
            self.rho1.len(),
            self.rho2.len(),
            self.velocity.len(),
            self.p.len(),
            self.c.len(),
        ];
        if lens.iter().any(|&l| l != n_cells) {
            return Err(SimError::InvalidArg {
                what: "primitive field length differs from cell count",
            });
        }
        Ok(())
    }

    /// Transported quantities (α, αρ₁, (1−α)ρ₂) of a cell.
    fn transported(&self, cell: usize) -> [f64; 3] {
        let a = self.alpha[cell];
        [a, a * self.rho1[cell], (1.0 - a) * self.rho2[cell]]
    }
}

/// Face fluxes, one entry per mesh face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceFluxes {
    /// Volumetric flux φ = (u·n)A [m³/s]
    pub phi: Vec<f64>,
    /// Volume-fraction flux αφ
    pub alpha_phi: Vec<f64>,
    /// Phase-1 mass flux αρ₁φ [kg/s]
    pub alpha_rho_phi1: Vec<f64>,
    /// Phase-2 mass flux (1−α)ρ₂φ [kg/s]
    pub alpha_rho_phi2: Vec<f64>,
}

impl FaceFluxes {
    pub fn zeros(n_faces: usize) -> Self {
        Self {
            phi: vec![0.0; n_faces],
            alpha_phi: vec![0.0; n_faces],
            alpha_rho_phi1: vec![0.0; n_faces],
            alpha_rho_phi2: vec![0.0; n_faces],
        }
    }

    pub fn len(&self) -> usize {
        self.phi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phi.is_empty()
    }

    fn scatter(&mut self, per_face: Vec<[f64; 4]>) {
        for (f, [phi, aphi, arphi1, arphi2]) in per_face.into_iter().enumerate() {
            self.phi[f] = phi;
            self.alpha_phi[f] = aphi;
            self.alpha_rho_phi1[f] = arphi1;
            self.alpha_rho_phi2[f] = arphi2;
        }
    }
}

/// Computes face fluxes from cell primitives.
pub trait FluxScheme: Send + Sync {
    fn name(&self) -> &str;

    /// Fill `out` for every face. Boundary faces carry zero flux.
    fn face_fluxes(&self, mesh: &Mesh, prims: &CellPrimitives, out: &mut FaceFluxes)
    -> SimResult<()>;
}

/// Selectable flux scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FluxKind {
    #[default]
    Upwind,
    Rusanov,
}

impl FluxKind {
    pub fn build(self) -> Box<dyn FluxScheme + Send + Sync> {
        match self {
            FluxKind::Upwind => Box::new(Upwind),
            FluxKind::Rusanov => Box::new(Rusanov::default()),
        }
    }
}

fn face_normal_velocity(face: &Face, neighbour: usize, prims: &CellPrimitives) -> f64 {
    0.5 * (prims.velocity[face.owner] + prims.velocity[neighbour]).dot(&face.normal)
}

fn prepare(mesh: &Mesh, prims: &CellPrimitives, out: &mut FaceFluxes) -> SimResult<()> {
    prims.check(mesh.n_cells())?;
    if out.len() != mesh.n_faces() {
        *out = FaceFluxes::zeros(mesh.n_faces());
    }
    Ok(())
}

/// Donor-cell upwinding on the averaged face-normal velocity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Upwind;

impl FluxScheme for Upwind {
    fn name(&self) -> &str {
        "upwind"
    }

    fn face_fluxes(
        &self,
        mesh: &Mesh,
        prims: &CellPrimitives,
        out: &mut FaceFluxes,
    ) -> SimResult<()> {
        prepare(mesh, prims, out)?;
        let per_face: Vec<[f64; 4]> = mesh
            .faces()
            .par_iter()
            .map(|face| {
                let Some(n) = face.neighbour else {
                    return [0.0; 4];
                };
                let phi = face_normal_velocity(face, n, prims) * face.area;
                let donor = if phi >= 0.0 { face.owner } else { n };
                let [a, ar1, ar2] = prims.transported(donor);
                [phi, a * phi, ar1 * phi, ar2 * phi]
            })
            .collect();
        out.scatter(per_face);
        Ok(())
    }
}

/// Local Lax–Friedrichs flux: central average plus max(|u·n| + c) jump dissipation.
#[derive(Debug, Clone, Copy)]
pub struct Rusanov {
    /// Multiplier on the dissipative wave speed.
    pub wave_speed_factor: f64,
}

impl Default for Rusanov {
    fn default() -> Self {
        Self {
            wave_speed_factor: 1.0,
        }
    }
}

impl FluxScheme for Rusanov {
    fn name(&self) -> &str {
        "rusanov"
    }

    fn face_fluxes(
        &self,
        mesh: &Mesh,
        prims: &CellPrimitives,
        out: &mut FaceFluxes,
    ) -> SimResult<()> {
        prepare(mesh, prims, out)?;
        let per_face: Vec<[f64; 4]> = mesh
            .faces()
            .par_iter()
            .map(|face| {
                let Some(n) = face.neighbour else {
                    return [0.0; 4];
                };
                let o = face.owner;
                let un = face_normal_velocity(face, n, prims);
                let s_o = prims.velocity[o].dot(&face.normal).abs() + prims.c[o].max(0.0);
                let s_n = prims.velocity[n].dot(&face.normal).abs() + prims.c[n].max(0.0);
                let s = self.wave_speed_factor * s_o.max(s_n);

                let qo = prims.transported(o);
                let qn = prims.transported(n);
                let flux = |k: usize| {
                    face.area * (un * 0.5 * (qo[k] + qn[k]) - 0.5 * s * (qn[k] - qo[k]))
                };
                [un * face.area, flux(0), flux(1), flux(2)]
            })
            .collect();
        out.scatter(per_face);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_mesh::MeshBuilder;

    struct Fields {
        alpha: Vec<f64>,
        rho1: Vec<f64>,
        rho2: Vec<f64>,
        u: Vec<Vector3<f64>>,
        p: Vec<f64>,
        c: Vec<f64>,
    }

    impl Fields {
        fn prims(&self) -> CellPrimitives<'_> {
            CellPrimitives {
                alpha: &self.alpha,
                rho1: &self.rho1,
                rho2: &self.rho2,
                velocity: &self.u,
                p: &self.p,
                c: &self.c,
            }
        }
    }

    fn step_fields(n: usize, ux: f64) -> Fields {
        Fields {
            alpha: (0..n).map(|i| if i < n / 2 { 0.9 } else { 0.1 }).collect(),
            rho1: vec![1000.0; n],
            rho2: vec![1.0; n],
            u: vec![Vector3::new(ux, 0.0, 0.0); n],
            p: vec![1.0e5; n],
            c: vec![300.0; n],
        }
    }

    #[test]
    fn upwind_takes_owner_state_for_positive_flow() {
        let mesh = MeshBuilder::structured_box([4, 1, 1], [0.0; 3], [1.0, 1.0, 1.0])
            .build()
            .unwrap();
        let f = step_fields(4, 2.0);
        let mut out = FaceFluxes::zeros(mesh.n_faces());
        Upwind.face_fluxes(&mesh, &f.prims(), &mut out).unwrap();
        for (i, face) in mesh.internal_faces().iter().enumerate() {
            let area = face.area;
            assert!((out.phi[i] - 2.0 * area).abs() < 1e-12);
            let expected = f.alpha[face.owner] * 2.0 * area;
            assert!((out.alpha_phi[i] - expected).abs() < 1e-12);
        }
        for f in mesh.n_internal_faces()..mesh.n_faces() {
            assert_eq!(out.alpha_rho_phi1[f], 0.0);
        }
    }

    #[test]
    fn rusanov_dissipates_at_rest() {
        let mesh = MeshBuilder::structured_box([4, 1, 1], [0.0; 3], [1.0, 1.0, 1.0])
            .build()
            .unwrap();
        let f = step_fields(4, 0.0);
        let mut out = FaceFluxes::zeros(mesh.n_faces());
        Rusanov::default()
            .face_fluxes(&mesh, &f.prims(), &mut out)
            .unwrap();
        // volume fraction drops across the middle face, so the flux is positive
        let middle = mesh
            .internal_faces()
            .iter()
            .position(|face| face.owner == 1)
            .unwrap();
        assert_eq!(out.phi[middle], 0.0);
        assert!(out.alpha_phi[middle] > 0.0);
    }

    #[test]
    fn uniform_state_gives_consistent_fluxes() {
        let mesh = MeshBuilder::structured_box([3, 1, 1], [0.0; 3], [1.0, 1.0, 1.0])
            .build()
            .unwrap();
        let mut f = step_fields(3, 1.5);
        f.alpha = vec![0.4; 3];
        for scheme in [FluxKind::Upwind.build(), FluxKind::Rusanov.build()] {
            let mut out = FaceFluxes::zeros(mesh.n_faces());
            scheme.face_fluxes(&mesh, &f.prims(), &mut out).unwrap();
            for i in 0..mesh.n_internal_faces() {
                assert!((out.alpha_phi[i] - 0.4 * out.phi[i]).abs() < 1e-12, "{}", scheme.name());
            }
        }
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mesh = MeshBuilder::structured_box([3, 1, 1], [0.0; 3], [1.0, 1.0, 1.0])
            .build()
            .unwrap();
        let mut f = step_fields(3, 1.0);
        f.p.pop();
        let mut out = FaceFluxes::zeros(mesh.n_faces());
        assert!(Upwind.face_fluxes(&mesh, &f.prims(), &mut out).is_err());
    }
}
