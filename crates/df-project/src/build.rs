//! Turn a validated case definition into runtime objects.

use std::sync::Arc;

use df_mesh::{Mesh, MeshBuilder, Vector3};
use df_sim::{ActivationModel, SimError, SimOptions, TimeScheme, TwoPhaseInit, TwoPhaseSystem};

use crate::schema::{CaseDef, InitialDef, StateDef};
use crate::validate::validate_case;
use crate::ProjectResult;

/// A case ready to run.
pub struct Case {
    pub name: String,
    pub system: TwoPhaseSystem,
    pub scheme: TimeScheme,
    pub options: SimOptions,
}

pub fn build_case(def: &CaseDef) -> ProjectResult<Case> {
    validate_case(def)?;

    let mesh = MeshBuilder::structured_box(def.mesh.cells, def.mesh.lower, def.mesh.upper)
        .build()
        .map_err(SimError::from)?;
    let mesh = Arc::new(mesh);
    let (init, temperatures) = initial_state(&mesh, &def.initial);

    let activation = def
        .activation
        .as_ref()
        .map(|settings| ActivationModel::new(mesh.clone(), settings, def.numerics.rho_min))
        .transpose()?;

    let n_cells = mesh.n_cells();
    let mut system = TwoPhaseSystem::new(
        mesh,
        [def.phases.phase1.clone(), def.phases.phase2.clone()],
        def.numerics,
        init,
        activation,
    )?;
    if temperatures.iter().any(Option::is_some) {
        let mut e = system.e().to_vec();
        for (i, t) in temperatures.iter().enumerate() {
            if let Some(t) = *t {
                e[i] = system.energy_at_temperature(i, t)?;
            }
        }
        system.set_internal_energy(e)?;
    }

    tracing::info!(
        case = %def.name,
        cells = n_cells,
        scheme = def.scheme.name(),
        "built case"
    );

    Ok(Case {
        name: def.name.clone(),
        system,
        scheme: def.scheme.clone(),
        options: SimOptions {
            dt: def.run.dt,
            t_end: def.run.t_end,
            max_steps: def.run.max_steps,
            record_every: def.run.record_every,
            max_courant: def.run.max_courant,
        },
    })
}

/// Default state everywhere, then each region in order. Also returns the
/// per-cell temperature override.
fn initial_state(mesh: &Mesh, initial: &InitialDef) -> (TwoPhaseInit, Vec<Option<f64>>) {
    let mut init = TwoPhaseInit::uniform(0, 0.0, 0.0, 0.0, Vector3::zeros(), 0.0);
    let mut temperatures = Vec::with_capacity(mesh.n_cells());
    for cell in mesh.cells() {
        let c = cell.centroid;
        let state: &StateDef = initial
            .regions
            .iter()
            .rev()
            .find(|r| r.shape.contains([c.x, c.y, c.z]))
            .map_or(&initial.default, |r| &r.state);
        init.alpha.push(state.alpha);
        init.rho1.push(state.rho1);
        init.rho2.push(state.rho2);
        init.velocity.push(Vector3::from(state.velocity));
        init.p.push(state.p);
        temperatures.push(state.t);
    }
    (init, temperatures)
}
