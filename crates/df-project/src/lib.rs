//! df-project: case file format, validation and construction.

pub mod build;
pub mod schema;
pub mod validate;

pub use build::{Case, build_case};
pub use schema::*;
pub use validate::{ValidationError, validate_case};

use std::path::Path;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Build error: {0}")]
    Build(#[from] df_sim::SimError),
}

pub fn load_yaml(path: &Path) -> ProjectResult<CaseDef> {
    let content = std::fs::read_to_string(path)?;
    let case: CaseDef = serde_yaml::from_str(&content)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_yaml(path: &Path, case: &CaseDef) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_yaml::to_string(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<CaseDef> {
    let content = std::fs::read_to_string(path)?;
    let case: CaseDef = serde_json::from_str(&content)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn save_json(path: &Path, case: &CaseDef) -> ProjectResult<()> {
    validate_case(case)?;
    let content = serde_json::to_string_pretty(case)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load_case(path: &Path) -> ProjectResult<CaseDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}

#[cfg(test)]
pub(crate) fn test_case() -> CaseDef {
    use df_sim::{
        ActivationLaw, ActivationSettings, DetonationPointDef, TimeScheme, TwoPhaseSettings,
    };
    use df_thermo::{BlendedThermo, CaloricModel, EquationOfState, Material, PhaseThermo};

    let ideal = |name: &str, gamma: f64, cv: f64| Material {
        name: name.to_string(),
        molecular_weight: 28.0,
        eos: EquationOfState::IdealGas { gamma },
        caloric: CaloricModel::ConstantCv { cv, e_ref: 0.0 },
    };
    CaseDef {
        version: CASE_VERSION,
        name: "tube".to_string(),
        mesh: MeshDef {
            cells: [20, 1, 1],
            lower: [0.0; 3],
            upper: [0.1, 0.01, 0.01],
        },
        phases: PhasesDef {
            phase1: PhaseThermo::Detonating(BlendedThermo::new(
                ideal("unreacted", 1.4, 718.0),
                ideal("products", 1.25, 1200.0),
            )),
            phase2: PhaseThermo::Single(ideal("air", 1.4, 718.0)),
        },
        activation: Some(ActivationSettings {
            law: ActivationLaw::Linear { rate: 100.0 },
            e0: 1.0e6,
            lambda_exponent: 1.0,
            initial_lambda: 0.0,
            limit: true,
            max_d_lambda: 1.0,
            advect: false,
            detonation_points: vec![DetonationPointDef {
                position: [0.0, 0.005, 0.005],
                delay: 0.0,
                radius: 0.0,
            }],
            seeds: vec![],
        }),
        numerics: TwoPhaseSettings::default(),
        scheme: TimeScheme::Rk2,
        initial: InitialDef {
            default: StateDef {
                alpha: 0.5,
                rho1: 1.2,
                rho2: 1.2,
                p: 1.0e5,
                velocity: [0.0; 3],
                t: None,
            },
            regions: vec![],
        },
        run: RunDef {
            dt: 1.0e-5,
            t_end: 1.0e-4,
            max_steps: 1000,
            record_every: 5,
            max_courant: None,
        },
    }
}
