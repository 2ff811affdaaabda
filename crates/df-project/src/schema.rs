//! Serializable case definition.

use df_sim::{ActivationSettings, TimeScheme, TwoPhaseSettings};
use df_thermo::PhaseThermo;
use serde::{Deserialize, Serialize};

pub const CASE_VERSION: u32 = 1;

fn default_version() -> u32 {
    CASE_VERSION
}

fn default_max_steps() -> usize {
    1_000_000
}

fn default_record_every() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseDef {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    pub mesh: MeshDef,
    pub phases: PhasesDef,
    #[serde(default)]
    pub activation: Option<ActivationSettings>,
    #[serde(default)]
    pub numerics: TwoPhaseSettings,
    #[serde(default)]
    pub scheme: TimeScheme,
    pub initial: InitialDef,
    pub run: RunDef,
}

/// Structured box mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshDef {
    pub cells: [usize; 3],
    pub lower: [f64; 3],
    pub upper: [f64; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhasesDef {
    /// Reacting phase when activation is configured.
    pub phase1: PhaseThermo,
    pub phase2: PhaseThermo,
}

/// Primitive state of one cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateDef {
    /// Phase-1 volume fraction
    pub alpha: f64,
    /// Phase densities (kg/m³)
    pub rho1: f64,
    pub rho2: f64,
    /// Equilibrium pressure (Pa)
    pub p: f64,
    /// Velocity (m/s)
    #[serde(default)]
    pub velocity: [f64; 3],
    /// Temperature (K). When set, the energy comes from T and `p` only seeds
    /// the first closure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegionShape {
    Box { lower: [f64; 3], upper: [f64; 3] },
    Sphere { center: [f64; 3], radius: f64 },
}

impl RegionShape {
    pub fn contains(&self, point: [f64; 3]) -> bool {
        match self {
            RegionShape::Box { lower, upper } => {
                (0..3).all(|i| point[i] >= lower[i] && point[i] <= upper[i])
            }
            RegionShape::Sphere { center, radius } => {
                let d2: f64 = (0..3).map(|i| (point[i] - center[i]).powi(2)).sum();
                d2 <= radius * radius
            }
        }
    }
}

/// Overrides the default state in cells whose centroid lies in `shape`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionDef {
    pub shape: RegionShape,
    pub state: StateDef,
}

/// Initial conditions; later regions win.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialDef {
    pub default: StateDef,
    #[serde(default)]
    pub regions: Vec<RegionDef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunDef {
    /// Time step (s)
    pub dt: f64,
    /// End time (s)
    pub t_end: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_record_every")]
    pub record_every: usize,
    #[serde(default)]
    pub max_courant: Option<f64>,
}
