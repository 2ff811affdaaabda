use df_mesh::{Mesh, Vector3};

use crate::error::{SimError, SimResult};

/// Ignition site that forces λ = 1 in its cells once its delay has elapsed.
#[derive(Debug, Clone, PartialEq)]
pub struct DetonationPoint {
    position: Vector3<f64>,
    delay: f64,
    radius: f64,
    activated: bool,
    cells: Vec<usize>,
}

impl DetonationPoint {
    /// Resolve the ignition cells: the nearest cell for a zero radius, otherwise
    /// every cell whose centroid lies within `radius`.
    pub fn new(mesh: &Mesh, position: Vector3<f64>, delay: f64, radius: f64) -> SimResult<Self> {
        if !delay.is_finite() || !radius.is_finite() || radius < 0.0 {
            return Err(SimError::Config {
                what: "detonation point delay and radius must be finite, radius non-negative",
            });
        }
        let cells = if radius == 0.0 {
            mesh.nearest_cell(&position).into_iter().collect()
        } else {
            mesh.cells_within(&position, radius)
        };
        if cells.is_empty() {
            return Err(SimError::Config {
                what: "detonation point does not cover any cell",
            });
        }
        Ok(Self {
            position,
            delay,
            radius,
            activated: false,
            cells,
        })
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn activated(&self) -> bool {
        self.activated
    }

    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Activate once `time >= delay`. Returns true only on the transition.
    pub fn update(&mut self, time: f64) -> bool {
        if !self.activated && time >= self.delay {
            self.activated = true;
            return true;
        }
        false
    }
}
