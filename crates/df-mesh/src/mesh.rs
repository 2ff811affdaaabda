//! Core mesh data structures.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::error::{MeshError, MeshResult};

/// A single control volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Volume [m³]
    pub volume: f64,
    /// Cell centroid [m]
    pub centroid: Vector3<f64>,
}

/// An interface between two cells, or a cell and the domain boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Owner cell; the unit normal points out of it.
    pub owner: usize,
    /// Neighbour cell, `None` on the boundary.
    pub neighbour: Option<usize>,
    /// Face area [m²]
    pub area: f64,
    /// Unit normal pointing from owner to neighbour
    pub normal: Vector3<f64>,
    /// Face centroid [m]
    pub centroid: Vector3<f64>,
}

impl Face {
    /// Area-weighted normal vector S = |S| n.
    pub fn area_vector(&self) -> Vector3<f64> {
        self.normal * self.area
    }

    pub fn is_boundary(&self) -> bool {
        self.neighbour.is_none()
    }
}

/// Immutable finite-volume mesh.
///
/// Internal faces are stored first, followed by boundary faces. Each
/// integration system shares the mesh read-only and owns its own fields.
#[derive(Debug, Clone)]
pub struct Mesh {
    cells: Vec<Cell>,
    faces: Vec<Face>,
    n_internal: usize,
}

impl Mesh {
    /// Build a mesh from raw parts, validating connectivity and geometry.
    pub fn from_parts(cells: Vec<Cell>, mut faces: Vec<Face>) -> MeshResult<Self> {
        // Keep internal faces contiguous at the front
        faces.sort_by_key(|f| f.neighbour.is_none());
        let n_internal = faces.iter().take_while(|f| f.neighbour.is_some()).count();
        crate::validate::validate_mesh(&cells, &faces)?;
        Ok(Self {
            cells,
            faces,
            n_internal,
        })
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn n_internal_faces(&self) -> usize {
        self.n_internal
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn cell(&self, index: usize) -> MeshResult<&Cell> {
        self.cells.get(index).ok_or(MeshError::IndexOob {
            what: "cell",
            index,
            len: self.cells.len(),
        })
    }

    pub fn internal_faces(&self) -> &[Face] {
        &self.faces[..self.n_internal]
    }

    pub fn boundary_faces(&self) -> &[Face] {
        &self.faces[self.n_internal..]
    }

    /// Total mesh volume [m³].
    pub fn total_volume(&self) -> f64 {
        self.cells.iter().map(|c| c.volume).sum()
    }

    /// Axis-aligned bounding box of the cell centroids.
    pub fn bounds(&self) -> (Vector3<f64>, Vector3<f64>) {
        let mut lo = Vector3::repeat(f64::INFINITY);
        let mut hi = Vector3::repeat(f64::NEG_INFINITY);
        for c in &self.cells {
            lo = lo.inf(&c.centroid);
            hi = hi.sup(&c.centroid);
        }
        (lo, hi)
    }

    /// Index of the cell whose centroid is closest to `point`.
    ///
    /// Ties resolve to the lowest index. Returns `None` for an empty mesh.
    pub fn nearest_cell(&self, point: &Vector3<f64>) -> Option<usize> {
        self.cells
            .par_iter()
            .enumerate()
            .map(|(i, c)| (i, (c.centroid - point).norm_squared()))
            .reduce_with(|a, b| {
                if b.1 < a.1 || (b.1 == a.1 && b.0 < a.0) {
                    b
                } else {
                    a
                }
            })
            .map(|(i, _)| i)
    }

    /// All cells whose centroid lies within `radius` of `point`, in index order.
    pub fn cells_within(&self, point: &Vector3<f64>, radius: f64) -> Vec<usize> {
        let r2 = radius * radius;
        self.cells
            .par_iter()
            .enumerate()
            .filter(|(_, c)| (c.centroid - point).norm_squared() <= r2)
            .map(|(i, _)| i)
            .collect()
    }

    /// Finite-volume divergence of a face flux field: sum of outgoing fluxes
    /// divided by the cell volume.
    pub fn divergence(&self, face_flux: &[f64]) -> Vec<f64> {
        debug_assert_eq!(face_flux.len(), self.faces.len());
        let mut div = vec![0.0; self.cells.len()];
        for (face, flux) in self.faces.iter().zip(face_flux) {
            div[face.owner] += flux;
            if let Some(n) = face.neighbour {
                div[n] -= flux;
            }
        }
        div.par_iter_mut()
            .zip(self.cells.par_iter())
            .for_each(|(d, c)| *d /= c.volume);
        div
    }
}
