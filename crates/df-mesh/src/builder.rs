//! Structured mesh builder.

use nalgebra::Vector3;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Cell, Face, Mesh};

/// Builder for axis-aligned structured box meshes.
///
/// Cell `(i, j, k)` has index `i + nx * (j + ny * k)`. A 1-D case is a box
/// with a single cell in y and z.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    counts: [usize; 3],
    lower: [f64; 3],
    upper: [f64; 3],
}

impl MeshBuilder {
    /// Start a structured box with `counts` cells between `lower` and `upper`.
    pub fn structured_box(counts: [usize; 3], lower: [f64; 3], upper: [f64; 3]) -> Self {
        Self {
            counts,
            lower,
            upper,
        }
    }

    /// Validate the box definition and generate the mesh.
    pub fn build(&self) -> MeshResult<Mesh> {
        if self.counts.contains(&0) {
            return Err(MeshError::InvalidArg {
                what: "cell counts must be positive",
            });
        }
        let mut spacing = [0.0; 3];
        for d in 0..3 {
            let extent = self.upper[d] - self.lower[d];
            if !extent.is_finite() || extent <= 0.0 {
                return Err(MeshError::InvalidArg {
                    what: "upper corner must exceed lower corner",
                });
            }
            spacing[d] = extent / self.counts[d] as f64;
        }

        let [nx, ny, nz] = self.counts;
        let [dx, dy, dz] = spacing;
        let volume = dx * dy * dz;

        let index = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);
        let centre = |i: usize, j: usize, k: usize| {
            Vector3::new(
                self.lower[0] + (i as f64 + 0.5) * dx,
                self.lower[1] + (j as f64 + 0.5) * dy,
                self.lower[2] + (k as f64 + 0.5) * dz,
            )
        };

        let mut cells = Vec::with_capacity(nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    cells.push(Cell {
                        volume,
                        centroid: centre(i, j, k),
                    });
                }
            }
        }

        let areas = [dy * dz, dx * dz, dx * dy];
        let mut faces = Vec::new();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let owner = index(i, j, k);
                    let c = centre(i, j, k);
                    let ijk = [i, j, k];
                    for d in 0..3 {
                        let mut normal = Vector3::zeros();
                        normal[d] = 1.0;
                        let half = normal * (0.5 * spacing[d]);

                        // Positive side: internal neighbour or boundary
                        let neighbour = (ijk[d] + 1 < self.counts[d]).then(|| {
                            let mut n = ijk;
                            n[d] += 1;
                            index(n[0], n[1], n[2])
                        });
                        faces.push(Face {
                            owner,
                            neighbour,
                            area: areas[d],
                            normal,
                            centroid: c + half,
                        });

                        // Negative side only produces a boundary face
                        if ijk[d] == 0 {
                            faces.push(Face {
                                owner,
                                neighbour: None,
                                area: areas[d],
                                normal: -normal,
                                centroid: c - half,
                            });
                        }
                    }
                }
            }
        }

        Mesh::from_parts(cells, faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_dimensional_counts() {
        let mesh = MeshBuilder::structured_box([8, 1, 1], [0.0; 3], [1.0, 1.0, 1.0])
            .build()
            .unwrap();
        assert_eq!(mesh.n_cells(), 8);
        assert_eq!(mesh.n_internal_faces(), 7);
        // two x-ends plus 2 * 8 faces for each of y and z
        assert_eq!(mesh.boundary_faces().len(), 2 + 16 + 16);
    }

    #[test]
    fn three_dimensional_face_counts() {
        let mesh = MeshBuilder::structured_box([3, 4, 5], [0.0; 3], [3.0, 4.0, 5.0])
            .build()
            .unwrap();
        let internal = 2 * 4 * 5 + 3 * 3 * 5 + 3 * 4 * 4;
        assert_eq!(mesh.n_internal_faces(), internal);
        assert!((mesh.total_volume() - 60.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_boxes() {
        assert!(MeshBuilder::structured_box([0, 1, 1], [0.0; 3], [1.0; 3])
            .build()
            .is_err());
        assert!(MeshBuilder::structured_box([2, 1, 1], [1.0, 0.0, 0.0], [0.0, 1.0, 1.0])
            .build()
            .is_err());
    }
}
