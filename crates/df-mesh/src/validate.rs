//! Mesh validation logic.

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Cell, Face};

/// Validate geometry and connectivity: positive measures, in-range indices,
/// no self-adjacent faces.
pub(crate) fn validate_mesh(cells: &[Cell], faces: &[Face]) -> MeshResult<()> {
    for (i, cell) in cells.iter().enumerate() {
        if !cell.volume.is_finite() || cell.volume <= 0.0 {
            return Err(MeshError::Degenerate {
                what: "cell volume",
                index: i,
            });
        }
    }

    for (i, face) in faces.iter().enumerate() {
        if face.owner >= cells.len() {
            return Err(MeshError::IndexOob {
                what: "face owner",
                index: face.owner,
                len: cells.len(),
            });
        }
        if let Some(n) = face.neighbour {
            if n >= cells.len() {
                return Err(MeshError::IndexOob {
                    what: "face neighbour",
                    index: n,
                    len: cells.len(),
                });
            }
            if n == face.owner {
                return Err(MeshError::Degenerate {
                    what: "self-adjacent face",
                    index: i,
                });
            }
        }
        if !face.area.is_finite() || face.area <= 0.0 {
            return Err(MeshError::Degenerate {
                what: "face area",
                index: i,
            });
        }
        if (face.normal.norm() - 1.0).abs() > 1e-9 {
            return Err(MeshError::Degenerate {
                what: "face normal",
                index: i,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn unit_cell() -> Cell {
        Cell {
            volume: 1.0,
            centroid: Vector3::zeros(),
        }
    }

    #[test]
    fn rejects_dangling_neighbour() {
        let face = Face {
            owner: 0,
            neighbour: Some(4),
            area: 1.0,
            normal: Vector3::x(),
            centroid: Vector3::zeros(),
        };
        let err = validate_mesh(&[unit_cell()], &[face]).unwrap_err();
        assert!(matches!(err, MeshError::IndexOob { index: 4, .. }));
    }

    #[test]
    fn rejects_zero_volume() {
        let mut cell = unit_cell();
        cell.volume = 0.0;
        assert!(validate_mesh(&[cell], &[]).is_err());
    }
}
