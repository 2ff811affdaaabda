//! Integration tests: structured box geometry and spatial queries.

use df_mesh::{MeshBuilder, Vector3};
use proptest::prelude::*;

#[test]
fn face_normals_point_from_owner_to_neighbour() {
    let mesh = MeshBuilder::structured_box([4, 3, 2], [0.0; 3], [4.0, 3.0, 2.0])
        .build()
        .unwrap();
    for face in mesh.internal_faces() {
        let n = face.neighbour.unwrap();
        let d = mesh.cells()[n].centroid - mesh.cells()[face.owner].centroid;
        assert!(d.dot(&face.normal) > 0.0);
    }
}

#[test]
fn closed_cells_have_zero_net_area_vector() {
    let mesh = MeshBuilder::structured_box([3, 3, 3], [0.0; 3], [1.0; 3])
        .build()
        .unwrap();
    let mut sum = vec![Vector3::zeros(); mesh.n_cells()];
    for face in mesh.faces() {
        sum[face.owner] += face.area_vector();
        if let Some(n) = face.neighbour {
            sum[n] -= face.area_vector();
        }
    }
    for s in sum {
        assert!(s.norm() < 1e-12);
    }
}

#[test]
fn bounds_span_cell_centres() {
    let mesh = MeshBuilder::structured_box([10, 1, 1], [0.0; 3], [1.0, 0.1, 0.1])
        .build()
        .unwrap();
    let (lo, hi) = mesh.bounds();
    assert!((lo.x - 0.05).abs() < 1e-12);
    assert!((hi.x - 0.95).abs() < 1e-12);
}

proptest! {
    #[test]
    fn nearest_cell_is_within_radius_query(x in 0.0_f64..1.0, r in 0.0_f64..0.3) {
        let mesh = MeshBuilder::structured_box([20, 1, 1], [0.0; 3], [1.0, 0.05, 0.05])
            .build()
            .unwrap();
        let p = Vector3::new(x, 0.025, 0.025);
        let nearest = mesh.nearest_cell(&p).unwrap();
        let d = (mesh.cells()[nearest].centroid - p).norm();
        let within = mesh.cells_within(&p, (d * (1.0 + 1e-9)).max(r));
        prop_assert!(within.contains(&nearest));
    }
}
