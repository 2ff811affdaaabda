//! df-mesh: read-only finite-volume geometry for detonflow.
//!
//! Provides:
//! - Cell and face geometry (volume, centroid, area, unit normal)
//! - Owner/neighbour face connectivity (boundary faces have no neighbour)
//! - Structured box builder for 1-D, 2-D and 3-D cases
//! - Spatial queries used by detonation points (nearest cell, cells in radius)
//!
//! # Example
//!
//! ```
//! use df_mesh::MeshBuilder;
//!
//! let mesh = MeshBuilder::structured_box([10, 1, 1], [0.0, 0.0, 0.0], [1.0, 0.1, 0.1])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(mesh.n_cells(), 10);
//! assert_eq!(mesh.n_internal_faces(), 9);
//! ```

pub mod builder;
pub mod error;
pub mod mesh;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::MeshBuilder;
pub use error::{MeshError, MeshResult};
pub use mesh::{Cell, Face, Mesh};
pub use nalgebra::Vector3;
