//! df-core: numeric foundation shared by the detonflow crates.
//!
//! Contains:
//! - numeric (`Real`, tolerance comparison, finiteness checks, clipping)
//! - units (uom quantities used when reporting properties, reference constants)
//! - error (`DfError`, converted into each crate's own error type)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports for ergonomics
pub use error::{DfError, DfResult};
pub use numeric::*;
pub use units::*;
