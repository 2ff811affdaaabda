//! Mesh construction and query errors.

use df_core::DfError;
use thiserror::Error;

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors raised while building or validating a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Invalid builder argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Geometry with zero or negative measure.
    #[error("Degenerate {what} at index {index}")]
    Degenerate { what: &'static str, index: usize },

    /// Connectivity refers to a cell that does not exist.
    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

impl From<MeshError> for DfError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::InvalidArg { what } => DfError::InvalidArg { what },
            MeshError::Degenerate { what, .. } => DfError::Invariant { what },
            MeshError::IndexOob { what, index, len } => DfError::IndexOob { what, index, len },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MeshError::Degenerate {
            what: "cell volume",
            index: 3,
        };
        assert!(err.to_string().contains("cell volume"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn error_to_df_error() {
        let err: DfError = MeshError::IndexOob {
            what: "face owner",
            index: 5,
            len: 2,
        }
        .into();
        assert!(matches!(err, DfError::IndexOob { index: 5, len: 2, .. }));
    }
}
