//! Error types for simulation operations.

use df_mesh::MeshError;
use df_thermo::ThermoError;
use thiserror::Error;

/// Errors encountered while integrating a system.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {what}")]
    Config { what: &'static str },

    #[error("Slot {stage} of {field} is not allocated")]
    UnallocatedSlot { field: &'static str, stage: usize },

    #[error("Slot {stage} of {field} has not been written this step")]
    EmptySlot { field: &'static str, stage: usize },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Thermodynamic closure error: {0}")]
    Thermo(#[from] ThermoError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<df_core::DfError> for SimError {
    fn from(e: df_core::DfError) -> Self {
        match e {
            df_core::DfError::NonFinite { what, .. } => SimError::NonPhysical { what },
            df_core::DfError::InvalidArg { what } => SimError::InvalidArg { what },
            df_core::DfError::IndexOob { what, .. } => SimError::InvalidArg { what },
            df_core::DfError::Invariant { what } => SimError::NonPhysical { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_errors_name_field_and_stage() {
        let err = SimError::EmptySlot {
            field: "alpha",
            stage: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("alpha") && msg.contains('2'));
    }

    #[test]
    fn thermo_errors_convert() {
        let err: SimError = ThermoError::NonPhysical { what: "density" }.into();
        assert!(matches!(err, SimError::Thermo(_)));
    }
}
