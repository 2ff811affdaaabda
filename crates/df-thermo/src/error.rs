//! Thermodynamic closure errors.

use df_core::DfError;
use thiserror::Error;

/// Result type for closure operations.
pub type ThermoResult<T> = Result<T, ThermoError>;

/// Errors that can occur while evaluating equations of state, calorics or tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThermoError {
    /// Non-physical values (negative density, non-finite energy, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid model parameter or argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Temperature inversion did not converge.
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },

    /// Malformed lookup table.
    #[error("Lookup table error: {what}")]
    Table { what: &'static str },

    /// Failure reading a table file.
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<ThermoError> for DfError {
    fn from(err: ThermoError) -> Self {
        match err {
            ThermoError::NonPhysical { what } => DfError::Invariant { what },
            ThermoError::InvalidArg { what } => DfError::InvalidArg { what },
            ThermoError::ConvergenceFailed { what } => DfError::Invariant { what },
            ThermoError::Table { what } => DfError::InvalidArg { what },
            ThermoError::Io { .. } => DfError::Invariant {
                what: "thermo table I/O failed",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ThermoError::NonPhysical { what: "density" };
        assert!(err.to_string().contains("density"));

        let err = ThermoError::Io {
            message: "no such file".into(),
        };
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn error_to_df_error() {
        let err: DfError = ThermoError::Table { what: "too few points" }.into();
        assert!(matches!(err, DfError::InvalidArg { .. }));
    }
}
