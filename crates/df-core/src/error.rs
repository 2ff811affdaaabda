//! Error type shared by every detonflow crate.

use thiserror::Error;

pub type DfResult<T> = Result<T, DfError>;

/// Failures of the numeric helpers; domain crates convert to and from it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DfError {
    #[error("{what} is not finite (got {value})")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A cell, face or stage index past the end of its container.
    #[error("{what}: index {index} out of range for length {len}")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_message_names_both_bounds() {
        let msg = DfError::IndexOob {
            what: "cell",
            index: 7,
            len: 4,
        }
        .to_string();
        assert_eq!(msg, "cell: index 7 out of range for length 4");
    }
}
