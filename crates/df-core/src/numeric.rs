use crate::DfError;

/// Scalar type for every field and coefficient.
pub type Real = f64;

/// Smallest magnitude treated as non-zero in divisions and log arguments.
pub const SMALL: Real = 1e-15;

/// Default abs/rel pair used by field comparisons.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, DfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DfError::NonFinite { what, value: v })
    }
}

/// Ensure `v` is finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, DfError> {
    let v = ensure_finite(v, what)?;
    if v <= 0.0 {
        return Err(DfError::InvalidArg { what });
    }
    Ok(v)
}

/// Clamp `v` into `[lo, hi]`, reporting whether it was moved.
#[inline]
pub fn clip(v: Real, lo: Real, hi: Real) -> (Real, bool) {
    if v < lo {
        (lo, true)
    } else if v > hi {
        (hi, true)
    } else {
        (v, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero() {
        assert!(ensure_positive(1.0, "x").is_ok());
        assert!(matches!(
            ensure_positive(0.0, "x"),
            Err(DfError::InvalidArg { .. })
        ));
    }

    #[test]
    fn clip_reports_movement() {
        assert_eq!(clip(0.5, 0.0, 1.0), (0.5, false));
        assert_eq!(clip(-0.1, 0.0, 1.0), (0.0, true));
        assert_eq!(clip(1.5, 0.0, 1.0), (1.0, true));
    }
}
