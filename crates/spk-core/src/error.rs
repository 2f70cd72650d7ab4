use thiserror::Error;

/// Errors raised when an input violates a stated invariant or when derived
/// quantities disagree with declared ones beyond tolerance.
///
/// Numerical-regime events (evanescent horn operation, near-singular
/// impedances) are *not* errors; they are absorbed locally and reported on
/// the response bundle as [`crate::response::Diagnostic`] entries.
#[derive(Debug, Error)]
pub enum AcousticError {
    /// An input parameter is outside its valid domain.
    #[error("domain error: {name} = {value} ({reason})")]
    Domain {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The frequency grid is empty, non-positive, or not strictly increasing.
    #[error("frequency grid must be non-empty, positive, and strictly increasing")]
    NonMonotonicGrid,

    /// A derived quantity disagrees with its declared value beyond tolerance.
    /// Both values are surfaced so the caller can see the discrepancy.
    #[error(
        "geometry inconsistency: {what} declared {declared:.4} but computed {computed:.4} \
         (tolerance {tolerance})"
    )]
    GeometryInconsistency {
        what: &'static str,
        declared: f64,
        computed: f64,
        tolerance: f64,
    },
}

impl AcousticError {
    /// Shorthand for a positivity check on a named parameter.
    pub fn require_positive(name: &'static str, value: f64) -> Result<(), AcousticError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(AcousticError::Domain {
                name,
                value,
                reason: "must be positive and finite",
            })
        }
    }

    /// Shorthand for a non-negativity check on a named parameter.
    pub fn require_non_negative(name: &'static str, value: f64) -> Result<(), AcousticError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(AcousticError::Domain {
                name,
                value,
                reason: "must be non-negative and finite",
            })
        }
    }
}
