//! Error types for the parameter space.

use thiserror::Error;

/// Errors raised while building or mutating a parameter space.
///
/// Construction is all-or-nothing: an operation that returns one of these
/// leaves no partially built object behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamSpaceError {
    /// Lower bound exceeds upper bound (or a law needs a non-empty range).
    #[error("invalid bounds: min ({min}) must be below max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    /// The parameter lacks the bounds a uniform law is defined over.
    #[error("parameter '{0}' has no bounds to define a uniform law over")]
    InvalidParameter(String),

    /// Standard deviation must be strictly positive.
    #[error("standard deviation must be positive (got {0})")]
    InvalidStdDev(f64),

    /// A parameter with this name is already registered.
    #[error("parameter '{0}' already exists")]
    DuplicateParameter(String),

    /// The unordered pair already carries a relation.
    #[error("a relation between '{first}' and '{second}' already exists")]
    DuplicateRelation { first: String, second: String },

    /// The parameter is not registered in this space.
    #[error("parameter '{0}' is not registered in this space")]
    UnknownParameter(String),

    /// A relation needs two distinct parameters.
    #[error("uncertainty relation needs two different parameters (got '{0}' twice)")]
    SameParameter(String),

    /// Relation constant must be non-negative.
    #[error("uncertainty constant cannot be negative (got {0})")]
    NegativeConstant(f64),

    /// NaN or infinity surfaced from an input or a computation.
    #[error("invalid numeric value: {0}")]
    InvalidNumeric(String),

    /// Rejection sampling gave up before a draw landed inside the bounds.
    #[error("no sample landed in [{min}, {max}] after {attempts} attempts")]
    SamplingExhausted { attempts: u32, min: f64, max: f64 },

    /// The distribution was built for a different parameter.
    #[error("distribution is not owned by parameter '{0}'")]
    DistributionMismatch(String),

    /// The operation needs a distribution and the parameter has none.
    #[error("parameter '{0}' has no distribution")]
    MissingDistribution(String),

    /// Widening the adjustable laws could not satisfy every relation.
    #[error("{remaining} uncertainty relation(s) remain unsatisfied after adjustment")]
    AdjustmentFailed { remaining: usize },

    /// A constrained assignment would break at least one relation.
    #[error("assigning this distribution to '{parameter}' violates {violations} relation(s)")]
    WouldViolate { parameter: String, violations: usize },
}

/// Reject NaN and infinities, naming the offending quantity.
pub(crate) fn ensure_finite(what: &str, value: f64) -> Result<f64, ParamSpaceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParamSpaceError::InvalidNumeric(format!("{what} = {value}")))
    }
}
