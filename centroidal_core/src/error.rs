// centroidal_core/src/error.rs

use thiserror::Error;

/// A numerical failure inside the linearization or the Riccati recursion.
///
/// These indicate a modeling or configuration defect (singular inertia, an
/// input cost `R` that is not positive definite) and are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericalError {
    /// `R + B̄ᵀ P B̄` could not be factored at trajectory index `step`.
    #[error("input Hessian R + BᵀPB is singular or not positive definite at step {step}")]
    SingularInputHessian { step: usize },

    /// The (possibly rotated) inertia tensor has no inverse.
    #[error("inertia tensor is singular")]
    SingularInertia,

    /// A gain or cost-to-go entry became NaN or infinite.
    #[error("non-finite {what} at step {step}")]
    NonFinite { what: &'static str, step: usize },
}

/// Malformed input data, detected before any computation starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("trajectory needs at least {required} samples, got {actual}")]
    TooShort { required: usize, actual: usize },

    #[error("series '{series}' has {actual} samples, expected {expected}")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("non-finite value in '{series}' at sample {index}")]
    NonFinite { series: &'static str, index: usize },

    #[error("zero-norm quaternion at sample {index}")]
    DegenerateQuaternion { index: usize },

    #[error("{name} must be {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    Dimension {
        name: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("trajectory index {index} out of range for horizon {horizon}")]
    IndexOutOfRange { index: usize, horizon: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// The umbrella error returned by every fallible operation of this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LqrError {
    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

pub type Result<T> = std::result::Result<T, LqrError>;
