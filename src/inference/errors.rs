//! Unified error handling for inference routines.
//!
//! `InferenceError` covers invalid test/interval inputs, distribution
//! construction failures from `statrs`, and covariance matrices that cannot
//! be inverted. `InferenceResult<T>` standardizes the return type.
use crate::optimization::errors::OptError;

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Intervals ----
    /// Confidence level must lie strictly between 0 and 1.
    InvalidConfidenceLevel { level: f64 },

    // ---- Test statistics ----
    /// Degrees of freedom must be finite and positive.
    InvalidDegreesOfFreedom { df: f64 },
    /// Standard errors must be finite and non-negative.
    InvalidStandardError { se: f64 },
    /// `statrs` rejected the distribution parameters.
    Distribution { text: String },

    // ---- Covariance ----
    /// Matrix expected to be square.
    NotSquare { rows: usize, cols: usize },
    /// No eigenvalue of the information matrix exceeded the tolerance.
    NoInformation,
    /// Hessian evaluation failed.
    Hessian(OptError),
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Hessian(err)
    }
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Intervals ----
            InferenceError::InvalidConfidenceLevel { level } => {
                write!(f, "Inference Error: confidence level {level} must lie in (0, 1)")
            }

            // ---- Test statistics ----
            InferenceError::InvalidDegreesOfFreedom { df } => {
                write!(f, "Inference Error: degrees of freedom {df} must be finite and > 0")
            }
            InferenceError::InvalidStandardError { se } => {
                write!(f, "Inference Error: standard error {se} must be finite and >= 0")
            }
            InferenceError::Distribution { text } => {
                write!(f, "Inference Error: invalid distribution parameters ({text})")
            }

            // ---- Covariance ----
            InferenceError::NotSquare { rows, cols } => {
                write!(f, "Inference Error: expected a square matrix, got {rows}x{cols}")
            }
            InferenceError::NoInformation => {
                write!(f, "Inference Error: information matrix has no positive eigenvalues")
            }
            InferenceError::Hessian(err) => write!(f, "Inference Error: {err}"),
        }
    }
}
