//! regression::errors — failures of least-squares fits.
//!
//! [`RegressionError`] separates identification failures (rank-deficient
//! designs, too few rows) from plain input mistakes (shape mismatches,
//! invalid weights) and from downstream inference failures. Estimators built
//! on top map these into their own error enums so the stage that failed is
//! part of the message.
use crate::inference::errors::InferenceError;

#[derive(Debug, Clone, PartialEq)]
pub enum RegressionError {
    // ---- Identification ----
    /// Design matrix is not of full column rank.
    SingularDesign { rank: usize, ncols: usize, columns: Vec<String> },
    /// Fewer observations than the fit needs.
    InsufficientData { nobs: usize, required: usize },

    // ---- Inputs ----
    /// Response, design, or weights disagree on the number of rows.
    DimensionMismatch { expected: usize, found: usize },
    /// Regression weights must be finite and strictly positive.
    InvalidWeight { row: usize, value: f64 },

    // ---- Inference ----
    Inference(InferenceError),
}

pub type RegressionResult<T> = Result<T, RegressionError>;

impl std::error::Error for RegressionError {}

impl From<InferenceError> for RegressionError {
    fn from(err: InferenceError) -> Self {
        RegressionError::Inference(err)
    }
}

impl std::fmt::Display for RegressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegressionError::SingularDesign { rank, ncols, columns } => write!(
                f,
                "Singular design: rank {rank} < {ncols} columns [{}]",
                columns.join(", ")
            ),
            RegressionError::InsufficientData { nobs, required } => {
                write!(f, "Insufficient data: {nobs} observations, at least {required} required")
            }
            RegressionError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected} rows, found {found}")
            }
            RegressionError::InvalidWeight { row, value } => {
                write!(f, "Invalid regression weight {value} at row {row}, must be finite and > 0")
            }
            RegressionError::Inference(err) => write!(f, "{err}"),
        }
    }
}
