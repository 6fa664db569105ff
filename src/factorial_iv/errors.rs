//! factorial_iv::errors — failures of the factorial IV estimator.
//!
//! Every failure inside a fit is fatal to that fit: the compliance-type
//! shares and outcome parameters are estimated jointly, so a partial result
//! is never returned.
use crate::{
    data::DataError,
    factorial_iv::effects::Estimand,
    inference::InferenceError,
    optimization::errors::OptError,
    regression::RegressionError,
};

/// Parameter block of the moment system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentBlock {
    /// Compliance-type shares `ρ`.
    Rho,
    /// Outcome parameters `ψ`.
    Psi,
}

impl std::fmt::Display for MomentBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MomentBlock::Rho => write!(f, "rho"),
            MomentBlock::Psi => write!(f, "psi"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FactorialIvError {
    // ---- Inputs ----
    /// Outcome, treatment, and instrument disagree on rows, or treatment
    /// and instrument disagree on the number of factors.
    DimensionMismatch { what: &'static str, expected: usize, found: usize },
    /// Treatment and instrument entries must be 0 or 1.
    NotBinary { what: &'static str, row: usize, col: usize, value: f64 },
    /// Outcome entries must be finite.
    NonFiniteOutcome { row: usize, value: f64 },
    /// Number of factors outside `1..=max`.
    InvalidFactorCount { k: usize, max: usize },
    InsufficientData { nobs: usize, required: usize },

    // ---- Options ----
    InvalidDegenerateTol { tol: f64 },

    // ---- Estimation ----
    /// Moment block is not identified, typically because an instrument
    /// pattern never occurs.
    SingularDesign { block: MomentBlock, rank: usize, ncols: usize },
    /// Iterative solver stopped without meeting its convergence criteria.
    OptimizationDiverged {
        iterations: usize,
        residual_norm: f64,
        status: String,
        last_iterate: Vec<f64>,
    },
    /// Effect denominator is zero or numerically indistinguishable from it.
    DegenerateEffect { estimand: Estimand, factor: usize, denominator: f64 },

    // ---- Wrapped ----
    Data(DataError),
    Optimization(OptError),
    Inference(InferenceError),
    Regression(RegressionError),
}

pub type FactorialIvResult<T> = Result<T, FactorialIvError>;

impl std::error::Error for FactorialIvError {}

impl From<DataError> for FactorialIvError {
    fn from(err: DataError) -> Self {
        FactorialIvError::Data(err)
    }
}

impl From<OptError> for FactorialIvError {
    fn from(err: OptError) -> Self {
        FactorialIvError::Optimization(err)
    }
}

impl From<InferenceError> for FactorialIvError {
    fn from(err: InferenceError) -> Self {
        FactorialIvError::Inference(err)
    }
}

impl std::fmt::Display for FactorialIvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorialIvError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch in {what}: expected {expected}, found {found}")
            }
            FactorialIvError::NotBinary { what, row, col, value } => {
                write!(f, "{what} must be 0/1: found {value} at row {row}, column {col}")
            }
            FactorialIvError::NonFiniteOutcome { row, value } => {
                write!(f, "Outcome must be finite: found {value} at row {row}")
            }
            FactorialIvError::InvalidFactorCount { k, max } => {
                write!(f, "Number of factors must be between 1 and {max}, got {k}")
            }
            FactorialIvError::InsufficientData { nobs, required } => {
                write!(f, "Insufficient data: {nobs} observations, at least {required} required")
            }
            FactorialIvError::InvalidDegenerateTol { tol } => {
                write!(f, "Degenerate-effect tolerance must be finite and >= 0, got {tol}")
            }
            FactorialIvError::SingularDesign { block, rank, ncols } => write!(
                f,
                "Singular moment design for {block}: rank {rank} < {ncols} parameters \
                 (is every instrument pattern observed?)"
            ),
            FactorialIvError::OptimizationDiverged { iterations, residual_norm, status, .. } => {
                write!(
                    f,
                    "Moment optimization did not converge after {iterations} iterations \
                     (residual norm {residual_norm:.6e}, status {status})"
                )
            }
            FactorialIvError::DegenerateEffect { estimand, factor, denominator } => write!(
                f,
                "Degenerate {estimand} for factor {factor}: denominator {denominator:e} is \
                 numerically zero"
            ),
            FactorialIvError::Data(err) => write!(f, "{err}"),
            FactorialIvError::Optimization(err) => write!(f, "{err}"),
            FactorialIvError::Inference(err) => write!(f, "{err}"),
            FactorialIvError::Regression(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<FactorialIvError> for pyo3::PyErr {
    fn from(err: FactorialIvError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
