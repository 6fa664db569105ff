//! msm::errors — failures of the IPTW marginal structural model.
use crate::{
    data::DataError, inference::InferenceError, optimization::errors::OptError,
    regression::RegressionError,
};

/// Regression inside an MSM fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsmStep {
    /// Logistic model of the treatment.
    Propensity,
    /// Weighted outcome regression.
    Outcome,
}

impl std::fmt::Display for MsmStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsmStep::Propensity => write!(f, "propensity model"),
            MsmStep::Outcome => write!(f, "outcome model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MsmError {
    // ---- Identification ----
    SingularDesign { step: MsmStep, rank: usize, ncols: usize, columns: Vec<String> },
    InsufficientData { nobs: usize, required: usize },
    /// All units treated or all untreated.
    NoTreatmentVariation { treated: usize, nobs: usize },

    // ---- Estimation ----
    /// Logistic likelihood maximization stopped without converging.
    PropensityNotConverged { iterations: usize, status: String },
    /// Fitted propensity outside `[trim, 1 − trim]` with clipping disabled.
    PropensityOutOfBounds { row: usize, value: f64, trim: f64 },

    // ---- Formula / options ----
    OverlappingRoles { name: String },
    InvalidTrim { trim: f64 },

    // ---- Wrapped ----
    Data(DataError),
    Optimization(OptError),
    Inference(InferenceError),
    Regression(RegressionError),
}

pub type MsmResult<T> = Result<T, MsmError>;

impl std::error::Error for MsmError {}

impl MsmError {
    /// Attach `step` to a regression failure.
    pub fn from_regression(step: MsmStep, err: RegressionError) -> Self {
        match err {
            RegressionError::SingularDesign { rank, ncols, columns } => {
                MsmError::SingularDesign { step, rank, ncols, columns }
            }
            RegressionError::InsufficientData { nobs, required } => {
                MsmError::InsufficientData { nobs, required }
            }
            other => MsmError::Regression(other),
        }
    }
}

impl From<DataError> for MsmError {
    fn from(err: DataError) -> Self {
        MsmError::Data(err)
    }
}

impl From<OptError> for MsmError {
    fn from(err: OptError) -> Self {
        MsmError::Optimization(err)
    }
}

impl From<InferenceError> for MsmError {
    fn from(err: InferenceError) -> Self {
        MsmError::Inference(err)
    }
}

impl std::fmt::Display for MsmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsmError::SingularDesign { step, rank, ncols, columns } => write!(
                f,
                "Singular design in {step}: rank {rank} < {ncols} columns [{}]",
                columns.join(", ")
            ),
            MsmError::InsufficientData { nobs, required } => {
                write!(f, "Insufficient data: {nobs} observations, at least {required} required")
            }
            MsmError::NoTreatmentVariation { treated, nobs } => {
                write!(f, "Treatment does not vary: {treated} of {nobs} units treated")
            }
            MsmError::PropensityNotConverged { iterations, status } => write!(
                f,
                "Propensity model did not converge after {iterations} iterations (status {status})"
            ),
            MsmError::PropensityOutOfBounds { row, value, trim } => write!(
                f,
                "Propensity {value:.3e} at row {row} outside [{trim}, {}]",
                1.0 - trim
            ),
            MsmError::OverlappingRoles { name } => {
                write!(f, "Column '{name}' is used in more than one role")
            }
            MsmError::InvalidTrim { trim } => {
                write!(f, "Propensity trim must lie in [0, 0.5), got {trim}")
            }
            MsmError::Data(err) => write!(f, "{err}"),
            MsmError::Optimization(err) => write!(f, "{err}"),
            MsmError::Inference(err) => write!(f, "{err}"),
            MsmError::Regression(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<MsmError> for pyo3::PyErr {
    fn from(err: MsmError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
