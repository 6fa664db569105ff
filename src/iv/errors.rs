//! iv::errors — failures of two-stage least squares.
//!
//! Identification failures carry the [`Stage`] in which they occurred so
//! stratified runs can report *why* a stratum failed, not just that it did.
use crate::{
    data::DataError,
    inference::InferenceError,
    regression::RegressionError,
};

/// Regression stage of a 2SLS fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Treatment on instruments and controls.
    First,
    /// Outcome on fitted treatment and controls.
    Second,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::First => write!(f, "first stage"),
            Stage::Second => write!(f, "second stage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IvError {
    // ---- Identification ----
    SingularDesign { stage: Stage, rank: usize, ncols: usize, columns: Vec<String> },
    InsufficientData { nobs: usize, required: usize },

    // ---- Formula / options ----
    NoInstruments,
    OverlappingRoles { name: String },
    InvalidStrength { min_f: f64, max_p: f64 },
    DimensionMismatch { expected: usize, found: usize },

    // ---- Wrapped ----
    Data(DataError),
    Inference(InferenceError),
    Regression(RegressionError),
}

pub type IvResult<T> = Result<T, IvError>;

impl std::error::Error for IvError {}

impl IvError {
    /// Attach `stage` to a regression failure.
    pub fn from_regression(stage: Stage, err: RegressionError) -> Self {
        match err {
            RegressionError::SingularDesign { rank, ncols, columns } => {
                IvError::SingularDesign { stage, rank, ncols, columns }
            }
            RegressionError::InsufficientData { nobs, required } => {
                IvError::InsufficientData { nobs, required }
            }
            RegressionError::DimensionMismatch { expected, found } => {
                IvError::DimensionMismatch { expected, found }
            }
            RegressionError::Inference(err) => IvError::Inference(err),
            other => IvError::Regression(other),
        }
    }
}

impl From<DataError> for IvError {
    fn from(err: DataError) -> Self {
        IvError::Data(err)
    }
}

impl From<InferenceError> for IvError {
    fn from(err: InferenceError) -> Self {
        IvError::Inference(err)
    }
}

impl std::fmt::Display for IvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IvError::SingularDesign { stage, rank, ncols, columns } => write!(
                f,
                "Singular design in {stage}: rank {rank} < {ncols} columns [{}]",
                columns.join(", ")
            ),
            IvError::InsufficientData { nobs, required } => {
                write!(f, "Insufficient data: {nobs} observations, at least {required} required")
            }
            IvError::NoInstruments => write!(f, "At least one instrument is required"),
            IvError::OverlappingRoles { name } => {
                write!(f, "Column '{name}' is assigned to more than one role")
            }
            IvError::InvalidStrength { min_f, max_p } => write!(
                f,
                "Invalid instrument-strength threshold: min_f = {min_f} must be >= 0, \
                 max_p = {max_p} must be in (0, 1]"
            ),
            IvError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected} rows, found {found}")
            }
            IvError::Data(err) => write!(f, "{err}"),
            IvError::Inference(err) => write!(f, "{err}"),
            IvError::Regression(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<IvError> for pyo3::PyErr {
    fn from(err: IvError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
