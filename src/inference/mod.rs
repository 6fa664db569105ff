//! inference — standard errors, test statistics, and intervals.
//!
//! Purpose
//! -------
//! Post-estimation tools shared by the 2SLS, FactorialIV, and MSM
//! estimators: covariance matrices from information matrices, and the
//! p-values and confidence intervals reported alongside each estimate.
//!
//! Key behaviors
//! -------------
//! - [`hessian`]: eigen-truncated pseudo-inverses and covariance matrices
//!   from finite-difference Hessians of maximized objectives.
//! - [`distributions`]: Normal, Student-t and Fisher p-values, Normal
//!   critical values, symmetric confidence intervals.
//! - [`errors`]: [`InferenceError`] and [`InferenceResult`].
//!
//! Conventions
//! -----------
//! - All functions are pure: no logging, no global state, no `unsafe`.
//!   Failures are reported via [`InferenceResult`] only.

pub mod distributions;
pub mod errors;
pub mod hessian;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::distributions::{
    confidence_interval, normal_critical_value, pvalue_fisher, pvalue_normal, pvalue_students_t,
    t_statistic,
};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::hessian::{covariance_from_gradient, pseudo_inverse, standard_errors};

pub mod prelude {
    pub use super::distributions::{confidence_interval, normal_critical_value};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::hessian::{covariance_from_gradient, standard_errors};
}
