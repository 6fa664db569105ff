//! loglik_optimizer — argmin-backed L-BFGS maximizer for estimator objectives.
//!
//! Purpose
//! -------
//! Give the estimators a single way to maximize a smooth objective `ℓ(θ)`:
//! the logistic log-likelihood of the propensity model and the Gaussian
//! quasi-likelihood of the FactorialIV moment system. Callers implement
//! [`LogLikelihood`] and call [`maximize`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the argmin cost
//!   `c(θ) = -ℓ(θ)` and supplies finite-difference gradients when the
//!   objective has no analytic one.
//! - [`builders`] creates L-BFGS with More–Thuente or Hager–Zhang line
//!   search; [`run::run_lbfgs`] executes it under an iteration cap.
//! - [`finite_diff::compute_hessian`] differentiates a gradient map for
//!   covariance estimation after the fit.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives report invalid inputs as [`OptError`](crate::optimization::errors::OptError),
//!   never by panicking.
//! - [`OptimOutcome::converged`] is `true` only when a tolerance was met.
//!   Estimators must check it; an estimate from a capped run is never
//!   returned as if it had converged.
//!
//! Testing notes
//! -------------
//! - Unit tests cover sign conventions, finite-difference fallbacks,
//!   tolerance validation, and convergence on quadratics.
//! - Estimator modules test the optimizer end to end (closed form vs
//!   L-BFGS agreement, logistic propensity fits).

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
