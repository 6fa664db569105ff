//! optimization — L-BFGS objective maximization and its error surface.
//!
//! Purpose
//! -------
//! Wrap argmin so the estimators can maximize smooth objectives without
//! touching solver generics, and report every configuration, numerical, or
//! backend failure as one [`errors::OptError`].
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; outcomes are
//!   reported in terms of `ℓ`.
//! - Parameters, gradients, and Hessians use the `ndarray` aliases in
//!   [`loglik_optimizer::types`].
//! - This module writes nothing to stdout. Progress reporting exists only
//!   behind the `obs_slog` feature.

pub mod errors;
pub mod loglik_optimizer;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
