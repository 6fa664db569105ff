//! factorial_iv — causal effects of several randomized encouragements.
//!
//! Purpose
//! -------
//! Estimate complier average factorial effects when each of `K` binary
//! treatments is encouraged by its own binary instrument and units may
//! comply with some encouragements but not others.
//!
//! Key behaviors
//! -------------
//! - [`compliance`]: joint compliance types and the index conventions for
//!   patterns, cells, and outcome parameters.
//! - [`matrices`]: the structural matrices `A` (types consistent with each
//!   observed cell) and `B` (outcome parameters contributing to each cell).
//! - [`moments`]: the moment system and its two solvers.
//! - [`effects`]: MCAFE and PCAFE per factor.
//! - [`model`]: [`FactorialIV`], the fitted estimator with `summary` and
//!   `tidy` reports.
//!
//! Invariants & assumptions
//! ------------------------
//! - Monotonicity holds factor by factor (no defiers), and each instrument
//!   affects the outcome only through its own treatment.
//! - `1 ≤ K ≤` [`compliance::MAX_FACTORS`].

pub mod compliance;
pub mod effects;
pub mod errors;
pub mod matrices;
pub mod model;
pub mod moments;
pub mod options;

pub use self::compliance::{ComplianceType, FactorialGrid, MAX_FACTORS};
pub use self::effects::{EffectEstimates, EffectVariance, Estimand};
pub use self::errors::{FactorialIvError, FactorialIvResult, MomentBlock};
pub use self::matrices::StructuralMatrices;
pub use self::model::{FactorialIV, FactorialIvSummary, SummaryRow, TidyRow};
pub use self::moments::{MomentEstimate, MomentSystem};
pub use self::options::{
    DEFAULT_DEGENERATE_TOL, FactorialIvOptions, MomentSolver, moment_mle_options,
};
