//! factorial_iv::options — solver and inference settings for FactorialIV.
//!
//! [`FactorialIvOptions`] chooses between the normal-equation solver and
//! L-BFGS, the effect standard-error formula, and the tolerance below which
//! an effect denominator counts as zero. The L-BFGS settings reuse
//! [`MLEOptions`]; the defaults here are tighter than the optimizer's own
//! because both solvers are expected to agree to `1e-6` relative.
use crate::{
    factorial_iv::{
        effects::EffectVariance,
        errors::{FactorialIvError, FactorialIvResult},
    },
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

/// Default `|denominator|` below which an effect is degenerate.
pub const DEFAULT_DEGENERATE_TOL: f64 = 1e-10;

/// How `(ρ, ψ)` are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MomentSolver {
    /// Normal equations of each block.
    #[default]
    ClosedForm,
    /// L-BFGS on the quasi-likelihood from the zero vector.
    Lbfgs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorialIvOptions {
    pub solver: MomentSolver,
    pub effect_variance: EffectVariance,
    pub degenerate_tol: f64,
    /// Only used by [`MomentSolver::Lbfgs`].
    pub mle: MLEOptions,
}

impl FactorialIvOptions {
    /// # Errors
    /// - [`FactorialIvError::InvalidDegenerateTol`] unless `degenerate_tol`
    ///   is finite and non-negative.
    pub fn new(
        solver: MomentSolver, effect_variance: EffectVariance, degenerate_tol: f64,
        mle: MLEOptions,
    ) -> FactorialIvResult<Self> {
        if !(degenerate_tol.is_finite() && degenerate_tol >= 0.0) {
            return Err(FactorialIvError::InvalidDegenerateTol { tol: degenerate_tol });
        }
        Ok(Self { solver, effect_variance, degenerate_tol, mle })
    }

    /// Defaults with the given solver.
    pub fn with_solver(solver: MomentSolver) -> Self {
        Self { solver, ..Self::default() }
    }
}

/// L-BFGS settings for the moment problem.
///
/// The cost-change criterion is set to the smallest positive tolerance so
/// that only the gradient norm (or an exact stall) ends a run.
pub fn moment_mle_options() -> MLEOptions {
    MLEOptions {
        tols: Tolerances { tol_grad: Some(1e-11), tol_cost: Some(1e-300), max_iter: Some(2000) },
        line_searcher: LineSearcher::HagerZhang,
        verbose: false,
        lbfgs_mem: Some(20),
    }
}

impl Default for FactorialIvOptions {
    fn default() -> Self {
        Self {
            solver: MomentSolver::ClosedForm,
            effect_variance: EffectVariance::FixedDenominator,
            degenerate_tol: DEFAULT_DEGENERATE_TOL,
            mle: moment_mle_options(),
        }
    }
}
