//! High-level entrypoint: maximize an objective with L-BFGS.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize `f` starting from `theta0`.
///
/// Calls [`LogLikelihood::check`] once, builds the L-BFGS solver for the
/// configured line search, and runs it.
///
/// # Errors
/// - Whatever `check` rejects.
/// - Invalid tolerances for argmin, backend failures, or a non-finite
///   optimum, all as [`OptError`](crate::optimization::errors::OptError).
///
/// A run that stops at the iteration cap is returned as `Ok` with
/// `converged = false`; refusing such an estimate is the caller's decision.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
