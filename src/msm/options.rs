//! msm::options — configuration for IPTW fits.
use crate::{
    msm::errors::{MsmError, MsmResult},
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};

/// Default propensity bound: scores must lie in `[0.001, 0.999]`.
pub const DEFAULT_TRIM: f64 = 1e-3;

/// Handling of propensities outside `[trim, 1 − trim]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trimming {
    /// Fail the fit with [`MsmError::PropensityOutOfBounds`].
    #[default]
    Reject,
    /// Clip to the nearest bound.
    Clip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MsmOptions {
    pub trim: f64,
    pub trimming: Trimming,
    /// Multiply weights by the marginal probability of the received arm.
    pub stabilize: bool,
    /// Logistic likelihood maximization.
    pub mle: MLEOptions,
}

impl MsmOptions {
    /// # Errors
    /// - [`MsmError::InvalidTrim`] unless `0 ≤ trim < 0.5`.
    pub fn new(trim: f64, trimming: Trimming, stabilize: bool, mle: MLEOptions) -> MsmResult<Self> {
        if !(trim.is_finite() && (0.0..0.5).contains(&trim)) {
            return Err(MsmError::InvalidTrim { trim });
        }
        Ok(Self { trim, trimming, stabilize, mle })
    }
}

/// L-BFGS settings for the logistic likelihood.
pub fn propensity_mle_options() -> MLEOptions {
    MLEOptions {
        tols: Tolerances { tol_grad: Some(1e-8), tol_cost: None, max_iter: Some(500) },
        line_searcher: LineSearcher::MoreThuente,
        verbose: false,
        lbfgs_mem: None,
    }
}

impl Default for MsmOptions {
    fn default() -> Self {
        Self {
            trim: DEFAULT_TRIM,
            trimming: Trimming::Reject,
            stabilize: false,
            mle: propensity_mle_options(),
        }
    }
}
