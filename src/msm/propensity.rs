//! msm::propensity — logistic model of treatment assignment.
//!
//! Purpose
//! -------
//! Estimate `e(x) = P(T = 1 | x)` by maximum likelihood so the outcome
//! regression can be reweighted toward the population that would be seen
//! under randomized treatment.
//!
//! Key behaviors
//! -------------
//! - [`LogisticLikelihood`] is the mean Bernoulli log-likelihood with an
//!   analytic gradient, maximized through [`maximize`].
//! - Non-intercept columns are standardized before optimizing and the
//!   coefficients are mapped back afterwards.
//! - Standard errors come from the inverse Fisher information
//!   `Xᵀ diag(e(1 − e)) X`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The design is checked for full rank before any optimizer work.
//! - A run that stops without converging is an error; there is no fallback
//!   score.
use crate::{
    inference::hessian::standard_errors,
    msm::errors::{MsmError, MsmResult, MsmStep},
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            Grad, LogLikelihood, MLEOptions, Theta, maximize, validation::validate_theta,
        },
    },
    regression::{DesignMatrix, INTERCEPT, RegressionError, invert_gram},
};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Regressors and 0/1 treatment of the logistic model.
#[derive(Debug, Clone)]
pub struct LogisticData {
    x: Array2<f64>,
    t: Array1<f64>,
}

/// `ℓ(θ) = (1/n) Σ [tᵢ ηᵢ − log(1 + e^{ηᵢ})]`, `η = Xθ`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticLikelihood;

impl LogLikelihood for LogisticLikelihood {
    type Data = LogisticData;

    fn value(&self, theta: &Theta, data: &LogisticData) -> OptResult<f64> {
        let eta = data.x.dot(theta);
        let total: f64 = eta.iter().zip(data.t.iter()).map(|(&e, &t)| t * e - softplus(e)).sum();
        Ok(total / data.t.len() as f64)
    }

    fn check(&self, theta: &Theta, data: &LogisticData) -> OptResult<()> {
        validate_theta(theta, data.x.ncols())
    }

    fn grad(&self, theta: &Theta, data: &LogisticData) -> OptResult<Grad> {
        let resid = &data.t - &data.x.dot(theta).mapv(sigmoid);
        Ok(data.x.t().dot(&resid) / data.t.len() as f64)
    }
}

pub fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

fn softplus(eta: f64) -> f64 {
    eta.max(0.0) + (-eta.abs()).exp().ln_1p()
}

/// Fitted propensity model.
#[derive(Debug, Clone, PartialEq)]
pub struct PropensityFit {
    pub names: Vec<String>,
    pub coef: Array1<f64>,
    pub se: Array1<f64>,
    /// `ê(xᵢ)` for every row, before any bounding.
    pub scores: Array1<f64>,
    /// Total log-likelihood at the optimum.
    pub log_likelihood: f64,
    pub iterations: usize,
}

/// Fit the logistic model of `treatment` on `design`.
///
/// # Errors
/// - [`MsmError::NoTreatmentVariation`] if every unit is treated or none is.
/// - [`MsmError::SingularDesign`] for a rank-deficient design.
/// - [`MsmError::PropensityNotConverged`] if L-BFGS stops early.
/// - [`MsmError::Optimization`] for backend failures.
pub fn fit_propensity(
    design: &DesignMatrix, treatment: ArrayView1<'_, f64>, mle: &MLEOptions,
) -> MsmResult<PropensityFit> {
    let x = design.matrix();
    let n = x.nrows();
    if treatment.len() != n {
        return Err(MsmError::Regression(RegressionError::DimensionMismatch {
            expected: n,
            found: treatment.len(),
        }));
    }
    let treated = treatment.iter().filter(|&&t| t == 1.0).count();
    if treated == 0 || treated == n {
        return Err(MsmError::NoTreatmentVariation { treated, nobs: n });
    }
    let to_err = |err: RegressionError| MsmError::from_regression(MsmStep::Propensity, err);
    invert_gram(&x.t().dot(x), design.names()).map_err(to_err)?;

    let scaling = ColumnScaling::new(x, design.position(INTERCEPT));
    let data = LogisticData { x: scaling.apply(x), t: treatment.to_owned() };
    let outcome = maximize(&LogisticLikelihood, Array1::zeros(x.ncols()), &data, mle)?;
    if !outcome.converged {
        return Err(MsmError::PropensityNotConverged {
            iterations: outcome.iterations,
            status: outcome.status,
        });
    }

    let coef = scaling.unscale(&outcome.theta_hat);
    let scores = x.dot(&coef).mapv(sigmoid);
    let w = scores.mapv(|e| e * (1.0 - e));
    let info = (x * &w.view().insert_axis(Axis(1))).t().dot(x);
    let vcov = invert_gram(&info, design.names()).map_err(to_err)?;

    Ok(PropensityFit {
        names: design.names().to_vec(),
        coef,
        se: standard_errors(&vcov),
        scores,
        log_likelihood: outcome.value * n as f64,
        iterations: outcome.iterations,
    })
}

/// Per-column centring and scaling, intercept untouched.
struct ColumnScaling {
    intercept: Option<usize>,
    mean: Array1<f64>,
    sd: Array1<f64>,
}

impl ColumnScaling {
    fn new(x: &Array2<f64>, intercept: Option<usize>) -> Self {
        let p = x.ncols();
        let mut mean = Array1::<f64>::zeros(p);
        let mut sd = Array1::<f64>::ones(p);
        for j in (0..p).filter(|&j| Some(j) != intercept) {
            let col = x.column(j);
            // Without an intercept only rescale, so the model is unchanged.
            let m = if intercept.is_some() { col.mean().unwrap_or(0.0) } else { 0.0 };
            let s = col.mapv(|v| (v - m).powi(2)).mean().unwrap_or(0.0).sqrt();
            mean[j] = m;
            if s > 0.0 {
                sd[j] = s;
            }
        }
        Self { intercept, mean, sd }
    }

    fn apply(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.clone();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            if Some(j) != self.intercept {
                col.mapv_inplace(|v| (v - self.mean[j]) / self.sd[j]);
            }
        }
        out
    }

    /// Coefficients on the original column scale.
    fn unscale(&self, gamma: &Array1<f64>) -> Array1<f64> {
        let mut beta = gamma / &self.sd;
        if let Some(i) = self.intercept {
            beta[i] = gamma[i];
            let shift: f64 = (0..beta.len())
                .filter(|&j| j != i)
                .map(|j| beta[j] * self.mean[j])
                .sum();
            beta[i] -= shift;
        }
        beta
    }
}
