//! regression::ols — ordinary and weighted least squares.
//!
//! Purpose
//! -------
//! Fit `y = Xβ + ε` by solving the normal equations, then attach classical
//! inference: homoskedastic covariance `σ̂²(XᵀX)⁻¹`, Student-t statistics and
//! two-sided p-values on `n − p` degrees of freedom, and the F statistics
//! needed by instrument-strength diagnostics.
//!
//! Key behaviors
//! -------------
//! - [`fit_ols`] and [`fit_wls`] return an [`OlsFit`] holding coefficients,
//!   standard errors, residuals, fitted values, and sums of squares.
//! - [`OlsFit::overall_f`] tests every non-intercept coefficient jointly.
//! - [`OlsFit::partial_f`] compares this fit with a nested restricted model
//!   through the residual sums of squares.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least `p + 1` rows are required so that `σ̂²` is defined.
//! - `R² = 0` when the response has no variation (`TSS = 0`).
//! - Weighted fits report weighted sums of squares; residuals and fitted
//!   values stay on the original scale.
use crate::{
    inference::{
        distributions::{pvalue_fisher, pvalue_students_t, t_statistic},
        hessian::standard_errors,
    },
    regression::{
        design::{DesignMatrix, invert_gram},
        errors::{RegressionError, RegressionResult},
    },
};
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// F statistic with its degrees of freedom and upper-tail p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FTest {
    pub statistic: f64,
    pub df_num: usize,
    pub df_den: usize,
    pub p_value: f64,
}

/// Result of a least-squares fit.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub names: Vec<String>,
    pub coef: Array1<f64>,
    pub se: Array1<f64>,
    pub t_stat: Array1<f64>,
    pub p_value: Array1<f64>,
    pub vcov: Array2<f64>,
    /// `(XᵀWX)⁻¹`, kept so callers can rescale the covariance.
    pub gram_inv: Array2<f64>,
    pub fitted: Array1<f64>,
    pub residuals: Array1<f64>,
    pub rss: f64,
    pub tss: f64,
    pub sigma2: f64,
    pub r_squared: f64,
    pub nobs: usize,
    pub df_resid: usize,
}

/// Ordinary least squares of `y` on `design`.
///
/// # Errors
/// - [`RegressionError::DimensionMismatch`] if `y` and `design` differ in rows.
/// - [`RegressionError::InsufficientData`] if `n ≤ p`.
/// - [`RegressionError::SingularDesign`] if `XᵀX` is rank deficient.
pub fn fit_ols(y: ArrayView1<'_, f64>, design: &DesignMatrix) -> RegressionResult<OlsFit> {
    fit_weighted(y, design, None)
}

/// Weighted least squares with strictly positive `weights`.
///
/// # Errors
/// As [`fit_ols`], plus [`RegressionError::InvalidWeight`] for a weight that
/// is non-finite or not strictly positive.
pub fn fit_wls(
    y: ArrayView1<'_, f64>, design: &DesignMatrix, weights: ArrayView1<'_, f64>,
) -> RegressionResult<OlsFit> {
    if weights.len() != y.len() {
        return Err(RegressionError::DimensionMismatch { expected: y.len(), found: weights.len() });
    }
    if let Some(row) = weights.iter().position(|w| !(w.is_finite() && *w > 0.0)) {
        return Err(RegressionError::InvalidWeight { row, value: weights[row] });
    }
    fit_weighted(y, design, Some(weights))
}

fn fit_weighted(
    y: ArrayView1<'_, f64>, design: &DesignMatrix, weights: Option<ArrayView1<'_, f64>>,
) -> RegressionResult<OlsFit> {
    let x = design.matrix();
    let (n, p) = x.dim();
    if y.len() != n {
        return Err(RegressionError::DimensionMismatch { expected: n, found: y.len() });
    }
    if n <= p {
        return Err(RegressionError::InsufficientData { nobs: n, required: p + 1 });
    }

    let w: Array1<f64> = match weights {
        Some(w) => w.to_owned(),
        None => Array1::ones(n),
    };
    let xw = x * &w.view().insert_axis(Axis(1));
    let gram = xw.t().dot(x);
    let gram_inv = invert_gram(&gram, design.names())?;
    let coef = gram_inv.dot(&xw.t().dot(&y));

    let fitted = x.dot(&coef);
    let residuals = &y - &fitted;
    let rss = (&residuals * &residuals * &w).sum();
    let w_sum = w.sum();
    let y_bar = (&y * &w).sum() / w_sum;
    let tss = y.iter().zip(w.iter()).map(|(yi, wi)| wi * (yi - y_bar).powi(2)).sum::<f64>();
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };

    let df_resid = n - p;
    let sigma2 = rss / df_resid as f64;
    let vcov = &gram_inv * sigma2;
    let se = standard_errors(&vcov);
    let (t_stat, p_value) = coefficient_tests(&coef, &se, df_resid)?;

    Ok(OlsFit {
        names: design.names().to_vec(),
        coef,
        se,
        t_stat,
        p_value,
        vcov,
        gram_inv,
        fitted,
        residuals,
        rss,
        tss,
        sigma2,
        r_squared,
        nobs: n,
        df_resid,
    })
}

/// Student-t statistics and two-sided p-values for each coefficient.
pub fn coefficient_tests(
    coef: &Array1<f64>, se: &Array1<f64>, df: usize,
) -> RegressionResult<(Array1<f64>, Array1<f64>)> {
    let mut t_stat = Array1::zeros(coef.len());
    let mut p_value = Array1::zeros(coef.len());
    for j in 0..coef.len() {
        t_stat[j] = t_statistic(coef[j], se[j])?;
        p_value[j] = pvalue_students_t(t_stat[j], df as f64)?;
    }
    Ok((t_stat, p_value))
}

impl OlsFit {
    /// Coefficient of the regressor called `name`.
    pub fn coef_of(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|j| self.coef[j])
    }

    /// Joint test that every coefficient except the intercept is zero.
    ///
    /// Returns `None` for an intercept-only model.
    pub fn overall_f(&self) -> RegressionResult<Option<FTest>> {
        let k = self.coef.len();
        if k < 2 {
            return Ok(None);
        }
        let restricted_rss = self.tss;
        self.partial_f(restricted_rss, k - 1).map(Some)
    }

    /// F test of `restrictions` exclusion restrictions against a nested
    /// model whose residual sum of squares is `restricted_rss`.
    pub fn partial_f(&self, restricted_rss: f64, restrictions: usize) -> RegressionResult<FTest> {
        let df_num = restrictions.max(1);
        let df_den = self.df_resid;
        let gain = (restricted_rss - self.rss).max(0.0) / df_num as f64;
        let statistic = if self.rss > 0.0 {
            gain / (self.rss / df_den as f64)
        } else if gain > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let p_value = pvalue_fisher(statistic, df_num as f64, df_den as f64)?;
        Ok(FTest { statistic, df_num, df_den, p_value })
    }
}
