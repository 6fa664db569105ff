//! inference::distributions — p-values and critical values for estimator output.
//!
//! Purpose
//! -------
//! Turn point estimates and standard errors into test statistics, p-values,
//! and symmetric confidence intervals, using the reference distributions
//! from `statrs`.
//!
//! Conventions
//! -----------
//! - All p-values are two-sided except the F-test, which is upper-tail.
//! - A confidence level `L` maps to the critical value
//!   `z = Φ⁻¹(1 − (1 − L)/2)`; intervals are `estimate ± z·se` and are
//!   symmetric by construction.
//! - A zero standard error produces an infinite t-statistic and a zero
//!   p-value rather than `NaN`.
use crate::inference::errors::{InferenceError, InferenceResult};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Ratio of an estimate to its standard error.
pub fn t_statistic(estimate: f64, se: f64) -> InferenceResult<f64> {
    if !se.is_finite() || se < 0.0 {
        return Err(InferenceError::InvalidStandardError { se });
    }
    if se == 0.0 {
        return Ok(if estimate == 0.0 { 0.0 } else { estimate.signum() * f64::INFINITY });
    }
    Ok(estimate / se)
}

/// Two-sided p-value of `stat` under the standard Normal.
pub fn pvalue_normal(stat: f64) -> InferenceResult<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(distribution_error)?;
    Ok(2.0 * normal.sf(stat.abs()))
}

/// Two-sided p-value of `stat` under Student's t with `df` degrees of freedom.
pub fn pvalue_students_t(stat: f64, df: f64) -> InferenceResult<f64> {
    verify_df(df)?;
    let t_dist = StudentsT::new(0.0, 1.0, df).map_err(distribution_error)?;
    Ok(2.0 * t_dist.sf(stat.abs()))
}

/// Upper-tail p-value of `stat` under `F(d1, d2)`.
pub fn pvalue_fisher(stat: f64, d1: f64, d2: f64) -> InferenceResult<f64> {
    verify_df(d1)?;
    verify_df(d2)?;
    if stat.is_infinite() && stat > 0.0 {
        return Ok(0.0);
    }
    let f_dist = FisherSnedecor::new(d1, d2).map_err(distribution_error)?;
    Ok(f_dist.sf(stat.max(0.0)))
}

/// Normal critical value for a two-sided interval at `conf_level`.
///
/// # Errors
/// - [`InferenceError::InvalidConfidenceLevel`] unless `0 < conf_level < 1`.
pub fn normal_critical_value(conf_level: f64) -> InferenceResult<f64> {
    if !(conf_level > 0.0 && conf_level < 1.0) {
        return Err(InferenceError::InvalidConfidenceLevel { level: conf_level });
    }
    let alpha = (1.0 - conf_level) / 2.0;
    let normal = Normal::new(0.0, 1.0).map_err(distribution_error)?;
    Ok(normal.inverse_cdf(1.0 - alpha))
}

/// Symmetric Normal-approximation interval `estimate ± z·se`.
pub fn confidence_interval(estimate: f64, se: f64, conf_level: f64) -> InferenceResult<(f64, f64)> {
    if !se.is_finite() || se < 0.0 {
        return Err(InferenceError::InvalidStandardError { se });
    }
    let z = normal_critical_value(conf_level)?;
    Ok((estimate - z * se, estimate + z * se))
}

fn distribution_error<E: std::fmt::Display>(err: E) -> InferenceError {
    InferenceError::Distribution { text: err.to_string() }
}

fn verify_df(df: f64) -> InferenceResult<()> {
    if !df.is_finite() || df <= 0.0 {
        return Err(InferenceError::InvalidDegreesOfFreedom { df });
    }
    Ok(())
}
