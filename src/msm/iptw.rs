//! Inverse-probability-of-treatment weights.
use crate::msm::{
    errors::{MsmError, MsmResult},
    options::Trimming,
};
use ndarray::{Array1, ArrayView1};

/// Check every score against `[trim, 1 − trim]`.
///
/// Scores of exactly 0 or 1 are never admissible, whatever `trim`.
///
/// # Errors
/// - [`MsmError::PropensityOutOfBounds`] for the first offending row under
///   [`Trimming::Reject`], or for a score left at 0 or 1 after clipping.
pub fn bound_propensities(
    scores: ArrayView1<'_, f64>, trim: f64, trimming: Trimming,
) -> MsmResult<Array1<f64>> {
    let (lo, hi) = (trim, 1.0 - trim);
    let bounded = match trimming {
        Trimming::Reject => scores.to_owned(),
        Trimming::Clip => scores.mapv(|e| e.clamp(lo, hi)),
    };
    let outside = |e: f64| !(e >= lo && e <= hi && e > 0.0 && e < 1.0);
    match bounded.iter().position(|&e| outside(e)) {
        Some(row) => Err(MsmError::PropensityOutOfBounds { row, value: scores[row], trim }),
        None => Ok(bounded),
    }
}

/// `w = T/e + (1 − T)/(1 − e)`.
///
/// With `stabilize`, the numerators become the marginal shares
/// `P(T = 1)` and `P(T = 0)`, so the weights average to about one.
pub fn iptw_weights(
    treatment: ArrayView1<'_, f64>, scores: ArrayView1<'_, f64>, stabilize: bool,
) -> Array1<f64> {
    let p_treated = if stabilize { treatment.mean().unwrap_or(0.5) } else { 1.0 };
    let p_control = if stabilize { 1.0 - p_treated } else { 1.0 };
    treatment
        .iter()
        .zip(scores.iter())
        .map(|(&t, &e)| t * p_treated / e + (1.0 - t) * p_control / (1.0 - e))
        .collect()
}
