//! Input and output checks shared by the optimizer modules.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, types::Hessian},
};

pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Reject parameter vectors of the wrong length or with non-finite entries.
///
/// Objectives call this from `LogLikelihood::check` before optimization.
pub fn validate_theta(theta: &Theta, expected: usize) -> OptResult<()> {
    if theta.len() != expected {
        return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
    }
    match theta.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidThetaInput { index, value: theta[index] }),
        None => Ok(()),
    }
}

pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in t.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(t)
}

pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

pub fn validate_hessian(hessian: &Hessian, dim: usize) -> OptResult<()> {
    if hessian.nrows() != dim || hessian.ncols() != dim {
        return Err(OptError::HessianDimMismatch {
            expected: dim,
            found: (hessian.nrows(), hessian.ncols()),
        });
    }
    for ((i, j), &value) in hessian.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidHessian { row: i, col: j, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the accept/reject boundaries of each validator.
    // Integration with the solver is exercised in `api` and the estimator
    // modules.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Tolerances must be strictly positive and finite; `None` is allowed.
    //
    // Given
    // -----
    // - Zero, negative, NaN, and `None` tolerances.
    //
    // Expect
    // ------
    // - Only `None` and positive finite values pass.
    fn verify_tolerances_reject_non_positive_and_non_finite() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_grad(Some(1e-8)).is_ok());
        assert!(matches!(verify_tol_grad(Some(0.0)), Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(verify_tol_cost(Some(-1.0)), Err(OptError::InvalidTolCost { .. })));
        assert!(matches!(verify_tol_cost(Some(f64::NAN)), Err(OptError::InvalidTolCost { .. })));
    }

    #[test]
    // Purpose
    // -------
    // `validate_theta` reports the first offending coordinate.
    //
    // Given
    // -----
    // - A length-3 vector with a NaN at index 1, and a length mismatch.
    //
    // Expect
    // ------
    // - `InvalidThetaInput { index: 1 }` and `ThetaLengthMismatch`.
    fn validate_theta_flags_length_and_non_finite_entries() {
        let theta = array![0.0, f64::NAN, 1.0];
        assert!(matches!(
            validate_theta(&theta, 3),
            Err(OptError::InvalidThetaInput { index: 1, .. })
        ));
        assert_eq!(
            validate_theta(&theta, 2),
            Err(OptError::ThetaLengthMismatch { expected: 2, actual: 3 })
        );
    }

    #[test]
    // Purpose
    // -------
    // A missing or non-finite optimum is never accepted.
    //
    // Given
    // -----
    // - `None`, and a vector holding infinity.
    //
    // Expect
    // ------
    // - `MissingThetaHat` and `InvalidThetaHat` respectively.
    fn validate_theta_hat_rejects_missing_and_non_finite() {
        assert_eq!(validate_theta_hat(None), Err(OptError::MissingThetaHat));
        assert!(matches!(
            validate_theta_hat(Some(array![1.0, f64::INFINITY])),
            Err(OptError::InvalidThetaHat { index: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Hessian shape and finiteness are both enforced.
    //
    // Given
    // -----
    // - A 2×3 matrix and a 2×2 matrix with a NaN.
    //
    // Expect
    // ------
    // - `HessianDimMismatch` then `InvalidHessian`.
    fn validate_hessian_checks_shape_then_entries() {
        let wide = Array2::<f64>::zeros((2, 3));
        assert!(matches!(validate_hessian(&wide, 2), Err(OptError::HessianDimMismatch { .. })));

        let mut bad = Array2::<f64>::eye(2);
        bad[[1, 0]] = f64::NAN;
        assert!(matches!(
            validate_hessian(&bad, 2),
            Err(OptError::InvalidHessian { row: 1, col: 0, .. })
        ));
    }
}
