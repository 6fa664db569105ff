//! inference::hessian — covariance matrices from information matrices.
//!
//! Purpose
//! -------
//! Convert an information matrix (a Gram matrix `XᵀX`, or a finite-difference
//! Hessian of a maximized objective) into a covariance matrix using a
//! symmetric eigendecomposition with eigenvalue truncation. No explicit
//! inverse is formed.
//!
//! Key behaviors
//! -------------
//! - [`pseudo_inverse`] returns the Moore–Penrose inverse of a symmetric
//!   matrix, dropping eigenvalues at or below `EIGEN_EPS × λ_max`.
//! - [`covariance_from_gradient`] differentiates a gradient map at `θ̂`
//!   with [`compute_hessian`] and inverts the resulting information.
//! - [`standard_errors`] reads `sqrt(diag(V))`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are square and symmetric up to rounding; `fill_dmatrix` copies
//!   them verbatim and does not re-symmetrize.
//! - Directions with truncated eigenvalues get zero variance, so callers
//!   that need identification must check rank separately (the regression
//!   layer does this before calling here).
//!
//! Testing notes
//! -------------
//! - Unit tests compare against analytic inverses of small matrices and
//!   check the scaling convention of [`covariance_from_gradient`].
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::loglik_optimizer::finite_diff::compute_hessian,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Relative eigenvalue cutoff used when inverting information matrices.
pub const EIGEN_EPS: f64 = 1e-12;

/// Moore–Penrose inverse of a symmetric matrix.
///
/// # Errors
/// - [`InferenceError::NotSquare`] for non-square input.
/// - [`InferenceError::NoInformation`] when every eigenvalue is truncated.
pub fn pseudo_inverse(info: &Array2<f64>) -> InferenceResult<Array2<f64>> {
    let (rows, cols) = info.dim();
    if rows != cols {
        return Err(InferenceError::NotSquare { rows, cols });
    }
    let mut info_nalg = DMatrix::<f64>::zeros(rows, cols);
    fill_dmatrix(info, &mut info_nalg);
    let eigen_decomp = info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let lambda_max = eigenvals.iter().cloned().fold(0.0_f64, f64::max);
    if lambda_max <= 0.0 {
        return Err(InferenceError::NoInformation);
    }
    let cutoff = EIGEN_EPS * lambda_max;

    let mut inv = Array2::<f64>::zeros((rows, cols));
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda <= cutoff {
            continue;
        }
        for i in 0..rows {
            let coeff = q[(i, k)] / lambda;
            for j in 0..cols {
                inv[[i, j]] += coeff * q[(j, k)];
            }
        }
    }
    Ok(inv)
}

/// Covariance of `θ̂` from the gradient map of a maximized objective.
///
/// `grad` is `∇ℓ` where `ℓ` is the objective that was maximized. The
/// observed information is `J = -scale · ∇²ℓ(θ̂)` and the returned matrix is
/// `dispersion · J⁺`.
///
/// For a Gaussian quasi-likelihood `ℓ(β) = -‖y - Xβ‖²/n` use
/// `scale = n / 2` so that `J = XᵀX`, and pass `σ̂²` as `dispersion`. For a
/// mean log-likelihood use `scale = n` and `dispersion = 1`.
pub fn covariance_from_gradient<F: Fn(&Array1<f64>) -> Array1<f64>>(
    grad: &F, theta_hat: &Array1<f64>, scale: f64, dispersion: f64,
) -> InferenceResult<Array2<f64>> {
    let hess = compute_hessian(grad, theta_hat)?;
    let info = hess.mapv(|h| -scale * h);
    Ok(pseudo_inverse(&info)? * dispersion)
}

/// `sqrt(diag(V))`, with tiny negative rounding clamped to zero.
pub fn standard_errors(vcov: &Array2<f64>) -> Array1<f64> {
    vcov.diag().mapv(|v| v.max(0.0).sqrt())
}

fn fill_dmatrix(info: &Array2<f64>, info_nalg: &mut DMatrix<f64>) {
    let n = info.ncols();
    for j in 0..n {
        for i in 0..info.nrows() {
            info_nalg[(i, j)] = info[[i, j]];
        }
    }
}
