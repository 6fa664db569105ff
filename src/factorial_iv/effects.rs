//! factorial_iv::effects — MCAFE and PCAFE per factor.
//!
//! Purpose
//! -------
//! Turn fitted type shares `ρ` and outcome parameters `ψ` into per-factor
//! causal effects with standard errors.
//!
//! Key behaviors
//! -------------
//! - Contrast weights `g_k(p) = (2·p_k − 1) / 2^{K−1}` average the effect of
//!   factor `k` over the levels of the other factors.
//! - PCAFE (perfect compliers): `Σ_d g_k(d)·ψ_{d,1…1} / π_{c…c}`.
//! - MCAFE (marginalized compliers): the instrument contrast of the modelled
//!   outcome means, `Σ_z g_k(z) Σ_d B_{(d,z)}·ψ`, divided by the share of
//!   factor-`k` compliers `Σ_{t : t_k = c} π_t`.
//! - Both are ratios `cᵀψ / eᵀρ`; with one factor each reduces to the Wald
//!   estimator.
//!
//! Invariants & assumptions
//! ------------------------
//! - A denominator with `|den| ≤ tol` is an error, never `inf`/`NaN`.
//! - [`EffectVariance::FixedDenominator`] treats the denominator as known:
//!   `se = sqrt(cᵀ V_ψ c) / |den|`. [`EffectVariance::DeltaMethod`] adds its
//!   sampling variance through the gradient of the ratio.
//! - Output vectors are indexed by factor, in input column order.
use crate::factorial_iv::{
    compliance::{ComplianceType, FactorialGrid},
    errors::{FactorialIvError, FactorialIvResult},
    matrices::StructuralMatrices,
};
use ndarray::{Array1, Array2, s};

/// Which factorial effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Estimand {
    /// Marginalized complier average factorial effect.
    Mcafe,
    /// Perfect complier average factorial effect.
    Pcafe,
}

impl std::fmt::Display for Estimand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Estimand::Mcafe => write!(f, "MCAFE"),
            Estimand::Pcafe => write!(f, "PCAFE"),
        }
    }
}

/// Standard-error formula for the effect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectVariance {
    /// Numerator variance over the squared, fixed denominator.
    #[default]
    FixedDenominator,
    /// First-order delta method over numerator and denominator.
    DeltaMethod,
}

/// Estimates and standard errors of one estimand, one entry per factor.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectEstimates {
    pub estimand: Estimand,
    pub estimate: Array1<f64>,
    pub std_error: Array1<f64>,
}

/// Linear combinations defining one ratio: `num_psi · ψ / den_rho · ρ`.
struct RatioWeights {
    num_psi: Array1<f64>,
    den_rho: Array1<f64>,
}

/// Contrast weight of pattern `p` for `factor`.
pub fn contrast_weight(grid: &FactorialGrid, pattern: usize, factor: usize) -> f64 {
    let sign = if grid.bit(pattern, factor) { 1.0 } else { -1.0 };
    sign / (1_usize << (grid.k() - 1)) as f64
}

fn pcafe_weights(grid: &FactorialGrid, factor: usize) -> RatioWeights {
    let j = grid.n_patterns();
    let all_compliers = j - 1;
    let mut num_psi = Array1::<f64>::zeros(grid.n_cells());
    for d in 0..j {
        num_psi[grid.psi_index(d, all_compliers)] = contrast_weight(grid, d, factor);
    }
    let mut den_rho = Array1::<f64>::zeros(grid.n_types());
    den_rho[grid.perfect_complier()] = 1.0;
    RatioWeights { num_psi, den_rho }
}

fn mcafe_weights(grid: &FactorialGrid, b: &Array2<f64>, factor: usize) -> RatioWeights {
    let j = grid.n_patterns();
    let mut num_psi = Array1::<f64>::zeros(grid.n_cells());
    for z in 0..j {
        let g = contrast_weight(grid, z, factor);
        for d in 0..j {
            num_psi.scaled_add(g, &b.row(grid.cell(d, z)));
        }
    }
    let den_rho: Array1<f64> = (0..grid.n_types())
        .map(|t| if grid.type_of(t)[factor] == ComplianceType::Complier { 1.0 } else { 0.0 })
        .collect();
    RatioWeights { num_psi, den_rho }
}

/// Compute one estimand for every factor.
///
/// `vcov` is the joint covariance of `(ρ, ψ)` with `ρ` first.
///
/// # Errors
/// - [`FactorialIvError::DegenerateEffect`] when a denominator is within
///   `degenerate_tol` of zero.
#[allow(clippy::too_many_arguments)]
pub fn factorial_effects(
    estimand: Estimand, grid: &FactorialGrid, matrices: &StructuralMatrices, rho: &Array1<f64>,
    psi: &Array1<f64>, vcov: &Array2<f64>, variance: EffectVariance, degenerate_tol: f64,
) -> FactorialIvResult<EffectEstimates> {
    let k = grid.k();
    let split = rho.len();
    let v_rho = vcov.slice(s![..split, ..split]);
    let v_psi = vcov.slice(s![split.., split..]);
    let v_cross = vcov.slice(s![..split, split..]);

    let mut estimate = Array1::<f64>::zeros(k);
    let mut std_error = Array1::<f64>::zeros(k);
    for factor in 0..k {
        let w = match estimand {
            Estimand::Pcafe => pcafe_weights(grid, factor),
            Estimand::Mcafe => mcafe_weights(grid, &matrices.b, factor),
        };
        let num = w.num_psi.dot(psi);
        let den = w.den_rho.dot(rho);
        if !(den.abs() > degenerate_tol) {
            return Err(FactorialIvError::DegenerateEffect { estimand, factor, denominator: den });
        }
        let est = num / den;
        let var_num = w.num_psi.dot(&v_psi.dot(&w.num_psi));
        let var = match variance {
            EffectVariance::FixedDenominator => var_num / (den * den),
            EffectVariance::DeltaMethod => {
                let var_den = w.den_rho.dot(&v_rho.dot(&w.den_rho));
                let cov = w.den_rho.dot(&v_cross.dot(&w.num_psi));
                (var_num - 2.0 * est * cov + est * est * var_den) / (den * den)
            }
        };
        estimate[factor] = est;
        std_error[factor] = var.max(0.0).sqrt();
    }
    Ok(EffectEstimates { estimand, estimate, std_error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Contrast weights and the one-factor Wald reduction.
    // - Degenerate denominators.
    // - The delta-method variance exceeding the fixed-denominator one when
    //   the denominator is uncertain.
    // -------------------------------------------------------------------------

    fn one_factor_setup() -> (FactorialGrid, StructuralMatrices, Array1<f64>, Array1<f64>) {
        let grid = FactorialGrid::new(1).expect("valid k");
        let matrices = StructuralMatrices::build(&grid);
        // π = (a, n, c); ψ = (n·Y0|n, c·Y0|c, a·Y1|a, c·Y1|c).
        let rho = array![0.2, 0.3, 0.5];
        let psi = array![0.3, 0.5, 0.4, 1.5];
        (grid, matrices, rho, psi)
    }

    #[test]
    // Purpose
    // -------
    // With one factor both estimands equal the complier effect
    // `(ψ_{1,c} − ψ_{0,c}) / π_c`.
    //
    // Given
    // -----
    // - π_c = 0.5, ψ_{1,c} − ψ_{0,c} = 1.0.
    //
    // Expect
    // ------
    // - MCAFE = PCAFE = 2.0.
    fn one_factor_estimands_coincide() {
        let (grid, m, rho, psi) = one_factor_setup();
        let vcov = Array2::<f64>::eye(7) * 0.01;
        let v = EffectVariance::FixedDenominator;
        let p = factorial_effects(Estimand::Pcafe, &grid, &m, &rho, &psi, &vcov, v, 1e-10)
            .expect("non-degenerate");
        let mc = factorial_effects(Estimand::Mcafe, &grid, &m, &rho, &psi, &vcov, v, 1e-10)
            .expect("non-degenerate");
        assert_relative_eq!(p.estimate[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(mc.estimate[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.std_error[0], (0.02_f64).sqrt() / 0.5, epsilon = 1e-12);
    }

    #[test]
    fn zero_complier_share_is_degenerate() {
        let (grid, m, _, psi) = one_factor_setup();
        let rho = array![0.5, 0.5, 0.0];
        let vcov = Array2::<f64>::eye(7);
        let err = factorial_effects(
            Estimand::Pcafe,
            &grid,
            &m,
            &rho,
            &psi,
            &vcov,
            EffectVariance::FixedDenominator,
            1e-10,
        )
        .expect_err("π_c = 0");
        assert!(matches!(
            err,
            FactorialIvError::DegenerateEffect { estimand: Estimand::Pcafe, factor: 0, .. }
        ));
    }

    #[test]
    fn delta_method_adds_denominator_uncertainty() {
        let (grid, m, rho, psi) = one_factor_setup();
        let vcov = Array2::<f64>::eye(7) * 0.01;
        let fixed = factorial_effects(
            Estimand::Pcafe,
            &grid,
            &m,
            &rho,
            &psi,
            &vcov,
            EffectVariance::FixedDenominator,
            1e-10,
        )
        .expect("non-degenerate");
        let delta = factorial_effects(
            Estimand::Pcafe,
            &grid,
            &m,
            &rho,
            &psi,
            &vcov,
            EffectVariance::DeltaMethod,
            1e-10,
        )
        .expect("non-degenerate");
        assert_eq!(fixed.estimate, delta.estimate);
        // var = (0.02 + 2² · 0.01) / 0.5².
        assert_relative_eq!(delta.std_error[0], (0.06_f64 / 0.25).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn contrast_weights_average_over_other_factors() {
        let grid = FactorialGrid::new(2).expect("valid k");
        assert_eq!(contrast_weight(&grid, 0b10, 0), 0.5);
        assert_eq!(contrast_weight(&grid, 0b10, 1), -0.5);
        let total: f64 = (0..4).map(|p| contrast_weight(&grid, p, 0)).sum();
        assert_eq!(total, 0.0);
    }
}
