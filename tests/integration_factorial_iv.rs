//! Integration tests for the factorial IV estimator.
//!
//! Purpose
//! -------
//! - Validate `FactorialIV::fit` end to end on simulated factorial
//!   encouragement designs with known compliance-type shares and effects.
//! - Check that the two moment solvers agree and that the one-factor case
//!   collapses to the familiar Wald / 2SLS estimate.
//!
//! Coverage
//! --------
//! - `factorial_iv::FactorialIV`: closed form vs L-BFGS, `summary`, `tidy`,
//!   invariance to row order, degenerate complier shares, unobserved
//!   instrument patterns.
//! - `iv::fit_2sls`: as the reference for the one-factor case.
//!
//! Exclusions
//! ----------
//! - Grid and matrix construction are covered by unit tests.
use approx::assert_relative_eq;
use cup_causal::{
    data::Dataset,
    factorial_iv::{
        Estimand, FactorialIV, FactorialIvError, FactorialIvOptions, MomentBlock, MomentSolver,
    },
    iv::{IvFormula, TslsOptions, fit_2sls},
};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

/// Per-factor compliance draw: always-taker, never-taker, complier.
const TYPE_SHARES: [f64; 3] = [0.2, 0.3, 0.5];

/// Purpose
/// -------
/// Simulate `n` units of a `k`-factor encouragement design.
///
/// Model
/// -----
/// - Each factor's type is drawn independently with [`TYPE_SHARES`];
///   `z_k ~ Bernoulli(0.5)`; `d_k` follows the type.
/// - `y = 1 + Σ_k effects[k]·d_k + 0.5·1{factor 0 is always-taker} + ε`,
///   `ε ~ N(0, 1)`. The type-dependent baseline makes `d` endogenous while
///   the effects stay homogeneous, so MCAFE and PCAFE both equal `effects`.
fn factorial_sample(
    rng: &mut StdRng, n: usize, effects: &[f64],
) -> (Array1<f64>, Array2<f64>, Array2<f64>) {
    let k = effects.len();
    let normal = Normal::new(0.0, 1.0).expect("valid normal");
    let mut y = Array1::<f64>::zeros(n);
    let mut d = Array2::<f64>::zeros((n, k));
    let mut z = Array2::<f64>::zeros((n, k));
    for i in 0..n {
        let mut outcome = 1.0 + normal.sample(rng);
        for f in 0..k {
            let u: f64 = rng.r#gen();
            let zi = rng.gen_bool(0.5);
            let di = if u < TYPE_SHARES[0] {
                if f == 0 {
                    outcome += 0.5;
                }
                true
            } else if u < TYPE_SHARES[0] + TYPE_SHARES[1] {
                false
            } else {
                zi
            };
            z[[i, f]] = if zi { 1.0 } else { 0.0 };
            d[[i, f]] = if di { 1.0 } else { 0.0 };
            if di {
                outcome += effects[f];
            }
        }
        y[i] = outcome;
    }
    (y, d, z)
}

#[test]
// Purpose
// -------
// The normal-equation solver and L-BFGS reach the same estimates.
//
// Given
// -----
// - 2000 units, K = 2, effects (2.0, 1.0).
//
// Expect
// ------
// - ρ, ψ, MCAFE and PCAFE agree to 1e-6 (relative, with a 1e-6 floor).
// - L-BFGS reports its iteration count; the closed form does not.
fn closed_form_and_lbfgs_agree_for_two_factors() {
    let mut rng = StdRng::seed_from_u64(2);
    let (y, d, z) = factorial_sample(&mut rng, 2000, &[2.0, 1.0]);

    let exact = FactorialIV::fit(y.view(), d.view(), z.view(), &FactorialIvOptions::default())
        .expect("identified design");
    let iterative = FactorialIV::fit(
        y.view(),
        d.view(),
        z.view(),
        &FactorialIvOptions::with_solver(MomentSolver::Lbfgs),
    )
    .expect("L-BFGS converges on a quadratic objective");

    assert!(exact.iterations().is_none());
    assert!(iterative.iterations().is_some());
    for (a, b) in exact.rho().iter().zip(iterative.rho().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6, max_relative = 1e-6);
    }
    for (a, b) in exact.psi().iter().zip(iterative.psi().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6, max_relative = 1e-6);
    }
    for estimand in [Estimand::Mcafe, Estimand::Pcafe] {
        let (a, b) = (exact.effects(estimand), iterative.effects(estimand));
        for f in 0..2 {
            assert_relative_eq!(a.estimate[f], b.estimate[f], epsilon = 1e-6, max_relative = 1e-6);
        }
    }
}

#[test]
// Purpose
// -------
// Estimates recover homogeneous effects and the perfect-complier share.
//
// Given
// -----
// - 4000 units, K = 2, effects (2.0, 1.0); true π_cc = 0.25.
//
// Expect
// ------
// - Every MCAFE/PCAFE within four standard errors of its truth.
// - Summary complier share within 0.05 of 0.25.
fn estimates_recover_simulated_effects() {
    let mut rng = StdRng::seed_from_u64(4000);
    let truth = [2.0, 1.0];
    let (y, d, z) = factorial_sample(&mut rng, 4000, &truth);
    let model = FactorialIV::fit(y.view(), d.view(), z.view(), &FactorialIvOptions::default())
        .expect("identified design");

    for row in model.tidy(false, 0.95).expect("no interval") {
        let target = truth[row.factor];
        assert!(
            (row.estimate - target).abs() <= 4.0 * row.std_error,
            "{} factor {}: {} vs {target} (se {})",
            row.estimand,
            row.factor,
            row.estimate,
            row.std_error
        );
    }
    let summary = model.summary().expect("finite statistics");
    assert!((summary.complier_share - 0.25).abs() < 0.05);
    assert_eq!(summary.effects.len(), 2);
}

#[test]
// Purpose
// -------
// With a single factor both estimands reduce to the Wald ratio, which is
// also the just-identified 2SLS estimate.
//
// Given
// -----
// - 1500 units, K = 1, effect 1.5.
//
// Expect
// ------
// - MCAFE = PCAFE = 2SLS effect = (Ȳ₁ − Ȳ₀)/(D̄₁ − D̄₀) to 1e-8.
fn one_factor_reduces_to_wald_and_two_stage() {
    let mut rng = StdRng::seed_from_u64(1);
    let (y, d, z) = factorial_sample(&mut rng, 1500, &[1.5]);
    let model = FactorialIV::fit(y.view(), d.view(), z.view(), &FactorialIvOptions::default())
        .expect("identified design");

    let zc = z.column(0);
    let dc = d.column(0);
    let arm_mean = |v: &Array1<f64>, arm: f64| {
        let (sum, count) = v
            .iter()
            .zip(zc.iter())
            .filter(|(_, zi)| **zi == arm)
            .fold((0.0, 0.0), |(s, c), (vi, _)| (s + vi, c + 1.0));
        sum / count
    };
    let dc_owned = dc.to_owned();
    let wald = (arm_mean(&y, 1.0) - arm_mean(&y, 0.0))
        / (arm_mean(&dc_owned, 1.0) - arm_mean(&dc_owned, 0.0));

    let data = Dataset::new()
        .with_numeric("y", y.clone())
        .and_then(|ds| ds.with_numeric("d", dc_owned.clone()))
        .and_then(|ds| ds.with_numeric("z", zc.to_owned()))
        .expect("valid dataset");
    let tsls = fit_2sls(&IvFormula::new("y", "d").instrument("z"), &data, &TslsOptions::default())
        .expect("identified");

    assert_relative_eq!(model.mcafe().estimate[0], wald, epsilon = 1e-8);
    assert_relative_eq!(model.pcafe().estimate[0], wald, epsilon = 1e-8);
    assert_relative_eq!(tsls.effect(), wald, epsilon = 1e-8);
}

#[test]
// Purpose
// -------
// Estimates do not depend on the order of the rows.
//
// Given
// -----
// - A K = 2 sample and the same rows reversed.
//
// Expect
// ------
// - ρ, ψ and both effect vectors equal up to rounding.
fn row_order_does_not_change_factorial_estimates() {
    let mut rng = StdRng::seed_from_u64(9);
    let (y, d, z) = factorial_sample(&mut rng, 600, &[1.0, -0.5]);
    let (yr, dr, zr) = (
        y.slice(ndarray::s![..;-1]).to_owned(),
        d.slice(ndarray::s![..;-1, ..]).to_owned(),
        z.slice(ndarray::s![..;-1, ..]).to_owned(),
    );
    let opts = FactorialIvOptions::default();
    let a = FactorialIV::fit(y.view(), d.view(), z.view(), &opts).expect("identified");
    let b = FactorialIV::fit(yr.view(), dr.view(), zr.view(), &opts).expect("identified");

    for (x1, x2) in a.rho().iter().chain(a.psi().iter()).zip(b.rho().iter().chain(b.psi().iter())) {
        assert_relative_eq!(*x1, *x2, epsilon = 1e-10);
    }
    for f in 0..2 {
        assert_relative_eq!(a.pcafe().estimate[f], b.pcafe().estimate[f], epsilon = 1e-10);
        assert_relative_eq!(a.mcafe().std_error[f], b.mcafe().std_error[f], epsilon = 1e-10);
    }
}

#[test]
// Purpose
// -------
// Confidence intervals are symmetric and widen with the confidence level.
//
// Given
// -----
// - A K = 2 fit, intervals at 0.80, 0.90, 0.95, 0.99.
//
// Expect
// ------
// - `estimate − low = high − estimate` for every row and level.
// - Strictly increasing widths across levels.
fn confidence_intervals_are_symmetric_and_monotone() {
    let mut rng = StdRng::seed_from_u64(3);
    let (y, d, z) = factorial_sample(&mut rng, 1000, &[1.0, 0.5]);
    let model = FactorialIV::fit(y.view(), d.view(), z.view(), &FactorialIvOptions::default())
        .expect("identified design");

    let levels = [0.80, 0.90, 0.95, 0.99];
    let tables: Vec<_> =
        levels.iter().map(|&l| model.tidy(true, l).expect("valid level")).collect();
    for table in &tables {
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].estimand, Estimand::Mcafe);
        assert_eq!(table[3].estimand, Estimand::Pcafe);
        for row in table {
            let (lo, hi) = (row.conf_low.expect("lo"), row.conf_high.expect("hi"));
            assert_relative_eq!(row.estimate - lo, hi - row.estimate, epsilon = 1e-12);
        }
    }
    for row in 0..4 {
        let widths: Vec<f64> = tables
            .iter()
            .map(|t| t[row].conf_high.expect("hi") - t[row].conf_low.expect("lo"))
            .collect();
        assert!(widths.windows(2).all(|w| w[1] > w[0]), "widths {widths:?}");
    }
}

#[test]
// Purpose
// -------
// Identification failures are typed errors.
//
// Given
// -----
// - A K = 1 sample where nobody ever takes the treatment.
// - A K = 2 sample where the instrument pattern (1, 1) never occurs.
//
// Expect
// ------
// - `DegenerateEffect` for the zero complier share.
// - `SingularDesign` in the ρ block for the missing pattern.
fn degenerate_designs_are_typed_errors() {
    let mut rng = StdRng::seed_from_u64(5);
    let (y, _, z) = factorial_sample(&mut rng, 200, &[1.0]);
    let never = Array2::<f64>::zeros((200, 1));
    assert!(matches!(
        FactorialIV::fit(y.view(), never.view(), z.view(), &FactorialIvOptions::default()),
        Err(FactorialIvError::DegenerateEffect { factor: 0, .. })
    ));

    let (y, d, mut z) = factorial_sample(&mut rng, 400, &[1.0, 1.0]);
    for mut row in z.axis_iter_mut(Axis(0)) {
        if row[0] == 1.0 && row[1] == 1.0 {
            row[1] = 0.0;
        }
    }
    assert!(matches!(
        FactorialIV::fit(y.view(), d.view(), z.view(), &FactorialIvOptions::default()),
        Err(FactorialIvError::SingularDesign { block: MomentBlock::Rho, .. })
    ));
}
