//! factorial_iv::model — the fitted FactorialIV estimator.
//!
//! Purpose
//! -------
//! Fit the factorial instrumental-variables model for `K` binary treatments
//! with one binary instrument each, and expose the estimates through
//! read-only accessors and the `summary` / `tidy` reports.
//!
//! Key behaviors
//! -------------
//! - [`FactorialIV::fit`] validates the inputs, builds the grids and
//!   structural matrices, solves the moment system with the configured
//!   solver, and computes MCAFE and PCAFE for every factor.
//! - A fitted model is immutable; there is no refit or update.
//! - [`FactorialIV::summary`] reports PCAFE with Normal t and p values plus
//!   the estimated perfect-complier share.
//! - [`FactorialIV::tidy`] lists MCAFE rows then PCAFE rows, optionally with
//!   symmetric Normal intervals.
//!
//! Invariants & assumptions
//! ------------------------
//! - Treatment and instrument have the same number of columns `K` and the
//!   same number of rows as the outcome; entries are exactly 0 or 1.
//! - At least `2^K + 1` units are required for the residual variances.
//! - Any failure aborts the fit; no partially fitted model exists.
use crate::{
    data::Dataset,
    factorial_iv::{
        compliance::FactorialGrid,
        effects::{EffectEstimates, Estimand, factorial_effects},
        errors::{FactorialIvError, FactorialIvResult},
        matrices::StructuralMatrices,
        moments::{MomentEstimate, MomentSystem},
        options::{FactorialIvOptions, MomentSolver},
    },
    inference::distributions::{confidence_interval, pvalue_normal, t_statistic},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Fitted factorial IV model.
///
/// Parameter layout
/// ----------------
/// - `rho[t]`: share of joint compliance type `t` (see
///   [`FactorialGrid::type_label`]); the last entry is the perfect
///   complier.
/// - `psi[d·2^K + s]`: outcome parameter of treatment pattern `d` and
///   complier mask `s`.
/// - `vcov`: covariance of `(ρ, ψ)`, `ρ` first.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorialIV {
    grid: FactorialGrid,
    matrices: StructuralMatrices,
    estimate: MomentEstimate,
    mcafe: EffectEstimates,
    pcafe: EffectEstimates,
    nobs: usize,
    solver: MomentSolver,
}

impl FactorialIV {
    /// Fit the model.
    ///
    /// # Errors
    /// - [`FactorialIvError::DimensionMismatch`] for mismatched rows or
    ///   factor counts.
    /// - [`FactorialIvError::NotBinary`] / [`FactorialIvError::NonFiniteOutcome`]
    ///   for invalid entries.
    /// - [`FactorialIvError::InsufficientData`] for fewer than `2^K + 1` units.
    /// - [`FactorialIvError::SingularDesign`] when an instrument pattern is
    ///   never observed.
    /// - [`FactorialIvError::OptimizationDiverged`] when L-BFGS does not
    ///   converge.
    /// - [`FactorialIvError::DegenerateEffect`] for a zero complier share.
    pub fn fit(
        outcome: ArrayView1<'_, f64>, treatment: ArrayView2<'_, f64>,
        instrument: ArrayView2<'_, f64>, opts: &FactorialIvOptions,
    ) -> FactorialIvResult<Self> {
        let grid = validate_inputs(outcome, treatment, instrument)?;
        let matrices = StructuralMatrices::build(&grid);
        let system = MomentSystem::new(grid, &matrices, outcome, treatment, instrument);
        let estimate = match opts.solver {
            MomentSolver::ClosedForm => system.solve_closed_form()?,
            MomentSolver::Lbfgs => system.solve_lbfgs(&opts.mle)?,
        };

        let effects = |estimand| {
            factorial_effects(
                estimand,
                &grid,
                &matrices,
                &estimate.rho,
                &estimate.psi,
                &estimate.vcov,
                opts.effect_variance,
                opts.degenerate_tol,
            )
        };
        let mcafe = effects(Estimand::Mcafe)?;
        let pcafe = effects(Estimand::Pcafe)?;

        Ok(Self {
            grid,
            matrices,
            estimate,
            mcafe,
            pcafe,
            nobs: outcome.len(),
            solver: opts.solver,
        })
    }

    /// Fit from named columns of a [`Dataset`].
    ///
    /// `treatments[k]` is paired with `instruments[k]`.
    pub fn fit_dataset(
        data: &Dataset, outcome: &str, treatments: &[&str], instruments: &[&str],
        opts: &FactorialIvOptions,
    ) -> FactorialIvResult<Self> {
        let y = data.numeric(outcome)?;
        let d = stack_columns(data, treatments)?;
        let z = stack_columns(data, instruments)?;
        Self::fit(y, d.view(), z.view(), opts)
    }

    pub fn k(&self) -> usize {
        self.grid.k()
    }

    pub fn nobs(&self) -> usize {
        self.nobs
    }

    pub fn solver(&self) -> MomentSolver {
        self.solver
    }

    pub fn grid(&self) -> &FactorialGrid {
        &self.grid
    }

    pub fn a_matrix(&self) -> &Array2<f64> {
        &self.matrices.a
    }

    pub fn b_matrix(&self) -> &Array2<f64> {
        &self.matrices.b
    }

    pub fn rho(&self) -> &Array1<f64> {
        &self.estimate.rho
    }

    pub fn psi(&self) -> &Array1<f64> {
        &self.estimate.psi
    }

    pub fn vcov(&self) -> &Array2<f64> {
        &self.estimate.vcov
    }

    /// L-BFGS iterations, `None` for the closed form.
    pub fn iterations(&self) -> Option<usize> {
        self.estimate.iterations
    }

    pub fn residual_norm(&self) -> f64 {
        self.estimate.residual_norm
    }

    pub fn mcafe(&self) -> &EffectEstimates {
        &self.mcafe
    }

    pub fn pcafe(&self) -> &EffectEstimates {
        &self.pcafe
    }

    pub fn effects(&self, estimand: Estimand) -> &EffectEstimates {
        match estimand {
            Estimand::Mcafe => &self.mcafe,
            Estimand::Pcafe => &self.pcafe,
        }
    }

    /// PCAFE tests and the perfect-complier share.
    pub fn summary(&self) -> FactorialIvResult<FactorialIvSummary> {
        let mut effects = Vec::with_capacity(self.k());
        for factor in 0..self.k() {
            let estimate = self.pcafe.estimate[factor];
            let std_error = self.pcafe.std_error[factor];
            let t_value = t_statistic(estimate, std_error)?;
            let p_value = pvalue_normal(t_value)?;
            effects.push(SummaryRow { factor, estimate, std_error, t_value, p_value });
        }
        let last = self.grid.perfect_complier();
        Ok(FactorialIvSummary {
            effects,
            complier_share: self.estimate.rho[last],
            complier_share_se: self.estimate.vcov[[last, last]].max(0.0).sqrt(),
        })
    }

    /// Tidy table: MCAFE rows then PCAFE rows, one per factor.
    ///
    /// With `conf_int`, each row carries `estimate ± z·se` where
    /// `z = Φ⁻¹(1 − (1 − conf_level)/2)`.
    ///
    /// # Errors
    /// - [`FactorialIvError::Inference`] for a confidence level outside
    ///   `(0, 1)` when `conf_int` is set.
    pub fn tidy(&self, conf_int: bool, conf_level: f64) -> FactorialIvResult<Vec<TidyRow>> {
        let mut rows = Vec::with_capacity(2 * self.k());
        for eff in [&self.mcafe, &self.pcafe] {
            for factor in 0..eff.estimate.len() {
                let estimate = eff.estimate[factor];
                let std_error = eff.std_error[factor];
                let (conf_low, conf_high) = if conf_int {
                    let (lo, hi) = confidence_interval(estimate, std_error, conf_level)?;
                    (Some(lo), Some(hi))
                } else {
                    (None, None)
                };
                rows.push(TidyRow {
                    estimand: eff.estimand,
                    factor,
                    estimate,
                    std_error,
                    conf_low,
                    conf_high,
                });
            }
        }
        Ok(rows)
    }
}

/// One PCAFE line of [`FactorialIV::summary`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow {
    pub factor: usize,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorialIvSummary {
    pub effects: Vec<SummaryRow>,
    pub complier_share: f64,
    pub complier_share_se: f64,
}

impl std::fmt::Display for FactorialIvSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, " Main effects among perfect compliers:\n")?;
        writeln!(
            f,
            "{:>8}{:>12}{:>12}{:>12}{:>8}",
            "factor", "estimate", "std.error", "tval", "pval"
        )?;
        for row in &self.effects {
            writeln!(
                f,
                "{:>8}{:>12.5}{:>12.5}{:>12.5}{:>8.3}",
                row.factor, row.estimate, row.std_error, row.t_value, row.p_value
            )?;
        }
        write!(
            f,
            "\nEstimated prob. of perfect compliers:  {:.5} \tSE =  {:.5}",
            self.complier_share, self.complier_share_se
        )
    }
}

/// One row of [`FactorialIV::tidy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TidyRow {
    pub estimand: Estimand,
    pub factor: usize,
    pub estimate: f64,
    pub std_error: f64,
    pub conf_low: Option<f64>,
    pub conf_high: Option<f64>,
}

fn validate_inputs(
    outcome: ArrayView1<'_, f64>, treatment: ArrayView2<'_, f64>, instrument: ArrayView2<'_, f64>,
) -> FactorialIvResult<FactorialGrid> {
    let n = outcome.len();
    if treatment.nrows() != n {
        return Err(FactorialIvError::DimensionMismatch {
            what: "treatment rows",
            expected: n,
            found: treatment.nrows(),
        });
    }
    if instrument.nrows() != n {
        return Err(FactorialIvError::DimensionMismatch {
            what: "instrument rows",
            expected: n,
            found: instrument.nrows(),
        });
    }
    if instrument.ncols() != treatment.ncols() {
        return Err(FactorialIvError::DimensionMismatch {
            what: "instrument columns",
            expected: treatment.ncols(),
            found: instrument.ncols(),
        });
    }
    let grid = FactorialGrid::new(treatment.ncols())?;

    for (what, m) in [("treatment", treatment.view()), ("instrument", instrument.view())] {
        if let Some(((row, col), &value)) =
            m.indexed_iter().find(|(_, v)| **v != 0.0 && **v != 1.0)
        {
            return Err(FactorialIvError::NotBinary { what, row, col, value });
        }
    }
    if let Some(row) = outcome.iter().position(|v| !v.is_finite()) {
        return Err(FactorialIvError::NonFiniteOutcome { row, value: outcome[row] });
    }
    let required = grid.n_patterns() + 1;
    if n < required {
        return Err(FactorialIvError::InsufficientData { nobs: n, required });
    }
    Ok(grid)
}

fn stack_columns(data: &Dataset, names: &[&str]) -> FactorialIvResult<Array2<f64>> {
    let mut out = Array2::<f64>::zeros((data.nrows(), names.len()));
    for (j, name) in names.iter().enumerate() {
        out.column_mut(j).assign(&data.numeric(name)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Axis, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Input validation (rows, factor counts, binary entries).
    // - The one-factor fit and its Wald value.
    // - summary() and tidy() contents and layout.
    // -------------------------------------------------------------------------

    fn one_factor_data() -> (Array1<f64>, Array2<f64>, Array2<f64>) {
        let z = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let d = array![0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0];
        let y = array![1.0, 2.0, 1.0, 2.0, 2.0, 3.0, 4.0, 3.0];
        (y, d.insert_axis(Axis(1)), z.insert_axis(Axis(1)))
    }

    #[test]
    // Purpose
    // -------
    // Input shape and encoding errors are caught before estimation.
    //
    // Given
    // -----
    // - Short treatment, two-column instrument, and a 2 in the treatment.
    //
    // Expect
    // ------
    // - `DimensionMismatch` twice, then `NotBinary` at (1, 0).
    fn fit_validates_inputs() {
        let (y, d, z) = one_factor_data();
        let opts = FactorialIvOptions::default();

        let short = d.slice(ndarray::s![..4, ..]);
        assert!(matches!(
            FactorialIV::fit(y.view(), short, z.view(), &opts),
            Err(FactorialIvError::DimensionMismatch { what: "treatment rows", .. })
        ));

        let wide = Array2::<f64>::zeros((8, 2));
        assert!(matches!(
            FactorialIV::fit(y.view(), d.view(), wide.view(), &opts),
            Err(FactorialIvError::DimensionMismatch { what: "instrument columns", .. })
        ));

        let mut bad = d.clone();
        bad[[1, 0]] = 2.0;
        assert!(matches!(
            FactorialIV::fit(y.view(), bad.view(), z.view(), &opts),
            Err(FactorialIvError::NotBinary { what: "treatment", row: 1, col: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // One-factor fit reproduces the Wald ratio for both estimands.
    //
    // Given
    // -----
    // - ΔȲ = 1.5, ΔD̄ = 0.5 across instrument arms.
    //
    // Expect
    // ------
    // - MCAFE = PCAFE = 3.0; complier share 0.5.
    fn one_factor_fit_matches_wald() {
        let (y, d, z) = one_factor_data();
        let model = FactorialIV::fit(y.view(), d.view(), z.view(), &FactorialIvOptions::default())
            .expect("identified");
        assert_eq!(model.k(), 1);
        assert_relative_eq!(model.mcafe().estimate[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(model.pcafe().estimate[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(model.rho()[2], 0.5, epsilon = 1e-12);
        assert!(model.iterations().is_none());
        assert_eq!(model.a_matrix().dim(), (4, 3));
        assert_eq!(model.b_matrix().dim(), (4, 4));
    }

    #[test]
    // Purpose
    // -------
    // summary() reports PCAFE rows and the perfect-complier share; tidy()
    // lists MCAFE first and attaches symmetric intervals on request.
    //
    // Given
    // -----
    // - The one-factor fit.
    //
    // Expect
    // ------
    // - One summary row with t = est/se; tidy rows [MCAFE, PCAFE]; no
    //   intervals without `conf_int`.
    fn summary_and_tidy_layout() {
        let (y, d, z) = one_factor_data();
        let model = FactorialIV::fit(y.view(), d.view(), z.view(), &FactorialIvOptions::default())
            .expect("identified");

        let summary = model.summary().expect("finite statistics");
        assert_eq!(summary.effects.len(), 1);
        let row = summary.effects[0];
        assert_relative_eq!(row.t_value, row.estimate / row.std_error, epsilon = 1e-12);
        assert_relative_eq!(summary.complier_share, 0.5, epsilon = 1e-12);
        // The share is ρ's last entry (index 2), not the last entry of vcov.
        let vcov = model.vcov();
        assert_eq!(vcov.nrows(), 3 + 4);
        assert_relative_eq!(summary.complier_share_se, vcov[[2, 2]].sqrt(), epsilon = 1e-15);
        assert!(summary.to_string().contains("Estimated prob. of perfect compliers"));

        let plain = model.tidy(false, 0.95).expect("no interval requested");
        assert_eq!(plain.len(), 2);
        assert_eq!((plain[0].estimand, plain[1].estimand), (Estimand::Mcafe, Estimand::Pcafe));
        assert!(plain[0].conf_low.is_none());

        let with_ci = model.tidy(true, 0.95).expect("valid level");
        let (lo, hi) = (with_ci[1].conf_low.expect("lo"), with_ci[1].conf_high.expect("hi"));
        assert_relative_eq!(hi - with_ci[1].estimate, with_ci[1].estimate - lo, epsilon = 1e-12);
        assert!(model.tidy(true, 1.5).is_err());
    }

    #[test]
    fn fit_dataset_reads_named_columns() {
        let (y, d, z) = one_factor_data();
        let data = Dataset::new()
            .with_numeric("y", y.clone())
            .and_then(|ds| ds.with_numeric("d", d.column(0).to_owned()))
            .and_then(|ds| ds.with_numeric("z", z.column(0).to_owned()))
            .expect("valid dataset");
        let opts = FactorialIvOptions::default();
        let from_data = FactorialIV::fit_dataset(&data, "y", &["d"], &["z"], &opts).expect("fits");
        let direct = FactorialIV::fit(y.view(), d.view(), z.view(), &opts).expect("fits");
        assert_eq!(from_data.rho(), direct.rho());
        assert!(matches!(
            FactorialIV::fit_dataset(&data, "y", &["d"], &["missing"], &opts),
            Err(FactorialIvError::Data(_))
        ));
    }
}
