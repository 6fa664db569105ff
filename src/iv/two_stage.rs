//! iv::two_stage — classical two-stage least squares.
//!
//! Purpose
//! -------
//! Estimate the effect of an endogenous treatment on an outcome using one
//! or more excluded instruments plus exogenous controls, and report the
//! first-stage diagnostics needed to judge instrument relevance.
//!
//! Key behaviors
//! -------------
//! - Stage 1 regresses the treatment on `[1, instruments, controls]` and
//!   keeps the fitted values `D̂`.
//! - Stage 2 regresses the outcome on `[1, D̂, controls]`.
//! - The joint instrument F test compares stage 1 with the controls-only
//!   model; the overall stage-1 F test is reported alongside it.
//! - Standard errors are homoskedastic. [`StructuralSe::Corrected`]
//!   recomputes the residual variance with the observed treatment.
//!
//! Invariants & assumptions
//! ------------------------
//! - Rows with missing values were removed by the caller; any non-finite
//!   value in a referenced column is reported as a data error.
//! - At least `instruments + controls + 2` rows are required.
//! - Rank deficiency in either design is reported as
//!   [`IvError::SingularDesign`] with the failing [`Stage`]; no
//!   coefficients are returned from a singular system.
use crate::{
    data::Dataset,
    inference::hessian::standard_errors,
    iv::{
        errors::{IvError, IvResult, Stage},
        formula::IvFormula,
        options::{StructuralSe, TslsOptions},
    },
    regression::{DesignMatrix, FTest, OlsFit, RegressionError, coefficient_tests, fit_ols},
};
use ndarray::{Array1, Array2, ArrayView1};

/// First-stage (reduced-form) results.
///
/// Per-instrument vectors are aligned with [`IvFormula::instruments`].
#[derive(Debug, Clone, PartialEq)]
pub struct FirstStage {
    pub instruments: Vec<String>,
    pub coef: Array1<f64>,
    pub se: Array1<f64>,
    pub t_stat: Array1<f64>,
    pub p_value: Array1<f64>,
    /// Joint test of the excluded instruments against the controls-only model.
    pub partial_f: FTest,
    /// Test of every non-intercept regressor.
    pub overall_f: FTest,
    pub r_squared: f64,
    pub partial_r_squared: f64,
    pub nobs: usize,
    /// `Some` only when an [`InstrumentStrength`](crate::iv::InstrumentStrength)
    /// threshold was supplied.
    pub passes_strength: Option<bool>,
    pub fit: OlsFit,
}

/// Second-stage (structural) results.
///
/// Coefficients are ordered `[const, <treatment>_hat, controls…]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondStage {
    pub names: Vec<String>,
    pub coef: Array1<f64>,
    pub se: Array1<f64>,
    pub t_stat: Array1<f64>,
    pub p_value: Array1<f64>,
    pub vcov: Array2<f64>,
    pub sigma2: f64,
    pub r_squared: f64,
    pub nobs: usize,
    pub df_resid: usize,
    pub structural_se: StructuralSe,
}

/// Complete 2SLS fit for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TslsFit {
    pub formula: IvFormula,
    pub first_stage: FirstStage,
    pub second_stage: SecondStage,
}

/// Index of the fitted treatment in the second-stage coefficients.
const EFFECT_IDX: usize = 1;

impl TslsFit {
    /// Causal effect estimate: the coefficient on the fitted treatment.
    pub fn effect(&self) -> f64 {
        self.second_stage.coef[EFFECT_IDX]
    }

    pub fn effect_se(&self) -> f64 {
        self.second_stage.se[EFFECT_IDX]
    }

    pub fn effect_t(&self) -> f64 {
        self.second_stage.t_stat[EFFECT_IDX]
    }

    pub fn effect_p(&self) -> f64 {
        self.second_stage.p_value[EFFECT_IDX]
    }

    pub fn nobs(&self) -> usize {
        self.second_stage.nobs
    }
}

/// Fit 2SLS of `formula` on `data`.
///
/// # Errors
/// - [`IvError::NoInstruments`] / [`IvError::OverlappingRoles`] for an
///   invalid formula.
/// - [`IvError::Data`] for a missing, non-numeric, or non-finite column.
/// - [`IvError::InsufficientData`] when `n < instruments + controls + 2`.
/// - [`IvError::SingularDesign`] when either design is rank deficient.
pub fn fit_2sls(formula: &IvFormula, data: &Dataset, opts: &TslsOptions) -> IvResult<TslsFit> {
    formula.validate()?;
    let nobs = data.nrows();
    let required = formula.min_rows();
    if nobs < required {
        return Err(IvError::InsufficientData { nobs, required });
    }

    let y = data.numeric(&formula.outcome)?;
    let d = data.numeric(&formula.treatment)?;
    let instruments = named_columns(data, &formula.instruments)?;
    let controls = named_columns(data, &formula.controls)?;

    let first_stage = first_stage(d, &instruments, &controls, opts)?;

    let hat_name = format!("{}_hat", formula.treatment);
    let d_hat = first_stage.fit.fitted.clone();
    let mut structural: Vec<(&str, ArrayView1<'_, f64>)> = vec![(hat_name.as_str(), d_hat.view())];
    structural.extend(controls.iter().copied());
    let second_stage = second_stage(y, d, &structural, opts.structural_se)?;

    Ok(TslsFit { formula: formula.clone(), first_stage, second_stage })
}

fn named_columns<'a>(
    data: &'a Dataset, names: &'a [String],
) -> IvResult<Vec<(&'a str, ArrayView1<'a, f64>)>> {
    names
        .iter()
        .map(|name| -> IvResult<(&'a str, ArrayView1<'a, f64>)> {
            Ok((name.as_str(), data.numeric(name)?))
        })
        .collect()
}

fn first_stage<'a>(
    d: ArrayView1<'_, f64>, instruments: &[(&'a str, ArrayView1<'a, f64>)],
    controls: &[(&'a str, ArrayView1<'a, f64>)], opts: &TslsOptions,
) -> IvResult<FirstStage> {
    let to_err = |err: RegressionError| IvError::from_regression(Stage::First, err);
    let m = instruments.len();

    let columns: Vec<(&'a str, ArrayView1<'a, f64>)> =
        instruments.iter().chain(controls.iter()).copied().collect();
    let design = DesignMatrix::with_intercept(&columns).map_err(to_err)?;
    let fit = fit_ols(d, &design).map_err(to_err)?;

    // Controls-only model: intercept plus the trailing control columns.
    let keep: Vec<usize> = std::iter::once(0).chain(m + 1..design.ncols()).collect();
    let restricted = fit_ols(d, &design.select_columns(&keep)).map_err(to_err)?;

    let partial_f = fit.partial_f(restricted.rss, m).map_err(to_err)?;
    let overall_f = fit.partial_f(fit.tss, design.ncols() - 1).map_err(to_err)?;
    let partial_r_squared =
        if restricted.rss > 0.0 { 1.0 - fit.rss / restricted.rss } else { 0.0 };
    let passes_strength =
        opts.strength.map(|rule| rule.passes(partial_f.statistic, partial_f.p_value));

    let slice = |v: &Array1<f64>| v.slice(ndarray::s![1..=m]).to_owned();
    Ok(FirstStage {
        instruments: instruments.iter().map(|(n, _)| (*n).to_string()).collect(),
        coef: slice(&fit.coef),
        se: slice(&fit.se),
        t_stat: slice(&fit.t_stat),
        p_value: slice(&fit.p_value),
        partial_f,
        overall_f,
        r_squared: fit.r_squared,
        partial_r_squared,
        nobs: fit.nobs,
        passes_strength,
        fit,
    })
}

fn second_stage(
    y: ArrayView1<'_, f64>, d: ArrayView1<'_, f64>, columns: &[(&str, ArrayView1<'_, f64>)],
    structural_se: StructuralSe,
) -> IvResult<SecondStage> {
    let to_err = |err: RegressionError| IvError::from_regression(Stage::Second, err);
    let design = DesignMatrix::with_intercept(columns).map_err(to_err)?;
    let fit = fit_ols(y, &design).map_err(to_err)?;

    let (sigma2, vcov, se, t_stat, p_value) = match structural_se {
        StructuralSe::Naive => {
            (fit.sigma2, fit.vcov.clone(), fit.se.clone(), fit.t_stat.clone(), fit.p_value.clone())
        }
        StructuralSe::Corrected => {
            let mut x_obs = design.matrix().clone();
            x_obs.column_mut(EFFECT_IDX).assign(&d);
            let resid = &y - &x_obs.dot(&fit.coef);
            let sigma2 = resid.dot(&resid) / fit.df_resid as f64;
            let vcov = &fit.gram_inv * sigma2;
            let se = standard_errors(&vcov);
            let (t_stat, p_value) =
                coefficient_tests(&fit.coef, &se, fit.df_resid).map_err(to_err)?;
            (sigma2, vcov, se, t_stat, p_value)
        }
    };

    Ok(SecondStage {
        names: fit.names,
        coef: fit.coef,
        se,
        t_stat,
        p_value,
        vcov,
        sigma2,
        r_squared: fit.r_squared,
        nobs: fit.nobs,
        df_resid: fit.df_resid,
        structural_se,
    })
}
