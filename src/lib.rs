//! cup_causal — causal-effect estimators for stage-stratified competition data.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the estimators to Python via the `_cup_causal` extension module.
//! The estimators answer questions such as "what is the effect of advancing
//! in a cup round on later league performance", where treatment is not
//! randomized but instruments or observed confounders are available.
//!
//! Key behaviors
//! -------------
//! - [`iv`]: two-stage least squares, on one sample or per stratum, with
//!   first-stage strength diagnostics.
//! - [`factorial_iv`]: the factorial instrumental-variables estimator for
//!   several binary treatments with one binary instrument each.
//! - [`msm`]: marginal structural models by inverse probability of treatment
//!   weighting.
//! - [`data`], [`regression`], [`inference`], [`optimization`]: the shared
//!   table, least-squares, test-statistic, and L-BFGS layers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs arrive cleaned: no missing values, binary variables coded 0/1.
//!   Estimators validate and reject; they never impute.
//! - All heavy numerical work lives in the inner modules; the PyO3 items in
//!   this file perform only conversion and error mapping.
//!
//! Conventions
//! -----------
//! - Every fallible operation returns the `Result` alias of its module.
//!   Under `python-bindings` each module error converts to `ValueError`.
//! - Python-exposed classes live under `_cup_causal` and are wrapped by a
//!   thin pure-Python package.

pub mod data;
pub mod factorial_iv;
pub mod inference;
pub mod iv;
pub mod msm;
pub mod optimization;
pub mod regression;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::PyValueError,
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    factorial_iv::{EffectVariance, FactorialIvOptions, MomentSolver},
    iv::{InstrumentStrength, IvFormula, StratumOutcome, StructuralSe, TslsOptions},
    utils::{extract_dataset, extract_f64_array, extract_f64_matrix, extract_mle_opts},
};

/// FactorialIV — Python-facing wrapper for the factorial IV estimator.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `FactorialIV(outcome, treatment, instrument, solver="closed_form",
/// delta_method=False, degenerate_tol=1e-10, tol_grad=None, max_iter=None,
/// line_searcher=None)`:
/// - `outcome`: 1-D array-like of length `n`.
/// - `treatment`, `instrument`: `n × K` arrays of 0/1.
/// - `solver`: `"closed_form"` or `"lbfgs"`.
///
/// Notes
/// -----
/// - The model is fitted on construction and immutable afterwards; every
///   estimator error is raised as `ValueError`.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "FactorialIV", module = "cup_causal")]
pub struct PyFactorialIV {
    pub inner: factorial_iv::FactorialIV,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyFactorialIV {
    #[new]
    #[pyo3(
        signature = (
            outcome,
            treatment,
            instrument,
            solver = "closed_form",
            delta_method = false,
            degenerate_tol = factorial_iv::DEFAULT_DEGENERATE_TOL,
            tol_grad = None,
            max_iter = None,
            line_searcher = None,
        ),
        text_signature = "(outcome, treatment, instrument, /, solver='closed_form', \
                          delta_method=False, degenerate_tol=1e-10, tol_grad=None, \
                          max_iter=None, line_searcher=None)"
    )]
    pub fn new<'py>(
        py: Python<'py>, outcome: &Bound<'py, PyAny>, treatment: &Bound<'py, PyAny>,
        instrument: &Bound<'py, PyAny>, solver: &str, delta_method: bool, degenerate_tol: f64,
        tol_grad: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
    ) -> PyResult<Self> {
        let solver = match solver.to_lowercase().as_str() {
            "closed_form" => MomentSolver::ClosedForm,
            "lbfgs" => MomentSolver::Lbfgs,
            other => {
                return Err(PyValueError::new_err(format!(
                    "solver must be 'closed_form' or 'lbfgs', got '{other}'"
                )));
            }
        };
        let variance = if delta_method {
            EffectVariance::DeltaMethod
        } else {
            EffectVariance::FixedDenominator
        };
        let mle = extract_mle_opts(
            factorial_iv::moment_mle_options(),
            tol_grad,
            max_iter,
            line_searcher,
        )?;
        let opts = FactorialIvOptions::new(solver, variance, degenerate_tol, mle)?;

        let y = extract_f64_array(py, outcome)?;
        let d = extract_f64_matrix(py, treatment)?;
        let z = extract_f64_matrix(py, instrument)?;
        let inner =
            factorial_iv::FactorialIV::fit(y.as_array(), d.as_array(), z.as_array(), &opts)?;
        Ok(Self { inner })
    }

    #[getter]
    pub fn k(&self) -> usize {
        self.inner.k()
    }

    #[getter]
    pub fn nobs(&self) -> usize {
        self.inner.nobs()
    }

    #[getter]
    pub fn rho(&self) -> Vec<f64> {
        self.inner.rho().to_vec()
    }

    #[getter]
    pub fn psi(&self) -> Vec<f64> {
        self.inner.psi().to_vec()
    }

    #[getter]
    pub fn vcov(&self) -> Vec<Vec<f64>> {
        self.inner.vcov().rows().into_iter().map(|r| r.to_vec()).collect()
    }

    /// Compliance-type labels in the order of `rho`, e.g. `"ac"`.
    #[getter]
    pub fn ps_grid(&self) -> Vec<String> {
        let grid = self.inner.grid();
        (0..grid.n_types()).map(|t| grid.type_label(t)).collect()
    }

    #[getter]
    pub fn mcafe_est(&self) -> Vec<f64> {
        self.inner.mcafe().estimate.to_vec()
    }

    #[getter]
    pub fn mcafe_se(&self) -> Vec<f64> {
        self.inner.mcafe().std_error.to_vec()
    }

    #[getter]
    pub fn pcafe_est(&self) -> Vec<f64> {
        self.inner.pcafe().estimate.to_vec()
    }

    #[getter]
    pub fn pcafe_se(&self) -> Vec<f64> {
        self.inner.pcafe().std_error.to_vec()
    }

    /// Formatted PCAFE table and perfect-complier share.
    pub fn summary(&self) -> PyResult<String> {
        Ok(self.inner.summary()?.to_string())
    }

    /// One dict per (estimand, factor); MCAFE rows first.
    #[pyo3(signature = (conf_int = false, conf_level = 0.95))]
    pub fn tidy<'py>(
        &self, py: Python<'py>, conf_int: bool, conf_level: f64,
    ) -> PyResult<Vec<Bound<'py, PyDict>>> {
        let mut out = Vec::new();
        for row in self.inner.tidy(conf_int, conf_level)? {
            let dict = PyDict::new(py);
            dict.set_item("estimand", row.estimand.to_string())?;
            dict.set_item("term", row.factor + 1)?;
            dict.set_item("estimate", row.estimate)?;
            dict.set_item("std.error", row.std_error)?;
            if conf_int {
                dict.set_item("conf.low", row.conf_low)?;
                dict.set_item("conf.high", row.conf_high)?;
            }
            out.push(dict);
        }
        Ok(out)
    }
}

/// Stratified 2SLS from a `{column: values}` mapping.
///
/// Returns one dict per stratum in ascending order. Failed strata carry
/// `None` estimates and the failure message under `"error"`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (
        data,
        outcome,
        treatment,
        instruments,
        stratum,
        controls = Vec::new(),
        corrected_se = false,
        min_f = None,
        max_p = None,
    ),
    text_signature = "(data, outcome, treatment, instruments, stratum, /, controls=[], \
                      corrected_se=False, min_f=None, max_p=None)"
)]
#[allow(clippy::too_many_arguments)]
pub fn fit_2sls_by_stratum<'py>(
    py: Python<'py>, data: &Bound<'py, PyDict>, outcome: &str, treatment: &str,
    instruments: Vec<String>, stratum: &str, controls: Vec<String>, corrected_se: bool,
    min_f: Option<f64>, max_p: Option<f64>,
) -> PyResult<Vec<Bound<'py, PyDict>>> {
    let dataset = extract_dataset(py, data)?;
    let formula = IvFormula::new(outcome, treatment).instruments(instruments).controls(controls);
    let strength = match (min_f, max_p) {
        (Some(f), Some(p)) => Some(InstrumentStrength::new(f, p)?),
        (None, None) => None,
        _ => return Err(PyValueError::new_err("min_f and max_p must be given together")),
    };
    let structural_se = if corrected_se { StructuralSe::Corrected } else { StructuralSe::Naive };
    let opts = TslsOptions::new(structural_se, strength);

    let mut out = Vec::new();
    for entry in iv::fit_2sls_by_stratum(&formula, &dataset, stratum, &opts)? {
        let dict = PyDict::new(py);
        dict.set_item("stratum", entry.label.to_string())?;
        dict.set_item("nobs", entry.nrows)?;
        match &entry.outcome {
            StratumOutcome::Fitted(fit) => {
                dict.set_item("effect", fit.effect())?;
                dict.set_item("std_error", fit.effect_se())?;
                dict.set_item("p_value", fit.effect_p())?;
                dict.set_item("r_squared", fit.second_stage.r_squared)?;
                dict.set_item("first_stage_f", fit.first_stage.partial_f.statistic)?;
                dict.set_item("first_stage_f_pvalue", fit.first_stage.partial_f.p_value)?;
                dict.set_item("passes_strength", fit.first_stage.passes_strength)?;
                dict.set_item("error", py.None())?;
            }
            StratumOutcome::Failed(err) => {
                for key in ["effect", "std_error", "p_value", "r_squared", "first_stage_f"] {
                    dict.set_item(key, py.None())?;
                }
                dict.set_item("error", err.to_string())?;
            }
        }
        out.push(dict);
    }
    Ok(out)
}

/// _cup_causal — PyO3 module initializer for the Python extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _cup_causal<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<PyFactorialIV>()?;
    m.add_function(wrap_pyfunction!(fit_2sls_by_stratum, m)?)?;
    Ok(())
}
