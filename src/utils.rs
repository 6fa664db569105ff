//! Conversions from Python objects for the PyO3 bindings.
#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    data::Dataset,
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

/// Contiguous 1-D `f64` view of a numpy array, pandas Series, or sequence.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// 2-D `f64` view of a numpy array, pandas DataFrame, or nested sequence.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray2<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro);
    }
    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro);
        }
    }
    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D numpy.ndarray, pandas.DataFrame, or nested sequence")
    })?;
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err("rows must all have the same length"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let nrows = flat.len().checked_div(ncols).unwrap_or(0);
    let arr = ndarray::Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(arr.into_pyarray(py).readonly())
}

/// Build a [`Dataset`] from a `{name: column}` mapping.
///
/// Columns that convert to `f64` become numeric; anything else must be a
/// sequence of strings.
#[cfg(feature = "python-bindings")]
pub fn extract_dataset<'py>(py: Python<'py>, columns: &Bound<'py, PyDict>) -> PyResult<Dataset> {
    let mut data = Dataset::new();
    for (key, value) in columns.iter() {
        let name: String = key.extract()?;
        match extract_f64_array(py, &value) {
            Ok(arr) => data.add_numeric(&name, arr.as_array().to_owned())?,
            Err(_) => {
                let text: Vec<String> = value.extract().map_err(|_| {
                    PyTypeError::new_err(format!("column '{name}' is neither numeric nor text"))
                })?;
                data.add_text(&name, text)?
            }
        }
    }
    Ok(data)
}

/// Optimizer settings from optional Python keyword arguments, starting
/// from `base`.
#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    base: MLEOptions, tol_grad: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
) -> PyResult<MLEOptions> {
    use std::str::FromStr;

    let tols = Tolerances::new(
        tol_grad.or(base.tols.tol_grad),
        base.tols.tol_cost,
        max_iter.or(base.tols.max_iter),
    )?;
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name)?,
        None => base.line_searcher,
    };
    Ok(MLEOptions::new(tols, ls, base.verbose, base.lbfgs_mem)?)
}
