//! Python argument extraction for the `python-bindings` feature.
//!
//! Helpers here turn loosely typed Python inputs (numpy arrays, pandas
//! objects, nested sequences, optional keyword arguments) into validated
//! crate types. Every failure is a `ValueError`/`TypeError`; nothing panics.
use std::str::FromStr;

use ndarray::{Array1, Array2};
use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

use crate::{
    model::{
        config::{BinnConfig, NetworkArchitecture},
        data::Observations,
    },
    training::options::{LineSearcher, Tolerances, TrainOptions},
};

/// Read a 1-D float64 array from a numpy array, pandas Series or sequence.
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
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Owned time batch from any 1-D input accepted by [`extract_f64_array`].
pub fn extract_times<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw)?;
    Ok(arr.as_array().to_owned())
}

/// Read a 2-D float64 matrix from a numpy array, a pandas DataFrame or a
/// sequence of equal-length rows.
pub fn extract_f64_matrix(raw: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(obj) = raw.call_method("to_numpy", (), None) {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr.as_array().to_owned());
        }
    }
    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or sequence of float64 rows",
        )
    })?;
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err("observed rows must all have the same length"));
    }
    let nrows = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| PyValueError::new_err(format!("invalid observed matrix: {e}")))
}

/// Validated observations from Python times and an observed matrix.
pub fn extract_observations<'py>(
    py: Python<'py>, t: &Bound<'py, PyAny>, observed: &Bound<'py, PyAny>,
) -> PyResult<Observations> {
    let time = extract_times(py, t)?;
    let values = extract_f64_matrix(observed)?;
    Ok(Observations::new(time, values)?)
}

/// Model configuration from the `BINN(...)` keyword arguments.
#[allow(clippy::too_many_arguments)]
pub fn build_binn_config(
    t_max_real: f64, keep_d: bool, chi_type: Option<&str>, masked_contact: bool,
    yita_bounds: Option<(f64, f64)>, num_samples: Option<usize>, seed: Option<u64>, deep: bool,
) -> PyResult<BinnConfig> {
    let architecture =
        if deep { NetworkArchitecture::deep() } else { NetworkArchitecture::standard() };
    let mut config = BinnConfig::new(t_max_real)
        .with_keep_d(keep_d)
        .with_chi_type(chi_type)?
        .with_masked_contact(masked_contact)
        .with_architecture(architecture);
    if let Some((lower, upper)) = yita_bounds {
        config = config.with_contact_bounds(lower, upper)?;
    }
    if let Some(n) = num_samples {
        config = config.with_num_samples(n);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

/// Training options from the `BINN.fit(...)` keyword arguments. With no
/// stopping rule given, [`Tolerances::default`] applies.
#[allow(clippy::too_many_arguments)]
pub fn extract_train_options(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, rounds: Option<usize>,
    seed: Option<u64>, verbose: Option<bool>,
) -> PyResult<TrainOptions> {
    let tols = if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        Tolerances::default()
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter)?
    };
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name)?,
        None => LineSearcher::MoreThuente,
    };
    let opts = TrainOptions::new(
        tols,
        ls,
        lbfgs_mem,
        rounds.unwrap_or(1),
        seed.unwrap_or(0),
        verbose.unwrap_or(false),
    )?;
    Ok(opts)
}
