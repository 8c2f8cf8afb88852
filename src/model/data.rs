//! Call-scoped intermediates and observed data.
//!
//! [`ForwardPass`] is what `forward` returns: the time batch it was called
//! with and the surrogate output. It is passed explicitly into the loss, so
//! no input batch is cached on the model between calls.
//!
//! [`Observations`] pairs a time batch with observed compartment fractions
//! and validates them once.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::model::errors::{BinnError, BinnResult};

/// Output of a forward call: the input times and the surrogate rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass {
    time: Array1<f64>,
    output: Array2<f64>,
}

impl ForwardPass {
    /// # Errors
    /// [`BinnError::ShapeMismatch`] when row counts differ.
    pub fn new(time: Array1<f64>, output: Array2<f64>) -> BinnResult<Self> {
        if time.len() != output.nrows() {
            return Err(BinnError::ShapeMismatch {
                context: "forward pass rows",
                expected: time.len(),
                found: output.nrows(),
            });
        }
        Ok(ForwardPass { time, output })
    }

    pub fn time(&self) -> ArrayView1<'_, f64> {
        self.time.view()
    }

    pub fn output(&self) -> ArrayView2<'_, f64> {
        self.output.view()
    }

    pub fn n_compartments(&self) -> usize {
        self.output.ncols()
    }

    pub fn into_parts(self) -> (Array1<f64>, Array2<f64>) {
        (self.time, self.output)
    }
}

/// Observed trajectory: times and compartment fractions, one row per time.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    time: Array1<f64>,
    values: Array2<f64>,
}

impl Observations {
    /// # Errors
    /// [`BinnError::InvalidObservations`] for an empty batch, mismatched row
    /// counts or non-finite entries.
    pub fn new(time: Array1<f64>, values: Array2<f64>) -> BinnResult<Self> {
        if time.is_empty() {
            return Err(invalid("observation batch is empty".to_string()));
        }
        if time.len() != values.nrows() {
            return Err(invalid(format!(
                "{} times but {} observation rows",
                time.len(),
                values.nrows()
            )));
        }
        if let Some((i, t)) = time.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(invalid(format!("time at index {i} is non-finite: {t}")));
        }
        if let Some(((r, c), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("value at row {r}, column {c} is non-finite: {v}")));
        }
        Ok(Observations { time, values })
    }

    pub fn time(&self) -> ArrayView1<'_, f64> {
        self.time.view()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// # Errors
    /// [`BinnError::ShapeMismatch`] unless there are `n_compartments` columns.
    pub fn ensure_compartments(&self, n_compartments: usize) -> BinnResult<()> {
        if self.values.ncols() != n_compartments {
            return Err(BinnError::ShapeMismatch {
                context: "observation columns",
                expected: n_compartments,
                found: self.values.ncols(),
            });
        }
        Ok(())
    }
}

fn invalid(reason: String) -> BinnError {
    BinnError::InvalidObservations { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Observation validation.
    //
    // Given
    // -----
    // Mismatched rows, a NaN value, an empty batch; then a valid batch
    // checked against the wrong compartment count.
    //
    // Expect
    // ------
    // `InvalidObservations` for the first three, `ShapeMismatch` for the last.
    fn observations_validate() {
        assert!(matches!(
            Observations::new(array![0.0, 1.0], array![[0.5, 0.5]]),
            Err(BinnError::InvalidObservations { .. })
        ));
        assert!(matches!(
            Observations::new(array![0.0], array![[0.5, f64::NAN]]),
            Err(BinnError::InvalidObservations { .. })
        ));
        assert!(matches!(
            Observations::new(Array1::zeros(0), Array2::zeros((0, 2))),
            Err(BinnError::InvalidObservations { .. })
        ));

        let ok = Observations::new(array![0.0, 0.5], array![[0.5, 0.5], [0.4, 0.6]]).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(ok.ensure_compartments(2).is_ok());
        assert_eq!(
            ok.ensure_compartments(9),
            Err(BinnError::ShapeMismatch { context: "observation columns", expected: 9, found: 2 })
        );
    }
}
