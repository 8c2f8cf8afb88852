//! Precomputed denoised trajectories and their time derivatives.
//!
//! Purpose
//! -------
//! Hold a smoothed compartment trajectory indexed by integer day together
//! with its estimated derivative, for models that train only the rates
//! against fixed data.
//!
//! Conventions
//! -----------
//! - Day `d` (1-based) is row `d − 1`.
//! - Times are rounded to the nearest day; a non-finite time or a day
//!   outside `[1, days]` is [`BinnError::TimeOutOfRange`], never clamped.
//! - Derivatives are per real-time day.
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, Axis};

use crate::model::errors::{BinnError, BinnResult};

/// Dense `(days, n_compartments)` values and derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputedDerivativeTable {
    values: Array2<f64>,
    derivatives: Array2<f64>,
}

impl PrecomputedDerivativeTable {
    /// # Errors
    /// [`BinnError::InvalidDerivativeTable`] for mismatched shapes, an empty
    /// table, or non-finite entries.
    pub fn new(values: Array2<f64>, derivatives: Array2<f64>) -> BinnResult<Self> {
        if values.dim() != derivatives.dim() {
            return Err(invalid(format!(
                "values {:?} and derivatives {:?} differ in shape",
                values.dim(),
                derivatives.dim()
            )));
        }
        if values.is_empty() {
            return Err(invalid("table is empty".to_string()));
        }
        for (name, block) in [("values", &values), ("derivatives", &derivatives)] {
            if let Some(((d, c), v)) = block.indexed_iter().find(|(_, v)| !v.is_finite()) {
                return Err(invalid(format!("{name}[{d}, {c}] is non-finite: {v}")));
            }
        }
        Ok(PrecomputedDerivativeTable { values, derivatives })
    }

    /// From a `(days, n_compartments, 2)` block: layer 0 values, layer 1
    /// derivatives.
    pub fn from_stacked(table: Array3<f64>) -> BinnResult<Self> {
        if table.len_of(Axis(2)) != 2 {
            return Err(invalid(format!(
                "stacked table needs 2 layers in the last axis, found {}",
                table.len_of(Axis(2))
            )));
        }
        let values = table.index_axis(Axis(2), 0).to_owned();
        let derivatives = table.index_axis(Axis(2), 1).to_owned();
        PrecomputedDerivativeTable::new(values, derivatives)
    }

    pub fn days(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_compartments(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn derivatives(&self) -> ArrayView2<'_, f64> {
        self.derivatives.view()
    }

    /// Row index for each time.
    pub fn row_indices(&self, time: ArrayView1<f64>) -> BinnResult<Vec<usize>> {
        let max = self.days() as f64;
        time.iter()
            .enumerate()
            .map(|(index, &value)| {
                let day = value.round();
                if !day.is_finite() || day < 1.0 || day > max {
                    Err(BinnError::TimeOutOfRange { index, value, min: 1.0, max })
                } else {
                    Ok(day as usize - 1)
                }
            })
            .collect()
    }

    /// `(values, derivatives)` rows for each time.
    pub fn lookup(&self, time: ArrayView1<f64>) -> BinnResult<(Array2<f64>, Array2<f64>)> {
        let rows = self.row_indices(time)?;
        Ok((self.values.select(Axis(0), &rows), self.derivatives.select(Axis(0), &rows)))
    }
}

fn invalid(reason: String) -> BinnError {
    BinnError::InvalidDerivativeTable { reason }
}
