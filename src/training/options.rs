//! Training configuration: stopping rules, line search, rounds.
//!
//! - [`Tolerances`]: gradient-norm and cost-change tolerances plus an
//!   iteration cap, per L-BFGS round. At least one must be set.
//! - [`LineSearcher`]: line search used inside L-BFGS.
//! - [`TrainOptions`]: the above plus L-BFGS memory, number of collocation
//!   rounds, RNG seed for collocation sampling and verbosity.
use std::str::FromStr;

use crate::training::{
    errors::{TrainError, TrainResult},
    validation::{verify_tol_cost, verify_tol_grad},
};

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsed case-insensitively from `"MoreThuente"` / `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = TrainError;

    /// # Errors
    /// [`TrainError::InvalidLineSearch`] for any other name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(TrainError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limit for one L-BFGS round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`TrainError::NoTolerancesProvided`] if all three are `None`.
    /// - [`TrainError::InvalidTolGrad`] / [`TrainError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`TrainError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> TrainResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(TrainError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(TrainError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) }
    }
}

/// Options for [`fit`](crate::training::fit).
///
/// Defaults: `Tolerances::default()`, More–Thuente, L-BFGS memory 7, one
/// round, seed 0, not verbose.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    /// Number of collocation resamplings; each round runs its own L-BFGS.
    pub rounds: usize,
    /// Seed for the collocation sampler.
    pub seed: u64,
    pub verbose: bool,
}

impl TrainOptions {
    /// # Errors
    /// - [`TrainError::InvalidLBFGSMem`] for `lbfgs_mem == Some(0)`.
    /// - [`TrainError::InvalidRounds`] for `rounds == 0`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>, rounds: usize,
        seed: u64, verbose: bool,
    ) -> TrainResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(TrainError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        if rounds == 0 {
            return Err(TrainError::InvalidRounds { rounds });
        }
        Ok(Self { tols, line_searcher, lbfgs_mem, rounds, seed, verbose })
    }
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
            rounds: 1,
            seed: 0,
            verbose: false,
        }
    }
}
