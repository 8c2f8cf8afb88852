//! Policy curve: deterministic intervention strength over real time.
//!
//! Purpose
//! -------
//! Map a batch of real-time values (days) to the scalar multiplier `chi(t)`
//! that scales the learned tracing rate. The curve has no learned state.
//!
//! Key behaviors
//! -------------
//! - [`PolicyCurve::Linear`]: tent rising with slope `ub / 75` over
//!   `t ∈ [0, 75)`, falling over `[75, 150)`, zero afterwards. Callers pass
//!   `1 + t`, so the first sampled day is already slightly above 0.
//! - [`PolicyCurve::Sinusoidal`]: `0.3 · (1 + sin(t·π/40)) / 2`; ignores `ub`.
//! - [`PolicyCurve::PiecewiseBeta`]: a Beta(3, 3) density on a 159-day
//!   window, normalized so its peak equals `ub`. Below day 80 the rising
//!   half is used, on `[80, 120)` the curve is flat at `ub`, and from day 120
//!   the falling half is used, shifted 40 days later.
//! - [`PolicyCurve::Constant`]: `ub` everywhere.
//!
//! Conventions
//! -----------
//! - Shape identifiers are case-insensitive; `None` resolves to `linear`.
//! - Unknown identifiers are [`PolicyError::UnknownShape`] at construction,
//!   never a silent fallback.
use std::{f64::consts::PI, str::FromStr};

use ndarray::{Array1, ArrayView1};
use statrs::distribution::{Beta, Continuous};

use crate::policy::errors::{PolicyError, PolicyResult};

/// Days over which the linear curve rises (and then falls).
pub const LINEAR_RAMP_DAYS: f64 = 75.0;
/// Window length used to scale time into the Beta kernel's support.
pub const BETA_WINDOW_DAYS: f64 = 159.0;
/// Start of the flat plateau of the piecewise-beta curve.
pub const PLATEAU_START: f64 = 80.0;
/// End (exclusive) of the flat plateau of the piecewise-beta curve.
pub const PLATEAU_END: f64 = 120.0;
/// Horizontal shift applied to the falling tail of the piecewise-beta curve.
const FALLING_TAIL_SHIFT: f64 = PLATEAU_END - PLATEAU_START;
const SINUSOID_AMPLITUDE: f64 = 0.3;
const SINUSOID_PERIOD_DIVISOR: f64 = 40.0;

/// Selectable policy-curve shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyCurve {
    #[default]
    Linear,
    Sinusoidal,
    PiecewiseBeta,
    Constant,
}

impl PolicyCurve {
    /// Resolve an optional identifier; `None` means [`PolicyCurve::Linear`].
    ///
    /// # Errors
    /// [`PolicyError::UnknownShape`] for unrecognized identifiers.
    pub fn from_identifier(name: Option<&str>) -> PolicyResult<Self> {
        match name {
            None => Ok(PolicyCurve::Linear),
            Some(s) => s.parse(),
        }
    }

    pub fn identifier(self) -> &'static str {
        match self {
            PolicyCurve::Linear => "linear",
            PolicyCurve::Sinusoidal => "sin",
            PolicyCurve::PiecewiseBeta => "piecewise",
            PolicyCurve::Constant => "constant",
        }
    }

    /// Evaluate the curve at every time in `times` with peak `upper_bound`.
    ///
    /// # Errors
    /// - [`PolicyError::InvalidUpperBound`] when `upper_bound` is negative or
    ///   non-finite.
    /// - [`PolicyError::NonFiniteTime`] when any time is NaN/±inf.
    pub fn evaluate(self, times: ArrayView1<f64>, upper_bound: f64) -> PolicyResult<Array1<f64>> {
        if !upper_bound.is_finite() || upper_bound < 0.0 {
            return Err(PolicyError::InvalidUpperBound { value: upper_bound });
        }
        if let Some((index, &value)) = times.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(PolicyError::NonFiniteTime { index, value });
        }
        let out = match self {
            PolicyCurve::Linear => times.mapv(|t| linear(t, upper_bound)),
            PolicyCurve::Sinusoidal => times.mapv(sinusoidal),
            PolicyCurve::PiecewiseBeta => {
                let kernel = BetaKernel::new(upper_bound)?;
                times.mapv(|t| kernel.eval(t))
            }
            PolicyCurve::Constant => Array1::from_elem(times.len(), upper_bound),
        };
        Ok(out)
    }
}

impl FromStr for PolicyCurve {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(PolicyCurve::Linear),
            "sin" | "sinusoidal" => Ok(PolicyCurve::Sinusoidal),
            "piecewise" | "piecewise-beta" => Ok(PolicyCurve::PiecewiseBeta),
            "constant" => Ok(PolicyCurve::Constant),
            _ => Err(PolicyError::UnknownShape { name: s.to_string() }),
        }
    }
}

fn linear(t: f64, upper_bound: f64) -> f64 {
    let slope = upper_bound / LINEAR_RAMP_DAYS;
    if t < 0.0 {
        0.0
    } else if t < LINEAR_RAMP_DAYS {
        slope * (t + 1.0)
    } else if t < 2.0 * LINEAR_RAMP_DAYS {
        upper_bound - slope * (t - LINEAR_RAMP_DAYS + 1.0)
    } else {
        0.0
    }
}

fn sinusoidal(t: f64) -> f64 {
    SINUSOID_AMPLITUDE * (1.0 + (t * PI / SINUSOID_PERIOD_DIVISOR).sin()) / 2.0
}

struct BetaKernel {
    density: Beta,
    scale: f64,
    upper_bound: f64,
}

impl BetaKernel {
    fn new(upper_bound: f64) -> PolicyResult<Self> {
        let density =
            Beta::new(3.0, 3.0).map_err(|e| PolicyError::Kernel { reason: e.to_string() })?;
        let scale = upper_bound / density.pdf(0.5);
        Ok(BetaKernel { density, scale, upper_bound })
    }

    fn pdf(&self, x: f64) -> f64 {
        if (0.0..=1.0).contains(&x) { self.density.pdf(x) } else { 0.0 }
    }

    fn eval(&self, t: f64) -> f64 {
        if t < PLATEAU_START {
            self.pdf(t / BETA_WINDOW_DAYS) * self.scale
        } else if t >= PLATEAU_END {
            self.pdf((t - FALLING_TAIL_SHIFT) / BETA_WINDOW_DAYS) * self.scale
        } else {
            self.upper_bound
        }
    }
}

#[cfg(test)]
mod tests {
    //! Tests for the policy curves.
    //!
    //! Covered: each shape's reference values, identifier parsing, and input
    //! validation.
    use super::*;
    use ndarray::array;

    const TOL: f64 = 1e-12;

    #[test]
    // Purpose
    // -------
    // `constant` returns the upper bound everywhere.
    //
    // Given
    // -----
    // Times 0, 37.5, 300 and ub = 0.3.
    //
    // Expect
    // ------
    // All outputs equal 0.3.
    fn constant_returns_upper_bound_everywhere() {
        let out = PolicyCurve::Constant.evaluate(array![0.0, 37.5, 300.0].view(), 0.3).unwrap();
        assert!(out.iter().all(|v| (*v - 0.3).abs() < TOL));
    }

    #[test]
    // Purpose
    // -------
    // `linear` is a tent: small at 0, peak at 74, back to 0 by 150.
    //
    // Given
    // -----
    // ub = 0.3 and times 0, 74, 75, 149, 150, 200.
    //
    // Expect
    // ------
    // ub/75 at t=0, ub at t=74, ub - ub/75 at t=75 (descent starts), ub/75 at
    // t=149, zero at and past 150.
    fn linear_is_a_tent() {
        // Arrange
        let ub = 0.3;
        let times = array![0.0, 74.0, 75.0, 149.0, 150.0, 200.0];

        // Act
        let out = PolicyCurve::Linear.evaluate(times.view(), ub).unwrap();

        // Assert
        let r = ub / 75.0;
        assert!((out[0] - r).abs() < TOL);
        assert!((out[1] - ub).abs() < TOL);
        assert!((out[2] - (ub - r)).abs() < TOL);
        assert!((out[3] - r).abs() < TOL);
        assert!(out[4].abs() < TOL);
        assert!(out[5].abs() < TOL);
    }

    #[test]
    // Purpose
    // -------
    // `sinusoidal` stays in [0, 0.3] and ignores the upper bound.
    //
    // Given
    // -----
    // Times 0, 20, 60 and two different upper bounds.
    //
    // Expect
    // ------
    // 0.15 at 0, 0.3 at the crest (t=20), 0 at the trough (t=60), both bounds.
    fn sinusoidal_ignores_upper_bound() {
        let times = array![0.0, 20.0, 60.0];
        for ub in [0.1, 0.9] {
            let out = PolicyCurve::Sinusoidal.evaluate(times.view(), ub).unwrap();
            assert!((out[0] - 0.15).abs() < TOL);
            assert!((out[1] - 0.3).abs() < TOL);
            assert!(out[2].abs() < TOL);
        }
    }

    #[test]
    // Purpose
    // -------
    // `piecewise` has a flat plateau at ub and shifted Beta tails.
    //
    // Given
    // -----
    // ub = 0.3; t = 60 (rising tail), t = 100 (plateau), t = 130 (falling
    // tail, shifted by 40 days), t = 0 and t = 199 (kernel support ends).
    //
    // Expect
    // ------
    // Plateau equals ub; tails match `30 x² (1 − x)² · ub / 1.875`; ends are 0.
    fn piecewise_beta_shape() {
        // Arrange
        let ub = 0.3;
        let reference = |x: f64| 30.0 * x * x * (1.0 - x) * (1.0 - x) * ub / 1.875;
        let times = array![0.0, 60.0, 100.0, 130.0, 199.0];

        // Act
        let out = PolicyCurve::PiecewiseBeta.evaluate(times.view(), ub).unwrap();

        // Assert
        assert!(out[0].abs() < 1e-12);
        assert!((out[1] - reference(60.0 / 159.0)).abs() < 1e-9);
        assert!((out[2] - ub).abs() < TOL);
        assert!((out[3] - reference(90.0 / 159.0)).abs() < 1e-9);
        assert!(out[4].abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Identifier resolution: defaults, aliases, unknown names.
    //
    // Given
    // -----
    // None, "SIN", "piecewise-beta", "exponential".
    //
    // Expect
    // ------
    // Linear, Sinusoidal, PiecewiseBeta, then `UnknownShape`.
    fn identifiers_resolve_or_fail() {
        assert_eq!(PolicyCurve::from_identifier(None), Ok(PolicyCurve::Linear));
        assert_eq!(PolicyCurve::from_identifier(Some("SIN")), Ok(PolicyCurve::Sinusoidal));
        assert_eq!(
            PolicyCurve::from_identifier(Some("piecewise-beta")),
            Ok(PolicyCurve::PiecewiseBeta)
        );
        assert_eq!(
            PolicyCurve::from_identifier(Some("exponential")),
            Err(PolicyError::UnknownShape { name: "exponential".to_string() })
        );
    }

    #[test]
    // Purpose
    // -------
    // Invalid inputs are rejected.
    //
    // Given
    // -----
    // A NaN time, and a negative upper bound.
    //
    // Expect
    // ------
    // `NonFiniteTime` and `InvalidUpperBound`.
    fn invalid_inputs_are_rejected() {
        assert!(matches!(
            PolicyCurve::Linear.evaluate(array![1.0, f64::NAN].view(), 0.3),
            Err(PolicyError::NonFiniteTime { index: 1, .. })
        ));
        assert_eq!(
            PolicyCurve::Constant.evaluate(array![1.0].view(), -0.1),
            Err(PolicyError::InvalidUpperBound { value: -0.1 })
        );
    }
}
