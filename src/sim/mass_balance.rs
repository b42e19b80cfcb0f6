use serde::{Deserialize, Serialize};
use std::fmt;

/// Holds the relative error of the mass balance
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum RelativeError {
    /// Absolute error divided by the magnitude of the expected change
    Value(f64),

    /// The expected change is zero; the relative error is not defined
    Undefined,
}

/// Holds the result of a mass-balance check
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct MassBalance {
    /// Step of the check
    pub step: usize,

    /// Simulation time of the check
    pub time: f64,

    /// Change of the total saturation since the beginning
    pub actual: f64,

    /// Change of the total saturation implied by the boundary fluxes
    pub expected: f64,

    /// Absolute value of the difference between actual and expected
    pub absolute_error: f64,

    /// Relative error
    pub relative_error: RelativeError,
}

impl MassBalance {
    /// Indicates whether the relative error exceeds the tolerance
    ///
    /// An undefined relative error never exceeds the tolerance.
    pub fn exceeds(&self, tolerance: f64) -> bool {
        match self.relative_error {
            RelativeError::Value(e) => e > tolerance,
            RelativeError::Undefined => false,
        }
    }
}

impl fmt::Display for RelativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeError::Value(e) => write!(f, "{:e}", e),
            RelativeError::Undefined => write!(f, "undefined (zero expected change)"),
        }
    }
}

/// Accumulates the saturation entering and leaving the domain
///
/// The expected change of the total saturation after n steps is
///
/// ```text
/// n·SM·Σq_top + (bottom exchange) - (rejected overflow)
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MassBalanceTracker {
    /// Total saturation at the beginning
    initial_total: f64,

    /// Saturation entering through the top face at each step
    top_per_step: f64,

    /// Accumulated saturation exchanged through the bottom face
    bottom_exchange: f64,

    /// Accumulated saturation removed by the overflow return
    rejected: f64,
}

impl MassBalanceTracker {
    /// Allocates a new instance
    pub fn new(initial_total: f64, sm: f64, total_top_flux: f64) -> Self {
        MassBalanceTracker {
            initial_total,
            top_per_step: sm * total_top_flux,
            bottom_exchange: 0.0,
            rejected: 0.0,
        }
    }

    /// Records the saturation exchanged through the bottom face in one step
    pub fn record_bottom(&mut self, amount: f64) {
        self.bottom_exchange += amount;
    }

    /// Records the saturation removed by the overflow return in one step
    pub fn record_rejected(&mut self, amount: f64) {
        self.rejected += amount;
    }

    /// Returns the accumulated bottom exchange
    pub fn bottom_exchange(&self) -> f64 {
        self.bottom_exchange
    }

    /// Returns the accumulated rejected overflow
    pub fn rejected(&self) -> f64 {
        self.rejected
    }

    /// Returns the expected change of the total saturation after a number of steps
    pub fn expected(&self, step: usize) -> f64 {
        (step as f64) * self.top_per_step + self.bottom_exchange - self.rejected
    }

    /// Compares the current total saturation with the expected one
    ///
    /// The relative error is undefined when the expected change is round-off
    /// relative to the magnitude of the terms adding up to it.
    pub fn check(&self, step: usize, time: f64, current_total: f64) -> MassBalance {
        let actual = current_total - self.initial_total;
        let expected = self.expected(step);
        let added =
            (step as f64) * f64::abs(self.top_per_step) + f64::abs(self.bottom_exchange) + f64::abs(self.rejected);
        let absolute_error = f64::abs(actual - expected);
        let relative_error = if f64::abs(expected) <= f64::EPSILON * f64::max(added, 1.0) {
            RelativeError::Undefined
        } else {
            RelativeError::Value(absolute_error / f64::abs(expected))
        };
        MassBalance {
            step,
            time,
            actual,
            expected,
            absolute_error,
            relative_error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{MassBalanceTracker, RelativeError};
    use approx::assert_relative_eq;

    #[test]
    fn check_works() {
        let mut tracker = MassBalanceTracker::new(10.0, 0.5, 0.2);
        let balance = tracker.check(100, 1.0, 20.0);
        assert_relative_eq!(balance.expected, 10.0, epsilon = 1e-14);
        assert_relative_eq!(balance.actual, 10.0, epsilon = 1e-14);
        assert_eq!(balance.relative_error, RelativeError::Value(0.0));
        assert!(!balance.exceeds(1e-3));

        tracker.record_bottom(-1.0);
        tracker.record_rejected(0.5);
        assert_relative_eq!(tracker.expected(100), 8.5, epsilon = 1e-14);
        let balance = tracker.check(100, 1.0, 20.0);
        assert_relative_eq!(balance.absolute_error, 1.5, epsilon = 1e-14);
        match balance.relative_error {
            RelativeError::Value(e) => assert_relative_eq!(e, 1.5 / 8.5, epsilon = 1e-14),
            RelativeError::Undefined => panic!("relative error should be defined"),
        }
        assert!(balance.exceeds(1e-3));
    }

    #[test]
    fn zero_inflow_gives_undefined_relative_error() {
        let tracker = MassBalanceTracker::new(3.0, 0.5, 0.0);
        let balance = tracker.check(50, 0.5, 3.0 + 1e-9);
        assert_eq!(balance.relative_error, RelativeError::Undefined);
        assert_relative_eq!(balance.absolute_error, 1e-9, epsilon = 1e-15);
        assert!(!balance.exceeds(1e-3));
        assert_eq!(format!("{}", balance.relative_error), "undefined (zero expected change)");
    }

    #[test]
    fn cancelling_exchanges_give_undefined_relative_error() {
        // 0.1 + 0.2 - 0.3 leaves a residue of about 5.5e-17
        let mut tracker = MassBalanceTracker::new(3.0, 0.5, 0.0);
        tracker.record_bottom(0.1);
        tracker.record_bottom(0.2);
        tracker.record_rejected(0.3);
        assert!(tracker.expected(10) != 0.0);
        let balance = tracker.check(10, 0.1, 3.0 + 1e-12);
        assert_eq!(balance.relative_error, RelativeError::Undefined);
        assert!(!balance.exceeds(1e-3));

        // a tiny but genuine change stays defined
        let tracker = MassBalanceTracker::new(3.0, 1e-10, 1.0);
        let balance = tracker.check(1, 0.1, 3.0 + 1e-10);
        match balance.relative_error {
            RelativeError::Value(e) => assert!(e < 1e-5),
            RelativeError::Undefined => panic!("relative error should be defined"),
        }
    }
}
