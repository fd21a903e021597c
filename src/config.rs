// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Render configuration.  A `RenderConfig` is built once per round
//! and never mutated afterwards; every worker gets its own copy.

use num_cpus;

use errors::{RenderError, Result};
use planes::PlaneWindow;

/// Whether the iterate that crossed the bailout is itself plotted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EscapePolicy {
    /// Stop recording at the last iterate inside the bailout.
    Omit,
    /// Record the escaping iterate as the final step, if it lands on
    /// the plane.
    Include,
}

/// The parameters of one resolution round.
#[derive(Copy, Clone, Debug)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// The region of the complex plane that is imaged
    pub window: PlaneWindow,
    /// Iteration budget per orbit
    pub max_iterations: usize,
    /// Distance between samples, in pixels
    pub step: f64,
    /// Squared magnitude past which an orbit has escaped
    pub bailout: f64,
    /// Squared distance under which two iterates count as the same
    pub tolerance: f64,
    /// How many past iterates are compared against
    pub history: usize,
    /// Number of sampling workers
    pub threads: usize,
    /// Base of the per-worker seeds
    pub seed: u64,
    /// Whether the escaping step is plotted
    pub escape_policy: EscapePolicy,
}

impl Default for RenderConfig {
    fn default() -> RenderConfig {
        RenderConfig {
            width: 2160,
            height: 2160,
            window: PlaneWindow::new(-7.0, 3.0, -5.0, 5.0),
            max_iterations: 1 << 4,
            step: 0.125,
            bailout: 1024.0,
            tolerance: 1e-20,
            history: 4,
            threads: num_cpus::get(),
            seed: 0,
            escape_policy: EscapePolicy::Omit,
        }
    }
}

fn invalid(name: &'static str, reason: String) -> RenderError {
    RenderError::InvalidParameter { name, reason }
}

impl RenderConfig {
    /// A copy of this configuration with a different iteration budget.
    pub fn with_iterations(&self, max_iterations: usize) -> RenderConfig {
        RenderConfig {
            max_iterations,
            ..*self
        }
    }

    /// Number of pixels in the image.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rejects configurations no round can be run with.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        self.window.validate()?;
        if self.threads == 0 {
            return Err(RenderError::InvalidThreads);
        }
        if self.max_iterations == 0 {
            return Err(invalid("iterations", "must be at least 1".to_string()));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(invalid(
                "step",
                format!("must be positive and finite, got {}", self.step),
            ));
        }
        if !(self.bailout > 0.0) {
            return Err(invalid(
                "bailout",
                format!("must be positive, got {}", self.bailout),
            ));
        }
        if !(self.tolerance >= 0.0) {
            return Err(invalid(
                "tolerance",
                format!("must not be negative, got {}", self.tolerance),
            ));
        }
        if self.history == 0 {
            return Err(invalid("history", "must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// The sequence of iteration budgets rendered one after another.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule(Vec<usize>);

impl Schedule {
    /// Every power of two from `2^low` to `2^high` inclusive.
    pub fn powers_of_two(low: u32, high: u32) -> Result<Schedule> {
        if low > high {
            return Err(invalid(
                "powers",
                format!("{} is larger than {}", low, high),
            ));
        }
        if high >= usize::max_value().count_ones() {
            return Err(invalid("powers", format!("2^{} does not fit", high)));
        }
        Ok(Schedule((low..=high).map(|p| 1usize << p).collect()))
    }

    /// An explicit list of budgets.
    pub fn explicit(budgets: Vec<usize>) -> Result<Schedule> {
        if budgets.is_empty() || budgets.iter().any(|&b| b == 0) {
            return Err(invalid(
                "iterations",
                "need at least one budget, all positive".to_string(),
            ));
        }
        Ok(Schedule(budgets))
    }

    /// The budgets, in order.
    pub fn budgets(&self) -> &[usize] {
        &self.0
    }

    /// Number of rounds.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no rounds.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.len(), 2160 * 2160);
    }

    #[test]
    fn rejects_empty_resolution() {
        let config = RenderConfig {
            width: 0,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_window() {
        let config = RenderConfig {
            window: PlaneWindow::new(1.0, -1.0, -1.0, 1.0),
            ..RenderConfig::default()
        };
        match config.validate() {
            Err(RenderError::InvalidWindow(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_zero_threads() {
        let config = RenderConfig {
            threads: 0,
            ..RenderConfig::default()
        };
        match config.validate() {
            Err(RenderError::InvalidThreads) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_numeric_knobs() {
        let base = RenderConfig::default();
        let bad = vec![
            RenderConfig { step: 0.0, ..base },
            RenderConfig { step: ::std::f64::NAN, ..base },
            RenderConfig { bailout: -1.0, ..base },
            RenderConfig { tolerance: -1e-9, ..base },
            RenderConfig { history: 0, ..base },
            RenderConfig { max_iterations: 0, ..base },
        ];
        for config in bad {
            match config.validate() {
                Err(RenderError::InvalidParameter { .. }) => {}
                other => panic!("unexpected {:?} for {:?}", other, config),
            }
        }
    }

    #[test]
    fn zero_tolerance_is_allowed() {
        let config = RenderConfig {
            tolerance: 0.0,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn with_iterations_changes_only_the_budget() {
        let config = RenderConfig::default();
        let next = config.with_iterations(8192);
        assert_eq!(next.max_iterations, 8192);
        assert_eq!(next.window, config.window);
        assert_eq!(next.step, config.step);
    }

    #[test]
    fn powers_of_two_schedule() {
        let s = Schedule::powers_of_two(4, 13).unwrap();
        assert_eq!(s.len(), 10);
        assert_eq!(s.budgets()[0], 16);
        assert_eq!(s.budgets()[9], 8192);
        assert!(Schedule::powers_of_two(5, 4).is_err());
        assert!(Schedule::powers_of_two(0, 200).is_err());
    }

    #[test]
    fn explicit_schedule_rejects_zero() {
        assert!(Schedule::explicit(vec![]).is_err());
        assert!(Schedule::explicit(vec![10, 0]).is_err());
        assert_eq!(Schedule::explicit(vec![50]).unwrap().budgets(), &[50]);
    }
}
