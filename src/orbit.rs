// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The orbit evaluator.  Given a starting point, it iterates the
//! formula, recording which pixel every iterate lands on, until the
//! orbit escapes the bailout, settles into a fixed point or a short
//! cycle, or runs out of iterations.  Only escaping orbits are ever
//! plotted, and when they are, every on-plane pixel along the way
//! gets credit, not just the last one.

use num::Complex;

use complex::ComplexExt;
use config::{EscapePolicy, RenderConfig};
use formula::Formula;
use planes::PlaneMapper;

/// What happened at one iteration of an orbit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step {
    /// The iterate landed in the pixel at this linear offset.
    Pixel(usize),
    /// The iterate was outside the plane window.  Orbits may come
    /// back, so this does not end the orbit.
    OffPlane,
    /// The iterate matched one of the remembered iterates; the orbit
    /// ends here and will never escape.
    Trapped,
}

/// How an orbit ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The squared magnitude exceeded the bailout.
    Escaped,
    /// The iteration budget ran out first.
    NeverEscaped,
    /// A fixed point or cycle was detected.
    Trapped,
}

/// How an orbit ended, along with its steps when they matter.
#[derive(Clone, Debug, PartialEq)]
pub enum OrbitOutcome {
    /// The steps of an escaping orbit, ready to be plotted.
    Escaped(Vec<Step>),
    /// The iteration budget ran out first.
    NeverEscaped,
    /// A fixed point or cycle was detected.
    Trapped,
}

/// Iterates orbits for one formula over one plane.  Holds the
/// scratch buffers for the current orbit, so each worker owns one.
pub struct OrbitEvaluator<'a> {
    plane: PlaneMapper,
    formula: &'a Formula,
    max_iterations: usize,
    bailout: f64,
    tolerance: f64,
    escape_policy: EscapePolicy,
    // Ring of the last `history.len()` iterates, slot k % len.
    history: Vec<Complex<f64>>,
    steps: Vec<Step>,
    outcome: Outcome,
}

impl<'a> OrbitEvaluator<'a> {
    /// An evaluator for `formula` under `config`, mapping iterates
    /// through `plane`.
    pub fn new(plane: PlaneMapper, formula: &'a Formula, config: &RenderConfig) -> Self {
        OrbitEvaluator {
            plane,
            formula,
            max_iterations: config.max_iterations,
            bailout: config.bailout,
            tolerance: config.tolerance,
            escape_policy: config.escape_policy,
            history: vec![Complex::new(0.0, 0.0); config.history.max(1)],
            steps: Vec::with_capacity(config.max_iterations),
            outcome: Outcome::NeverEscaped,
        }
    }

    /// Classify a single iterate against the plane.
    fn locate(&self, z: &Complex<f64>) -> Step {
        match self.plane.point_to_offset(z) {
            Some(offset) => Step::Pixel(offset),
            None => Step::OffPlane,
        }
    }

    // NaN never compares below the tolerance, so a NaN iterate is
    // never trapped.
    fn is_trapped(&self, n: Complex<f64>) -> bool {
        self.history
            .iter()
            .any(|old| n.dist_sqr(*old) < self.tolerance)
    }

    /// Runs the orbit of `c`, leaving its steps in the evaluator.
    pub fn trace(&mut self, c: Complex<f64>) -> Outcome {
        let mut z = self.formula.start(c);
        for slot in self.history.iter_mut() {
            *slot = z;
        }
        self.steps.clear();
        let depth = self.history.len();

        self.outcome = Outcome::NeverEscaped;
        for k in 0..self.max_iterations {
            let n = self.formula.next(z, c);

            if self.is_trapped(n) {
                self.steps.push(Step::Trapped);
                self.outcome = Outcome::Trapped;
                break;
            }

            z = n;
            self.history[k % depth] = n;

            // Negated so NaN and infinity escape.
            if !(n.mag_sqr() <= self.bailout) {
                if self.escape_policy == EscapePolicy::Include {
                    let step = self.locate(&n);
                    self.steps.push(step);
                }
                self.outcome = Outcome::Escaped;
                break;
            }

            let step = self.locate(&n);
            self.steps.push(step);
        }
        self.outcome
    }

    /// The steps recorded by the last `trace`.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Runs the orbit of `c` and returns its outcome by value.
    pub fn evaluate(&mut self, c: Complex<f64>) -> OrbitOutcome {
        match self.trace(c) {
            Outcome::Escaped => OrbitOutcome::Escaped(self.steps.clone()),
            Outcome::NeverEscaped => OrbitOutcome::NeverEscaped,
            Outcome::Trapped => OrbitOutcome::Trapped,
        }
    }

    /// Whether the last traced orbit should be plotted.  A trap
    /// always wins, even over an escape recorded afterwards.
    pub fn is_committable(&self) -> bool {
        self.outcome == Outcome::Escaped && self.steps.last() != Some(&Step::Trapped)
    }

    /// Plots the last traced orbit into `counts` if it escaped, and
    /// returns the number of pixel visits added.
    pub fn commit(&self, counts: &mut [u64]) -> u64 {
        if !self.is_committable() {
            return 0;
        }
        let mut visits = 0;
        for step in &self.steps {
            if let Step::Pixel(offset) = *step {
                counts[offset] += 1;
                visits += 1;
            }
        }
        visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planes::PlaneWindow;

    fn config(max_iterations: usize) -> RenderConfig {
        RenderConfig {
            width: 8,
            height: 8,
            window: PlaneWindow::new(-2.0, 2.0, -2.0, 2.0),
            max_iterations,
            step: 1.0,
            bailout: 4.0,
            tolerance: 1e-20,
            history: 4,
            threads: 1,
            seed: 0,
            escape_policy: EscapePolicy::Omit,
        }
    }

    fn evaluator<'a>(config: &RenderConfig, formula: &'a Formula) -> OrbitEvaluator<'a> {
        let plane = PlaneMapper::new(config.width, config.height, config.window).unwrap();
        OrbitEvaluator::new(plane, formula, config)
    }

    fn mandelbrot() -> &'static Formula {
        Formula::lookup("mandelbrot").unwrap()
    }

    #[test]
    fn escaping_orbit_records_its_path() {
        let cfg = config(50);
        let mut ev = evaluator(&cfg, mandelbrot());
        // 0 -> 1 -> 2 -> 5: two iterates inside, the third escapes.
        match ev.evaluate(Complex::new(1.0, 0.0)) {
            OrbitOutcome::Escaped(steps) => {
                assert_eq!(steps.len(), 2);
                // The point 2+0i lies on the right edge, outside the window.
                assert_eq!(steps[0], Step::Pixel(4 * 8 + 6));
                assert_eq!(steps[1], Step::OffPlane);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn include_policy_records_the_escaping_step() {
        let cfg = RenderConfig {
            escape_policy: EscapePolicy::Include,
            ..config(50)
        };
        let mut ev = evaluator(&cfg, mandelbrot());
        match ev.evaluate(Complex::new(1.0, 0.0)) {
            OrbitOutcome::Escaped(steps) => {
                assert_eq!(steps.len(), 3);
                assert_eq!(steps[2], Step::OffPlane);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fixed_point_is_trapped_within_history_plus_one() {
        let cfg = config(1000);
        let mut ev = evaluator(&cfg, mandelbrot());
        // 0 -> -2 -> 2 -> 2 ...
        assert_eq!(ev.trace(Complex::new(-2.0, 0.0)), Outcome::Trapped);
        assert!(ev.steps().len() <= cfg.history + 1);
        assert_eq!(ev.steps().last(), Some(&Step::Trapped));

        // The origin is its own fixed point from the first step.
        assert_eq!(ev.trace(Complex::new(0.0, 0.0)), Outcome::Trapped);
        assert_eq!(ev.steps(), &[Step::Trapped]);
    }

    #[test]
    fn short_cycles_are_trapped() {
        let cfg = config(1000);
        let mut ev = evaluator(&cfg, mandelbrot());
        // 0 -> -1 -> 0 -> -1 ...
        assert_eq!(ev.evaluate(Complex::new(-1.0, 0.0)), OrbitOutcome::Trapped);
    }

    #[test]
    fn bounded_orbit_without_detection_never_escapes() {
        let cfg = RenderConfig {
            tolerance: 0.0,
            ..config(50)
        };
        let mut ev = evaluator(&cfg, mandelbrot());
        assert_eq!(ev.evaluate(Complex::new(-0.1, 0.1)), OrbitOutcome::NeverEscaped);
        assert_eq!(ev.steps().len(), 50);
        assert!(!ev.is_committable());
    }

    #[test]
    fn start_outside_bailout_records_at_most_one_step() {
        for &policy in &[EscapePolicy::Omit, EscapePolicy::Include] {
            let cfg = RenderConfig {
                escape_policy: policy,
                ..config(50)
            };
            let mut ev = evaluator(&cfg, mandelbrot());
            assert_eq!(ev.trace(Complex::new(3.0, 3.0)), Outcome::Escaped);
            assert!(ev.steps().len() <= 1);
        }
    }

    #[test]
    fn non_finite_iterates_escape() {
        fn blow_up(_: Complex<f64>, _: Complex<f64>) -> Complex<f64> {
            Complex::new(::std::f64::NAN, 0.0)
        }
        fn start(c: Complex<f64>) -> Complex<f64> {
            c
        }
        let formula = Formula {
            name: "nan",
            about: "always NaN",
            initial: start,
            step: blow_up,
        };
        let cfg = RenderConfig {
            escape_policy: EscapePolicy::Include,
            ..config(50)
        };
        let mut ev = evaluator(&cfg, &formula);
        assert_eq!(ev.trace(Complex::new(0.5, 0.5)), Outcome::Escaped);
        assert_eq!(ev.steps(), &[Step::OffPlane]);
    }

    #[test]
    fn larger_budgets_never_undo_an_escape() {
        let small = config(20);
        let large = config(200);
        let mut ev_small = evaluator(&small, mandelbrot());
        let mut ev_large = evaluator(&large, mandelbrot());
        for i in 0..40 {
            let c = Complex::new(-2.0 + 0.1 * i as f64, 0.35);
            if let OrbitOutcome::Escaped(steps) = ev_small.evaluate(c) {
                assert_eq!(ev_large.evaluate(c), OrbitOutcome::Escaped(steps));
            }
        }
    }

    #[test]
    fn commit_only_plots_escapes() {
        let cfg = config(50);
        let mut ev = evaluator(&cfg, mandelbrot());
        let mut counts = vec![0u64; 64];

        ev.trace(Complex::new(0.0, 0.0));
        assert_eq!(ev.commit(&mut counts), 0);

        ev.trace(Complex::new(1.0, 0.0));
        assert_eq!(ev.commit(&mut counts), 1);
        assert_eq!(counts[4 * 8 + 6], 1);
        assert_eq!(counts.iter().sum::<u64>(), 1);
    }
}
