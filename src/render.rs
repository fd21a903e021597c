// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render coordinator.  One round fans out to `threads` scoped
//! workers, each writing into its own slice of one big allocation,
//! waits for all of them, and folds the slices into a single
//! histogram.  Rounds of a schedule run one after another.

use crossbeam;
use crossbeam::thread::ScopedJoinHandle;
use std::time::{Duration, Instant};

use config::{RenderConfig, Schedule};
use errors::{RenderError, Result};
use formula::Formula;
use histogram::Histogram;
use worker::{Worker, WorkerReport};

/// Everything a finished round produced.
#[derive(Debug)]
pub struct RenderResult {
    /// The configuration the round ran with
    pub config: RenderConfig,
    /// The merged visit counts
    pub histogram: Histogram,
    /// What each worker did, in worker order
    pub reports: Vec<WorkerReport>,
    /// Wall-clock time of sampling and merging
    pub elapsed: Duration,
}

impl RenderResult {
    /// The tallies of every worker combined.
    pub fn totals(&self) -> WorkerReport {
        WorkerReport::total(&self.reports)
    }
}

/// Renders one formula under one configuration.  Once built, the
/// renderer never changes.
pub struct Renderer<'a> {
    config: RenderConfig,
    formula: &'a Formula,
}

impl<'a> Renderer<'a> {
    /// Validates the configuration before anything is allocated.
    pub fn new(config: RenderConfig, formula: &'a Formula) -> Result<Renderer<'a>> {
        config.validate()?;
        Ok(Renderer { config, formula })
    }

    /// The configuration rounds run with.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Runs one round to completion.
    pub fn render(&self) -> Result<RenderResult> {
        let started = Instant::now();
        let plane_len = self.config.len();
        let threads = self.config.threads;

        let workers = (0..threads)
            .map(|id| Worker::new(id, self.config, self.formula))
            .collect::<Result<Vec<Worker>>>()?;

        let mut allocation = vec![0 as u64; plane_len * threads];
        let reports = {
            let regions: Vec<&mut [u64]> = allocation.chunks_mut(plane_len).collect();
            let workers = &workers;
            crossbeam::scope(|spawner| {
                let handles: Vec<ScopedJoinHandle<WorkerReport>> = regions
                    .into_iter()
                    .zip(workers.iter())
                    .map(|(region, worker)| spawner.spawn(move |_| worker.run(region)))
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| handle.join().map_err(|_| RenderError::WorkerPanicked))
                    .collect::<Result<Vec<WorkerReport>>>()
            })
            .map_err(|_| RenderError::WorkerPanicked)??
        };

        let histogram = Histogram::merge_all(self.config.width, self.config.height, &allocation);

        Ok(RenderResult {
            config: self.config,
            histogram,
            reports,
            elapsed: started.elapsed(),
        })
    }
}

/// Runs every round of `schedule` in order, handing each result to
/// `on_round` before the next begins.  The first error from a round
/// or from `on_round` stops the schedule; rounds already handed over
/// are unaffected.
pub fn render_schedule<F>(
    config: &RenderConfig,
    formula: &Formula,
    schedule: &Schedule,
    mut on_round: F,
) -> Result<()>
where
    F: FnMut(RenderResult) -> Result<()>,
{
    for &budget in schedule.budgets() {
        let renderer = Renderer::new(config.with_iterations(budget), formula)?;
        let result = renderer.render()?;
        on_round(result)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::EscapePolicy;
    use planes::PlaneWindow;

    fn config(threads: usize) -> RenderConfig {
        RenderConfig {
            width: 8,
            height: 8,
            window: PlaneWindow::new(-2.0, 2.0, -2.0, 2.0),
            max_iterations: 50,
            step: 1.0,
            bailout: 4.0,
            tolerance: 1e-20,
            history: 4,
            threads,
            seed: 0,
            escape_policy: EscapePolicy::Omit,
        }
    }

    fn mandelbrot() -> &'static Formula {
        Formula::lookup("mandelbrot").unwrap()
    }

    #[test]
    fn rejects_invalid_configuration_up_front() {
        assert!(Renderer::new(config(0), mandelbrot()).is_err());
    }

    #[test]
    fn merged_histogram_matches_worker_visits() {
        let renderer = Renderer::new(config(3), mandelbrot()).unwrap();
        let result = renderer.render().unwrap();
        assert_eq!(result.reports.len(), 3);
        assert_eq!(result.histogram.total(), result.totals().visits);
        for (id, report) in result.reports.iter().enumerate() {
            assert_eq!(report.worker, id);
        }
    }

    #[test]
    fn single_worker_rounds_are_reproducible() {
        let renderer = Renderer::new(config(1), mandelbrot()).unwrap();
        let first = renderer.render().unwrap();
        let second = renderer.render().unwrap();
        assert_eq!(first.histogram, second.histogram);
        assert_eq!(first.reports, second.reports);
    }

    #[test]
    fn schedule_runs_rounds_in_order() {
        let schedule = Schedule::explicit(vec![10, 20, 40]).unwrap();
        let mut seen = Vec::new();
        render_schedule(&config(2), mandelbrot(), &schedule, |result| {
            seen.push(result.config.max_iterations);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![10, 20, 40]);
    }

    #[test]
    fn a_failing_round_stops_the_schedule() {
        let schedule = Schedule::explicit(vec![10, 20, 40]).unwrap();
        let mut rounds = 0;
        let outcome = render_schedule(&config(1), mandelbrot(), &schedule, |_| {
            rounds += 1;
            if rounds == 2 {
                Err(RenderError::UnsupportedFormat("test".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(outcome.is_err());
        assert_eq!(rounds, 2);
    }
}
