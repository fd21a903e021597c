// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A sampling worker.  The sample grid covers pixel space at a step
//! of `step` pixels along both axes, shifted back by a random amount
//! smaller than one step so the grid does not alias into visible
//! lines.  Worker `id` of `threads` takes every sample whose position
//! in the enumeration is congruent to `id`, runs its orbit, and plots
//! it into a block of counters that nobody else touches.
//!
//! The jitter is seeded from the worker's identity, so a given worker
//! composition reproduces its image exactly.  A different thread
//! count is a different sample set.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use config::RenderConfig;
use errors::Result;
use formula::Formula;
use orbit::{OrbitEvaluator, Outcome};
use planes::PlaneMapper;

/// The seed for worker `id` given the seed basis of the run.
pub fn derive_seed(basis: u64, id: usize) -> u64 {
    basis.wrapping_add(id as u64)
}

/// The lattice of sample positions in pixel space, after jitter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SampleGrid {
    /// Distance between neighbouring samples, in pixels
    pub step: f64,
    /// How far the first column sits left of 0
    pub jitter_x: f64,
    /// How far the first row sits above 0
    pub jitter_y: f64,
    /// Number of sample columns
    pub columns: usize,
    /// Number of sample rows
    pub rows: usize,
}

// Number of k >= 0 with k * step - jitter < extent.
fn lattice_len(extent: usize, step: f64, jitter: f64) -> usize {
    ((extent as f64 + jitter) / step).ceil() as usize
}

impl SampleGrid {
    /// A grid over a `width` x `height` image with the given jitter.
    pub fn new(width: usize, height: usize, step: f64, jitter_x: f64, jitter_y: f64) -> SampleGrid {
        SampleGrid {
            step,
            jitter_x,
            jitter_y,
            columns: lattice_len(width, step, jitter_x),
            rows: lattice_len(height, step, jitter_y),
        }
    }

    /// The grid worker `id` samples, with jitter drawn from its seed.
    pub fn for_worker(config: &RenderConfig, id: usize) -> SampleGrid {
        let mut rng = StdRng::seed_from_u64(derive_seed(config.seed, id));
        let jitter = Uniform::new(0.0_f64, config.step);
        let jitter_x = jitter.sample(&mut rng);
        let jitter_y = jitter.sample(&mut rng);
        SampleGrid::new(config.width, config.height, config.step, jitter_x, jitter_y)
    }

    /// Total number of samples in the grid.
    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The pixel-space position of the sample at column `i`, row `j`.
    pub fn position(&self, i: usize, j: usize) -> (f64, f64) {
        (
            i as f64 * self.step - self.jitter_x,
            j as f64 * self.step - self.jitter_y,
        )
    }

    /// The samples belonging to worker `id` of `threads`, enumerated
    /// column by column.
    pub fn partition<'g>(
        &'g self,
        id: usize,
        threads: usize,
    ) -> impl Iterator<Item = (f64, f64)> + 'g {
        iproduct!(0..self.columns, 0..self.rows)
            .skip(id)
            .step_by(threads.max(1))
            .map(move |(i, j)| self.position(i, j))
    }
}

/// What one worker did during a round.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WorkerReport {
    /// Which worker this is
    pub worker: usize,
    /// Starting points evaluated
    pub samples: u64,
    /// Orbits that escaped and were plotted
    pub escaped: u64,
    /// Orbits caught in a fixed point or cycle
    pub trapped: u64,
    /// Orbits that used the whole iteration budget
    pub never_escaped: u64,
    /// Pixel increments made
    pub visits: u64,
}

impl WorkerReport {
    /// Adds another worker's tallies into this one.
    pub fn absorb(&mut self, other: &WorkerReport) {
        self.samples += other.samples;
        self.escaped += other.escaped;
        self.trapped += other.trapped;
        self.never_escaped += other.never_escaped;
        self.visits += other.visits;
    }

    /// The tallies of several workers combined.
    pub fn total(reports: &[WorkerReport]) -> WorkerReport {
        let mut total = WorkerReport::default();
        for report in reports {
            total.absorb(report);
        }
        total
    }
}

/// One sampling worker of a round.
pub struct Worker<'a> {
    id: usize,
    config: RenderConfig,
    formula: &'a Formula,
    plane: PlaneMapper,
    grid: SampleGrid,
}

impl<'a> Worker<'a> {
    /// Worker `id` of `config.threads`.
    pub fn new(id: usize, config: RenderConfig, formula: &'a Formula) -> Result<Worker<'a>> {
        let plane = PlaneMapper::new(config.width, config.height, config.window)?;
        let grid = SampleGrid::for_worker(&config, id);
        Ok(Worker {
            id,
            config,
            formula,
            plane,
            grid,
        })
    }

    /// The jittered grid this worker samples from.
    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    /// Samples this worker's partition, plotting escaping orbits into
    /// `counts`, which must hold exactly one plane.
    pub fn run(&self, counts: &mut [u64]) -> WorkerReport {
        assert_eq!(counts.len(), self.plane.len());
        debug!(
            "worker {} starting: {} of {} samples, budget {}",
            self.id,
            self.grid.len() / self.config.threads,
            self.grid.len(),
            self.config.max_iterations
        );

        let mut evaluator = OrbitEvaluator::new(self.plane, self.formula, &self.config);
        let mut report = WorkerReport {
            worker: self.id,
            ..WorkerReport::default()
        };
        for (x, y) in self.grid.partition(self.id, self.config.threads) {
            let c = self.plane.sample_to_point(x, y);
            report.samples += 1;
            match evaluator.trace(c) {
                Outcome::Escaped => {
                    report.escaped += 1;
                    report.visits += evaluator.commit(counts);
                }
                Outcome::Trapped => report.trapped += 1,
                Outcome::NeverEscaped => report.never_escaped += 1,
            }
        }

        debug!(
            "worker {} finished: {} samples, {} escaped, {} trapped, {} bounded, {} visits",
            self.id,
            report.samples,
            report.escaped,
            report.trapped,
            report.never_escaped,
            report.visits
        );
        report
    }
}
