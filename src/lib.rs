#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Buddhabrot-family renderer
//!
//! The Buddhabrot is a variant of the Mandelbrot set that explores
//! the paths points take rather than how fast they leave.  Every
//! starting point on a dense grid is iterated under an escape-time
//! formula.  Each iterate is itself a point on the complex plane, so
//! it can be mapped to the nearest pixel.  For the orbits that
//! eventually escape, and only for those, every pixel the orbit
//! passed through is incremented by one.  The resulting histogram,
//! tone-mapped, is the image.
//!
//! Nothing in the method is specific to `z^2 + c`.  This crate keeps
//! a registry of formulas (`formula`) and one engine that runs any of
//! them: the orbit evaluator (`orbit`) decides for each starting point
//! whether it escaped, was trapped in a cycle, or ran out of
//! iterations; sampling workers (`worker`) split the grid between
//! threads with no shared state; the coordinator (`render`) joins them
//! and merges their histograms; and the tone mapper (`tonemap`) turns
//! counts into grey levels.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;
extern crate rand;

#[cfg(test)]
extern crate tempfile;

pub mod complex;
pub mod config;
pub mod errors;
pub mod formula;
pub mod histogram;
pub mod orbit;
pub mod output;
pub mod planes;
pub mod render;
pub mod tonemap;
pub mod worker;

pub use config::{EscapePolicy, RenderConfig, Schedule};
pub use errors::RenderError;
pub use formula::Formula;
pub use histogram::Histogram;
pub use orbit::{OrbitEvaluator, OrbitOutcome, Outcome, Step};
pub use output::{FileSink, ImageSink};
pub use planes::{PlaneMapper, PlaneWindow};
pub use render::{render_schedule, RenderResult, Renderer};
pub use tonemap::{BitDepth, Curve, Raster, ToneMapper};
pub use worker::{Worker, WorkerReport};
