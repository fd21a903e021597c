// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The things that can go wrong before, during, and after a render.
//! Configuration mistakes are caught before any thread is started;
//! I/O failures come from writing images.  Numeric trouble inside an
//! orbit is never an error: NaN and infinity simply escape.

use std::io;

/// Every fallible operation in the crate returns one of these.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The integral plane has no pixels in it.
    #[fail(display = "Image size must be at least 1x1, got {}x{}", width, height)]
    InvalidResolution {
        /// Requested width in pixels
        width: usize,
        /// Requested height in pixels
        height: usize,
    },

    /// The complex plane window is empty, inverted, or not finite.
    #[fail(display = "Invalid plane window: {}", _0)]
    InvalidWindow(String),

    /// A render needs at least one worker.
    #[fail(display = "Thread count must be at least 1")]
    InvalidThreads,

    /// Any other numeric knob that is out of range.
    #[fail(display = "Invalid value for {}: {}", name, reason)]
    InvalidParameter {
        /// The name of the offending setting
        name: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// The formula selector is not in the registry.
    #[fail(display = "Unknown formula '{}'", _0)]
    UnknownFormula(String),

    /// A sampling thread died before finishing its partition.
    #[fail(display = "A sampling worker panicked")]
    WorkerPanicked,

    /// The image sink does not know how to write this destination.
    #[fail(display = "Unsupported output format: {}", _0)]
    UnsupportedFormat(String),

    /// Writing the output failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> RenderError {
        RenderError::Io(err)
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = ::std::result::Result<T, RenderError>;
