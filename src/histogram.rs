// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-pixel visit counts.  Each worker writes into a private block
//! of counters during sampling; afterwards the blocks are summed
//! element-wise into a single `Histogram`.

use itertools::Itertools;

/// A dense, row-major grid of visit counts.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    width: usize,
    height: usize,
    counts: Vec<u64>,
}

impl Histogram {
    /// A zeroed histogram.
    pub fn new(width: usize, height: usize) -> Histogram {
        Histogram {
            width,
            height,
            counts: vec![0; width * height],
        }
    }

    /// Given a collection of planes in a contiguous block, merge them
    /// all into a single plane.  The order in which the planes were
    /// filled makes no difference to the sum.
    pub fn merge_all(width: usize, height: usize, regions: &[u64]) -> Histogram {
        let mut ret = Histogram::new(width, height);
        let len = ret.len();
        if len == 0 {
            return ret;
        }
        for (index, region) in regions.chunks(len).enumerate() {
            trace!("merging plane {}", index);
            ret.add(region);
        }
        ret
    }

    /// Adds another plane of the same size into this one.
    pub fn add(&mut self, other: &[u64]) {
        assert_eq!(other.len(), self.counts.len());
        for (mine, theirs) in self.counts.iter_mut().zip(other) {
            *mine += *theirs;
        }
    }

    /// Image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the histogram has no pixels.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The counts, row-major.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// The counts, row-major, for plotting into.
    pub fn counts_mut(&mut self) -> &mut [u64] {
        &mut self.counts
    }

    /// The count at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> u64 {
        self.counts[y * self.width + x]
    }

    /// The sum of every count.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// The smallest and largest counts, or None when empty.
    pub fn extrema(&self) -> Option<(u64, u64)> {
        self.counts.iter().cloned().minmax().into_option()
    }

    /// Copies the count of pixel 1 into pixel 0.  The first pixel
    /// collects a spike from samples on the grid boundary; this hides
    /// it.
    pub fn copy_origin_from_neighbor(&mut self) {
        if self.counts.len() > 1 {
            self.counts[0] = self.counts[1];
        }
    }
}
