// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns visit counts into grey levels.  A count is normalised
//! against the smallest count and one more than the largest, so the
//! brightest pixel stays just short of full scale, then bent by a
//! power curve and quantised to the output depth.

use errors::{RenderError, Result};
use histogram::Histogram;

/// How counts are normalised before the power curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Curve {
    /// `(n - min) / (top - min)`
    Linear,
    /// `ln(1 + n - min) / ln(1 + top - min)`
    Log,
}

/// Output sample depth.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BitDepth {
    /// 256 grey levels
    Eight,
    /// 65536 grey levels
    Sixteen,
}

impl BitDepth {
    /// Bits per sample.
    pub fn bits(self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Number of distinct levels.
    pub fn levels(self) -> u32 {
        1 << self.bits()
    }

    /// The brightest level.
    pub fn max_level(self) -> u16 {
        (self.levels() - 1) as u16
    }
}

/// A greyscale image, row-major, one `u16` per pixel whatever the
/// depth.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Sample depth the values are scaled to
    pub depth: BitDepth,
    /// The grey levels
    pub data: Vec<u16>,
}

impl Raster {
    /// The diagnostic dump: the raw counts themselves, saturated to
    /// sixteen bits.
    pub fn raw_counts(histogram: &Histogram) -> Raster {
        let ceiling = u64::from(BitDepth::Sixteen.max_level());
        Raster {
            width: histogram.width(),
            height: histogram.height(),
            depth: BitDepth::Sixteen,
            data: histogram
                .counts()
                .iter()
                .map(|&n| n.min(ceiling) as u16)
                .collect(),
        }
    }

    /// The same image at eight bits.
    pub fn to_eight_bit(&self) -> Raster {
        match self.depth {
            BitDepth::Eight => self.clone(),
            BitDepth::Sixteen => Raster {
                width: self.width,
                height: self.height,
                depth: BitDepth::Eight,
                data: self.data.iter().map(|v| v >> 8).collect(),
            },
        }
    }

    /// The samples as bytes: one per pixel at eight bits, two
    /// big-endian bytes per pixel at sixteen.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.depth {
            BitDepth::Eight => self.data.iter().map(|&v| v as u8).collect(),
            BitDepth::Sixteen => self
                .data
                .iter()
                .flat_map(|&v| vec![(v >> 8) as u8, (v & 0xff) as u8])
                .collect(),
        }
    }
}

/// The tone curve for one presentation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ToneMapper {
    /// Normalisation before the power curve
    pub curve: Curve,
    /// The power the normalised value is raised to, usually 1/2 or 1/3
    pub exponent: f64,
    /// Output depth
    pub depth: BitDepth,
    /// Counts below this fraction of the largest count are drawn as
    /// the smallest count
    pub cutoff: f64,
}

impl Default for ToneMapper {
    fn default() -> ToneMapper {
        ToneMapper {
            curve: Curve::Linear,
            exponent: 0.5,
            depth: BitDepth::Eight,
            cutoff: 0.0,
        }
    }
}

impl ToneMapper {
    /// A validated tone curve.
    pub fn new(curve: Curve, exponent: f64, depth: BitDepth, cutoff: f64) -> Result<ToneMapper> {
        if !(exponent.is_finite() && exponent > 0.0) {
            return Err(RenderError::InvalidParameter {
                name: "gamma",
                reason: format!("must be positive and finite, got {}", exponent),
            });
        }
        if !(cutoff >= 0.0 && cutoff <= 1.0) {
            return Err(RenderError::InvalidParameter {
                name: "cutoff",
                reason: format!("must lie in [0, 1], got {}", cutoff),
            });
        }
        Ok(ToneMapper {
            curve,
            exponent,
            depth,
            cutoff,
        })
    }

    /// The grey level of `count`, given the histogram's smallest count
    /// and its largest count plus one.
    pub fn intensity(&self, count: u64, min: u64, top: u64) -> u16 {
        let span = top.saturating_sub(min).max(1) as f64;
        let above = count.saturating_sub(min) as f64;
        let t = match self.curve {
            Curve::Linear => above / span,
            Curve::Log => (1.0 + above).ln() / (1.0 + span).ln(),
        };
        let level = (t.powf(self.exponent) * f64::from(self.depth.levels())).floor();
        if level >= f64::from(self.depth.max_level()) {
            self.depth.max_level()
        } else {
            level as u16
        }
    }

    /// Maps a whole histogram.
    pub fn map(&self, histogram: &Histogram) -> Raster {
        let (min, max) = histogram.extrema().unwrap_or((0, 0));
        let top = max + 1;
        let floor = self.cutoff * max as f64;
        let data = histogram
            .counts()
            .iter()
            .map(|&n| {
                let n = if (n as f64) < floor { min } else { n };
                self.intensity(n, min, top)
            })
            .collect();
        Raster {
            width: histogram.width(),
            height: histogram.height(),
            depth: self.depth,
            data,
        }
    }
}
