// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing rasters out.  The core only needs something that accepts a
//! raster and a destination; `FileSink` is the one the binary uses.

use image::png::PNGEncoder;
use image::pnm::{PNMEncoder, PNMSubtype, SampleEncoding};
use image::ColorType;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use errors::{RenderError, Result};
use tonemap::Raster;

/// Anything a finished raster can be handed to.
pub trait ImageSink {
    /// Persists `raster` at `dest`.
    fn write(&self, raster: &Raster, dest: &Path) -> Result<()>;
}

/// Image container formats the file sink can produce.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Format {
    /// Greyscale PNG, eight or sixteen bits
    Png,
    /// Binary PNM graymap, eight bits
    Pgm,
}

impl Format {
    /// The format implied by a file extension.
    pub fn from_extension(ext: &str) -> Result<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Ok(Format::Png),
            "pgm" | "pnm" => Ok(Format::Pgm),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }

    /// The extension new files get.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Pgm => "pgm",
        }
    }
}

/// Encodes rasters into files, choosing the format from the
/// destination's extension.
#[derive(Copy, Clone, Debug, Default)]
pub struct FileSink;

impl FileSink {
    fn write_png(raster: &Raster, output: File) -> Result<()> {
        let encoder = PNGEncoder::new(BufWriter::new(output));
        encoder.encode(
            &raster.to_bytes(),
            raster.width as u32,
            raster.height as u32,
            ColorType::Gray(raster.depth.bits()),
        )?;
        Ok(())
    }

    fn write_pgm(raster: &Raster, output: File) -> Result<()> {
        let pixels = raster.to_eight_bit().to_bytes();
        let mut encoder = PNMEncoder::new(BufWriter::new(output))
            .with_subtype(PNMSubtype::Graymap(SampleEncoding::Binary));
        encoder.encode(
            &pixels[..],
            raster.width as u32,
            raster.height as u32,
            ColorType::Gray(8),
        )?;
        Ok(())
    }
}

impl ImageSink for FileSink {
    fn write(&self, raster: &Raster, dest: &Path) -> Result<()> {
        let ext = dest
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| RenderError::UnsupportedFormat(dest.display().to_string()))?;
        let format = Format::from_extension(ext)?;
        let output = File::create(dest)?;
        match format {
            Format::Png => FileSink::write_png(raster, output),
            Format::Pgm => FileSink::write_pgm(raster, output),
        }
    }
}

/// Seconds since the Unix epoch, used to keep file names unique.
pub fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}

/// Where one round's images go: `<dir>/<formula>/<budget>_<stamp>`
/// for the tone-mapped image and `v_<budget>_<stamp>` beside it for
/// the raw counts.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundPaths {
    /// The tone-mapped image
    pub image: PathBuf,
    /// The raw count dump
    pub raw: PathBuf,
}

impl RoundPaths {
    /// Builds the two paths without touching the filesystem.
    pub fn new(dir: &Path, formula: &str, budget: usize, stamp: u64, format: Format) -> RoundPaths {
        let base = dir.join(formula);
        RoundPaths {
            image: base.join(format!("{}_{}.{}", budget, stamp, format.extension())),
            // The raw dump keeps all sixteen bits, so it is always PNG.
            raw: base.join(format!("v_{}_{}.png", budget, stamp)),
        }
    }

    /// Creates the directory the files live in.
    pub fn create_dir(&self) -> Result<()> {
        if let Some(parent) = self.image.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tonemap::BitDepth;

    fn raster(depth: BitDepth) -> Raster {
        Raster {
            width: 3,
            height: 2,
            depth,
            data: vec![0, 10, 20, 30, 40, 50],
        }
    }

    #[test]
    fn formats_follow_extensions() {
        assert_eq!(Format::from_extension("PNG").unwrap(), Format::Png);
        assert_eq!(Format::from_extension("pnm").unwrap(), Format::Pgm);
        assert!(Format::from_extension("jpg").is_err());
    }

    #[test]
    fn round_paths_follow_the_naming_scheme() {
        let paths = RoundPaths::new(Path::new("out"), "tanh", 256, 1600000000, Format::Png);
        assert_eq!(paths.image, Path::new("out/tanh/256_1600000000.png"));
        assert_eq!(paths.raw, Path::new("out/tanh/v_256_1600000000.png"));
    }

    #[test]
    fn writes_png_and_pgm() {
        let dir = tempdir().unwrap();
        let sink = FileSink;
        for &(name, depth) in &[
            ("a.png", BitDepth::Eight),
            ("b.png", BitDepth::Sixteen),
            ("c.pgm", BitDepth::Sixteen),
        ] {
            let dest = dir.path().join(name);
            sink.write(&raster(depth), &dest).unwrap();
            assert!(fs::metadata(&dest).unwrap().len() > 0);
        }
    }

    #[test]
    fn refuses_unknown_extensions() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("image.bmp");
        match FileSink.write(&raster(BitDepth::Eight), &dest) {
            Err(RenderError::UnsupportedFormat(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn missing_directories_are_io_errors() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nope").join("image.png");
        match FileSink.write(&raster(BitDepth::Eight), &dest) {
            Err(RenderError::Io(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn create_dir_makes_the_formula_directory() {
        let dir = tempdir().unwrap();
        let paths = RoundPaths::new(dir.path(), "mandelbrot", 16, 1, Format::Pgm);
        paths.create_dir().unwrap();
        assert!(dir.path().join("mandelbrot").is_dir());
    }
}
