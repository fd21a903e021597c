// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 in
//! the upper-left corner, and a rectangle on the complex plane
//! bounded by a `PlaneWindow`.
//!
//! Pixel rows grow downward while imaginary parts grow upward, so the
//! vertical axis is flipped: the largest imaginary part maps to row 0.
use num::Complex;

use errors::{RenderError, Result};

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// The rectangle of the complex plane that is mapped onto the image.
/// Real parts run along x, imaginary parts along y.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneWindow {
    /// Smallest real part shown
    pub x_min: f64,
    /// Largest real part shown
    pub x_max: f64,
    /// Smallest imaginary part shown
    pub y_min: f64,
    /// Largest imaginary part shown
    pub y_max: f64,
}

impl PlaneWindow {
    /// A window from its four bounds.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> PlaneWindow {
        PlaneWindow {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// A window from its left-lower and right-upper corners.
    pub fn from_corners(leftlower: Complex<f64>, rightupper: Complex<f64>) -> PlaneWindow {
        PlaneWindow::new(leftlower.re, rightupper.re, leftlower.im, rightupper.im)
    }

    /// Horizontal extent of the window.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Vertical extent of the window.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Rejects windows that are empty, inverted, or not finite.
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.x_min, self.x_max, self.y_min, self.y_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(RenderError::InvalidWindow(format!(
                "bounds must be finite, got {:?}",
                self
            )));
        }
        if !(self.x_min < self.x_max) {
            return Err(RenderError::InvalidWindow(format!(
                "x_min {} is not left of x_max {}",
                self.x_min, self.x_max
            )));
        }
        if !(self.y_min < self.y_max) {
            return Err(RenderError::InvalidWindow(format!(
                "y_min {} is not below y_max {}",
                self.y_min, self.y_max
            )));
        }
        Ok(())
    }
}

/// Describes the column, row of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a complex cartesian plane.  Maps points from one to the other.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The right-lower hand corner of the integral cartesian plane.
    /// The left-upper is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The bounds of the complex plane
    pub window: PlaneWindow,
    // Pixels per unit of the complex plane, horizontally and vertically.
    grid_factors: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the
    /// window on the complex plane, and fails if either is empty.
    pub fn new(width: usize, height: usize, window: PlaneWindow) -> Result<PlaneMapper> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidResolution { width, height });
        }
        window.validate()?;

        let grid_factors = (
            (width as f64) / window.width(),
            (height as f64) / window.height(),
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            window,
            grid_factors,
        })
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// Given a (possibly fractional) position in pixel space, return
    /// the complex number it corresponds to.  Samples are taken at
    /// sub-pixel steps, so this is the mapping the sampler uses.
    pub fn sample_to_point(&self, x: f64, y: f64) -> Complex<f64> {
        Complex::new(
            self.window.x_min + x / self.grid_factors.0,
            self.window.y_max - y / self.grid_factors.1,
        )
    }

    /// Given a pixel on the integral cartesian plane, map its
    /// upper-left corner to a point on the complex cartesian plane.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        self.sample_to_point(pixel.0 as f64, pixel.1 as f64)
    }

    /// Given a complex number inside the window, return the pixel it
    /// falls into, or None if it lies outside the window.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Option<Pixel> {
        let left = (point.re - self.window.x_min) * self.grid_factors.0;
        let top = (self.window.y_max - point.im) * self.grid_factors.1;
        // Written so that NaN lands outside.
        if !(left >= 0.0
            && left < (self.integral_plane.0 as f64)
            && top >= 0.0
            && top < (self.integral_plane.1 as f64))
        {
            return None;
        }
        Some(Pixel(left.floor() as usize, top.floor() as usize))
    }

    /// Since the Buddhabrot actually tracks the progress of a complex
    /// number as it orbits, we have to map those complex numbers back
    /// to the pixel plane, and then increment those points on the
    /// pixel plane as the orbit passes through them.  This function
    /// takes a point, maps it to pixel coordinates, then returns the
    /// linear offset from the root of the image buffer in memory.
    pub fn point_to_offset(&self, point: &Complex<f64>) -> Option<usize> {
        self.point_to_pixel(point)
            .map(|p| p.1 * self.integral_plane.0 + p.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> PlaneWindow {
        PlaneWindow::new(x_min, x_max, y_min, y_max)
    }

    #[test]
    fn planemapper_fails_on_bad_shape() {
        let pm = PlaneMapper::new(4, 4, window(1.0, -1.0, -1.0, 1.0));
        assert!(pm.is_err());
        let pm = PlaneMapper::new(4, 4, window(-1.0, 1.0, 1.0, 1.0));
        assert!(pm.is_err());
        let pm = PlaneMapper::new(4, 4, window(::std::f64::NAN, 1.0, -1.0, 1.0));
        assert!(pm.is_err());
    }

    #[test]
    fn planemapper_fails_on_empty_plane() {
        let pm = PlaneMapper::new(0, 4, window(-1.0, 1.0, -1.0, 1.0));
        match pm {
            Err(RenderError::InvalidResolution { width: 0, height: 4 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn planemapper_passes_on_good_shape() {
        let pm = PlaneMapper::new(4, 4, window(-1.0, 1.0, -1.0, 1.0));
        assert!(pm.is_ok());
    }

    #[test]
    fn from_corners_matches_bounds() {
        let w = PlaneWindow::from_corners(Complex::new(-7.0, -5.0), Complex::new(3.0, 5.0));
        assert_eq!(w, window(-7.0, 3.0, -5.0, 5.0));
    }

    #[test]
    fn point_to_pixel_on_positive_planes() {
        let pm = PlaneMapper::new(5, 5, window(0.0, 5.0, 0.0, 5.0)).unwrap();
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 4.5)), Some(Pixel(0, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(2.0, 2.0)), Some(Pixel(2, 3)));
        assert_eq!(pm.point_to_pixel(&Complex::new(4.9, 0.1)), Some(Pixel(4, 4)));
    }

    #[test]
    fn point_to_pixel_flips_the_vertical_axis() {
        let pm = PlaneMapper::new(4, 4, window(-2.0, 2.0, -2.0, 2.0)).unwrap();
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(2, 2)));
        assert_eq!(pm.point_to_pixel(&Complex::new(-2.0, 2.0)), Some(Pixel(0, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(-2.0, -1.5)), Some(Pixel(0, 3)));
        assert_eq!(pm.point_to_pixel(&Complex::new(1.5, 1.5)), Some(Pixel(3, 0)));
    }

    #[test]
    fn points_outside_the_window_have_no_pixel() {
        let pm = PlaneMapper::new(4, 4, window(-2.0, 2.0, -2.0, 2.0)).unwrap();
        assert_eq!(pm.point_to_pixel(&Complex::new(2.0, 0.0)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(-2.1, 0.0)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, -2.0)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 2.5)), None);
        assert_eq!(pm.point_to_offset(&Complex::new(::std::f64::NAN, 0.0)), None);
    }

    #[test]
    fn point_to_offset_is_row_major() {
        let pm = PlaneMapper::new(640, 480, window(-2.0, 2.0, -1.5, 1.5)).unwrap();
        assert_eq!(pm.point_to_offset(&Complex::new(-2.0, 1.5)), Some(0));
        assert_eq!(pm.point_to_offset(&Complex::new(0.0, 0.0)), Some(240 * 640 + 320));
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = PlaneMapper::new(5, 5, window(0.0, 5.0, 0.0, 5.0)).unwrap();
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 5.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 3.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(4.0, 1.0));
    }

    #[test]
    fn sample_to_point_round_trips_through_the_pixel() {
        let pm = PlaneMapper::new(4, 4, window(-2.0, 2.0, -2.0, 2.0)).unwrap();
        let c = pm.sample_to_point(2.5, 1.25);
        assert_eq!(c, Complex::new(0.5, 0.75));
        assert_eq!(pm.point_to_pixel(&c), Some(Pixel(2, 1)));
    }
}
