// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Extra arithmetic on `num::Complex<f64>`.
//!
//! The `num` crate already gives us the field operations, `inv`,
//! `exp`, `ln`, `sqrt`, and the direct and inverse trigonometric and
//! hyperbolic families, all derived from the exponential map.  What
//! it does not give us are the handful of operations escape-time
//! formulas tend to reach for: squaring without going through the
//! general multiply, powers taken in polar form, the reciprocal
//! functions (cot, coth and their inverses), and a few componentwise
//! manipulations that only make sense for fractal folding.
//!
//! Nothing here reports errors.  Dividing by zero gives NaN or
//! infinity, and the orbit evaluator treats any non-finite magnitude
//! as an escape.

use num::Complex;

/// A unit-magnitude complex number at the given angle.
#[inline]
pub fn from_angle(theta: f64) -> Complex<f64> {
    Complex::new(theta.cos(), theta.sin())
}

/// A complex number at the given angle and magnitude.
#[inline]
pub fn from_angle_mag(theta: f64, mag: f64) -> Complex<f64> {
    from_angle(theta) * mag
}

/// Operations escape-time formulas need that `num` does not provide.
pub trait ComplexExt {
    /// Euclidean magnitude.
    fn mag(self) -> f64;
    /// Squared magnitude; the value compared against the bailout.
    fn mag_sqr(self) -> f64;
    /// Argument in (-pi, pi], as `atan2(im, re)`.
    fn angle(self) -> f64;
    /// Squared distance to another point.
    fn dist_sqr(self, other: Self) -> f64;
    /// `self * self`, expanded.
    fn sqr(self) -> Self;
    /// `self * self * self`, expanded.
    fn cube(self) -> Self;
    /// `conj(self) / |self|^2`.  Undefined for zero.
    fn recip(self) -> Self;
    /// Real power in polar form: `from_angle(a * arg) * |self|^a`.
    fn pow_real(self, a: f64) -> Self;
    /// Complex power in polar form.
    fn pow_complex(self, w: Self) -> Self;
    /// Principal logarithm, `(ln |self|, arg self)`.
    fn principal_log(self) -> Self;
    /// cos / sin
    fn cot(self) -> Self;
    /// cosh / sinh
    fn coth(self) -> Self;
    /// 1 / cos
    fn sec(self) -> Self;
    /// 1 / sin
    fn csc(self) -> Self;
    /// Inverse cotangent, `(i/2) * log((z - i) / (z + i))`.
    fn acot(self) -> Self;
    /// Inverse hyperbolic cotangent, `log((z + 1) / (z - 1)) / 2`.
    fn acoth(self) -> Self;
    /// `(|re|, |im|)`, the burning-ship fold.
    fn abs_parts(self) -> Self;
    /// Swaps the real and imaginary parts.
    fn flip(self) -> Self;
    /// Floors both parts.
    fn floor_parts(self) -> Self;
    /// The fractional part of both parts, `x - floor(x)`.
    fn fract_parts(self) -> Self;
}

impl ComplexExt for Complex<f64> {
    #[inline]
    fn mag(self) -> f64 {
        self.mag_sqr().sqrt()
    }

    #[inline]
    fn mag_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    #[inline]
    fn angle(self) -> f64 {
        self.im.atan2(self.re)
    }

    #[inline]
    fn dist_sqr(self, other: Self) -> f64 {
        (self - other).mag_sqr()
    }

    #[inline]
    fn sqr(self) -> Self {
        Complex::new(self.re * self.re - self.im * self.im, 2.0 * self.re * self.im)
    }

    #[inline]
    fn cube(self) -> Self {
        self.sqr() * self
    }

    #[inline]
    fn recip(self) -> Self {
        self.conj() / self.mag_sqr()
    }

    fn pow_real(self, a: f64) -> Self {
        from_angle_mag(a * self.angle(), self.mag_sqr().powf(a * 0.5))
    }

    fn pow_complex(self, w: Self) -> Self {
        let r = self.mag();
        let theta = self.angle();
        from_angle_mag(w.re * theta + w.im * r.ln(), r.powf(w.re) * (-w.im * theta).exp())
    }

    #[inline]
    fn principal_log(self) -> Self {
        Complex::new(self.mag().ln(), self.angle())
    }

    fn cot(self) -> Self {
        self.cos() / self.sin()
    }

    fn coth(self) -> Self {
        self.cosh() / self.sinh()
    }

    fn sec(self) -> Self {
        self.cos().recip()
    }

    fn csc(self) -> Self {
        self.sin().recip()
    }

    fn acot(self) -> Self {
        let i = Complex::i();
        ((self - i) / (self + i)).principal_log() * Complex::new(0.0, 0.5)
    }

    fn acoth(self) -> Self {
        ((self + 1.0) / (self - 1.0)).principal_log() * 0.5
    }

    #[inline]
    fn abs_parts(self) -> Self {
        Complex::new(self.re.abs(), self.im.abs())
    }

    #[inline]
    fn flip(self) -> Self {
        Complex::new(self.im, self.re)
    }

    #[inline]
    fn floor_parts(self) -> Self {
        Complex::new(self.re.floor(), self.im.floor())
    }

    #[inline]
    fn fract_parts(self) -> Self {
        Complex::new(self.re - self.re.floor(), self.im - self.im.floor())
    }
}
