// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The registry of escape maps.  Every member of the Buddhabrot
//! family differs from the others only in the rule that takes the
//! current iterate and the fixed starting point to the next iterate,
//! and in where the orbit begins.  Adding a fractal means adding a
//! row to `FORMULAS`; the engine never changes.

use num::Complex;
use std::fmt;

use complex::ComplexExt;
use errors::{RenderError, Result};

/// The next iterate, from the current one and the starting point.
pub type StepFn = fn(Complex<f64>, Complex<f64>) -> Complex<f64>;

/// The first iterate, from the starting point.
pub type InitialFn = fn(Complex<f64>) -> Complex<f64>;

/// A named escape-time formula.
#[derive(Copy, Clone)]
pub struct Formula {
    /// The selector used on the command line
    pub name: &'static str,
    /// A human-readable rendering of the update rule
    pub about: &'static str,
    /// Where the orbit of a starting point begins
    pub initial: InitialFn,
    /// The update rule
    pub step: StepFn,
}

impl Formula {
    /// Finds a formula by name.
    pub fn lookup(name: &str) -> Result<&'static Formula> {
        FORMULAS
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| RenderError::UnknownFormula(name.to_string()))
    }

    /// The first iterate of the orbit of `c`.
    #[inline]
    pub fn start(&self, c: Complex<f64>) -> Complex<f64> {
        (self.initial)(c)
    }

    /// Applies the update rule once.
    #[inline]
    pub fn next(&self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        (self.step)(z, c)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Formula({}: {})", self.name, self.about)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn zero(_: Complex<f64>) -> Complex<f64> {
    Complex::new(0.0, 0.0)
}

fn one(_: Complex<f64>) -> Complex<f64> {
    Complex::new(1.0, 0.0)
}

fn itself(c: Complex<f64>) -> Complex<f64> {
    c
}

fn mandelbrot(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    z.sqr() + c
}

fn cubic(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    z.cube() + c
}

fn tricorn(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    z.conj().sqr() + c
}

fn burning_ship(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    z.abs_parts().sqr() + c
}

fn tanh_average(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    ((z.tanh() + z) * 0.5).sqr() + c
}

// Newton's method on z^3 - 1, perturbed by c.
fn nova(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    z - (z.cube() - 1.0) / (z.sqr() * 3.0) + c
}

fn sine(z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
    z.sin() * c
}

/// Every formula the renderer knows.  The first is the default.
pub static FORMULAS: [Formula; 7] = [
    Formula {
        name: "tanh",
        about: "((tanh(z) + z) / 2)^2 + c, z0 = c",
        initial: itself,
        step: tanh_average,
    },
    Formula {
        name: "mandelbrot",
        about: "z^2 + c, z0 = 0",
        initial: zero,
        step: mandelbrot,
    },
    Formula {
        name: "cubic",
        about: "z^3 + c, z0 = 0",
        initial: zero,
        step: cubic,
    },
    Formula {
        name: "tricorn",
        about: "conj(z)^2 + c, z0 = 0",
        initial: zero,
        step: tricorn,
    },
    Formula {
        name: "burning-ship",
        about: "(|re z| + i|im z|)^2 + c, z0 = 0",
        initial: zero,
        step: burning_ship,
    },
    Formula {
        name: "nova",
        about: "z - (z^3 - 1) / 3z^2 + c, z0 = 1",
        initial: one,
        step: nova,
    },
    Formula {
        name: "sine",
        about: "sin(z) * c, z0 = c",
        initial: itself,
        step: sine,
    },
];

/// The whole registry.
pub fn registry() -> &'static [Formula] {
    &FORMULAS
}

/// The names of every registered formula, in registry order.
pub fn names() -> Vec<&'static str> {
    FORMULAS.iter().map(|f| f.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_registered_formulas() {
        for f in registry() {
            assert_eq!(Formula::lookup(f.name).unwrap().name, f.name);
        }
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        match Formula::lookup("julia") {
            Err(RenderError::UnknownFormula(ref n)) if n == "julia" => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn names_are_unique() {
        let mut names = names();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn mandelbrot_steps() {
        let f = Formula::lookup("mandelbrot").unwrap();
        let c = Complex::new(-1.0, 1.0);
        let z1 = f.next(f.start(c), c);
        assert_eq!(z1, c);
        assert_eq!(f.next(z1, c), Complex::new(-1.0, -1.0));
    }

    #[test]
    fn burning_ship_folds_before_squaring() {
        let f = Formula::lookup("burning-ship").unwrap();
        let z = Complex::new(-1.0, -2.0);
        assert_eq!(f.next(z, Complex::new(0.0, 0.0)), Complex::new(-3.0, 4.0));
    }

    #[test]
    fn nova_root_is_fixed_without_perturbation() {
        let f = Formula::lookup("nova").unwrap();
        let z = f.start(Complex::new(0.0, 0.0));
        assert_eq!(f.next(z, Complex::new(0.0, 0.0)), Complex::new(1.0, 0.0));
    }

    #[test]
    fn tanh_starts_at_c() {
        let f = &registry()[0];
        assert_eq!(f.name, "tanh");
        let c = Complex::new(0.25, -0.5);
        assert_eq!(f.start(c), c);
    }
}
