//! Scalar abstraction shared by the real and complex solve paths.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use num_complex::Complex;

/// Pivots with magnitude below this are treated as zero during elimination.
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// Arithmetic required by the MNA assembly and the Gaussian solver.
///
/// Implemented for `f64` (DC, transient) and `Complex<f64>` (AC), so a single
/// solver covers both analysis families. `magnitude` is the pivot-selection
/// norm: `|x|` for reals, `sqrt(re² + im²)` for complex values.
pub trait Scalar:
    Copy
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + 'static
{
    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// Real-valued magnitude used for pivot selection.
    fn magnitude(self) -> f64;

    /// Whether the value is too small to divide by.
    ///
    /// Gating division on this predicate is what turns a complex
    /// division-by-zero into a `Singular` report instead of an infinity.
    fn is_negligible(self) -> bool {
        self.magnitude() < PIVOT_TOLERANCE
    }
}

impl Scalar for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }

    fn magnitude(self) -> f64 {
        self.abs()
    }
}

impl Scalar for Complex<f64> {
    fn zero() -> Self {
        Complex::new(0.0, 0.0)
    }

    fn one() -> Self {
        Complex::new(1.0, 0.0)
    }

    fn magnitude(self) -> f64 {
        self.norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_magnitude() {
        assert_eq!((-3.0f64).magnitude(), 3.0);
        assert!(0.0f64.is_negligible());
        assert!(1e-13f64.is_negligible());
        assert!(!1e-11f64.is_negligible());
    }

    #[test]
    fn test_complex_magnitude() {
        let z = Complex::new(3.0, 4.0);
        assert!((z.magnitude() - 5.0).abs() < 1e-15);
        assert!(Complex::new(0.0, 0.0).is_negligible());
        assert!(!Complex::new(0.0, 1e-6).is_negligible());
    }

    #[test]
    fn test_identities() {
        assert_eq!(<Complex<f64> as Scalar>::one(), Complex::new(1.0, 0.0));
        assert_eq!(<f64 as Scalar>::zero(), 0.0);
        assert_eq!(<f64 as Scalar>::one(), 1.0);
    }
}
