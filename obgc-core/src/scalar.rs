//! Scalar genericity for operator and reaction arithmetic
//!
//! Every operator builder and reaction term in this crate is written against
//! [`TracerScalar`] rather than a concrete floating-point type. Swapping the
//! scalar from `f64` to a [`Dual`](crate::dual::Dual) or
//! [`HyperDual`](crate::dual::HyperDual) turns the same arithmetic into an
//! exact first- or second-derivative evaluation, which is how the external
//! solver obtains Jacobians without a separate code path.

use num::{One, Zero};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// The arithmetic closure required to assemble transport operators and
/// evaluate reaction terms.
///
/// The `nalgebra::Scalar` supertrait lets any conforming type flow through
/// the sparse matrix storage unchanged. [`re`](TracerScalar::re) exposes the
/// real (value) part, which is the only thing construction-time sign checks
/// are allowed to look at: a dual number is "negative" exactly when its
/// value part is.
pub trait TracerScalar:
    nalgebra::Scalar
    + Copy
    + Zero
    + One
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
    + Mul<Output = Self>
    + MulAssign
    + Div<Output = Self>
    + DivAssign
    + Neg<Output = Self>
{
    /// Embed a plain real number into this scalar type.
    fn from_f64(value: f64) -> Self;

    /// The real (value) part, discarding any derivative components.
    fn re(&self) -> f64;
}

impl TracerScalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn re(&self) -> f64 {
        *self
    }
}
