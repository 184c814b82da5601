//! Dual and hyper-dual numbers
//!
//! Truncated-Taylor arithmetic: a [`Dual`] carries one first-derivative
//! component (`a + b·ε` with `ε² = 0`), a [`HyperDual`] carries two
//! independent first-order components and the mixed second-order component
//! (`a + b·ε₁ + c·ε₂ + d·ε₁ε₂` with `ε₁² = ε₂² = 0`). Running ordinary
//! arithmetic on these types yields exact derivatives of the computation,
//! so seeding a parameter with a unit derivative component and evaluating
//! the state function gives one Jacobian column with no finite differencing.

use crate::scalar::TracerScalar;
use num::{One, Zero};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// First-order dual number `re + eps·ε`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dual {
    /// Value part.
    pub re: f64,
    /// Derivative part.
    pub eps: f64,
}

impl Dual {
    pub fn new(re: f64, eps: f64) -> Self {
        Self { re, eps }
    }

    /// The unit first-derivative seed `x + 1·ε`.
    pub fn seed(re: f64) -> Self {
        Self { re, eps: 1.0 }
    }
}

impl Add for Dual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.eps + rhs.eps)
    }
}

impl Sub for Dual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.eps - rhs.eps)
    }
}

impl Mul for Dual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.re * rhs.re, self.re * rhs.eps + self.eps * rhs.re)
    }
}

impl Div for Dual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self::new(
            self.re / rhs.re,
            (self.eps * rhs.re - self.re * rhs.eps) / (rhs.re * rhs.re),
        )
    }
}

impl Neg for Dual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.re, -self.eps)
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Dual {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Dual {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Dual {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Zero for Dual {
    fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.eps == 0.0
    }
}

impl One for Dual {
    fn one() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl TracerScalar for Dual {
    fn from_f64(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    fn re(&self) -> f64 {
        self.re
    }
}

/// Second-order hyper-dual number `re + e1·ε₁ + e2·ε₂ + e12·ε₁ε₂`.
///
/// Seeding both first-order components with 1 and evaluating `f` yields
/// `f''` in `e12` (and `f'` in both `e1` and `e2`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperDual {
    pub re: f64,
    pub e1: f64,
    pub e2: f64,
    pub e12: f64,
}

impl HyperDual {
    pub fn new(re: f64, e1: f64, e2: f64, e12: f64) -> Self {
        Self { re, e1, e2, e12 }
    }

    /// The unit second-derivative seed `x + 1·ε₁ + 1·ε₂`.
    pub fn seed(re: f64) -> Self {
        Self::new(re, 1.0, 1.0, 0.0)
    }
}

impl Add for HyperDual {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.re + rhs.re,
            self.e1 + rhs.e1,
            self.e2 + rhs.e2,
            self.e12 + rhs.e12,
        )
    }
}

impl Sub for HyperDual {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.re - rhs.re,
            self.e1 - rhs.e1,
            self.e2 - rhs.e2,
            self.e12 - rhs.e12,
        )
    }
}

impl Mul for HyperDual {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re,
            self.re * rhs.e1 + self.e1 * rhs.re,
            self.re * rhs.e2 + self.e2 * rhs.re,
            self.re * rhs.e12 + self.e12 * rhs.re + self.e1 * rhs.e2 + self.e2 * rhs.e1,
        )
    }
}

impl Div for HyperDual {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        // x / y = x * y⁻¹ with
        // y⁻¹ = 1/a − b/a²·ε₁ − c/a²·ε₂ + (2bc/a³ − d/a²)·ε₁ε₂
        let a = rhs.re;
        let inv = Self::new(
            1.0 / a,
            -rhs.e1 / (a * a),
            -rhs.e2 / (a * a),
            2.0 * rhs.e1 * rhs.e2 / (a * a * a) - rhs.e12 / (a * a),
        );
        self * inv
    }
}

impl Neg for HyperDual {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.re, -self.e1, -self.e2, -self.e12)
    }
}

impl AddAssign for HyperDual {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for HyperDual {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for HyperDual {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for HyperDual {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl Zero for HyperDual {
    fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    fn is_zero(&self) -> bool {
        self.re == 0.0 && self.e1 == 0.0 && self.e2 == 0.0 && self.e12 == 0.0
    }
}

impl One for HyperDual {
    fn one() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl TracerScalar for HyperDual {
    fn from_f64(value: f64) -> Self {
        Self::new(value, 0.0, 0.0, 0.0)
    }

    fn re(&self) -> f64 {
        self.re
    }
}
