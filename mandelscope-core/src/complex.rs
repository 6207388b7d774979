use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// A point on the complex plane with `f64` components.
///
/// Kept deliberately small and `Copy`: it is passed by value through the
/// per-pixel loop and captured into every render pass snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// `re² + im²`, the squared magnitude used by the escape test.
    #[inline]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// `z² + c` in one step, without going through the general product.
    #[inline]
    pub fn square_add(self, c: Self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im + c.re,
            im: 2.0 * self.re * self.im + c.im,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

impl Add for Complex {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl AddAssign for Complex {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Complex {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl SubAssign for Complex {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for Complex {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// Scalar multiplication: `Complex * f64`.
impl Mul<f64> for Complex {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.re * rhs, self.im * rhs)
    }
}

/// Scalar division: `Complex / f64`.
impl Div<f64> for Complex {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self::new(self.re / rhs, self.im / rhs)
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{} - {}i", self.re, -self.im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn close(a: Complex, b: Complex) -> bool {
        (a.re - b.re).abs() < EPSILON && (a.im - b.im).abs() < EPSILON
    }

    #[test]
    fn add_and_sub_are_componentwise() {
        let a = Complex::new(1.5, -2.0);
        let b = Complex::new(0.5, 3.0);
        assert!(close(a + b, Complex::new(2.0, 1.0)));
        assert!(close(a - b, Complex::new(1.0, -5.0)));

        let mut c = a;
        c += b;
        c -= b;
        assert!(close(c, a));
    }

    #[test]
    fn product_of_conjugates_is_real() {
        // (2 + 3i)(2 - 3i) = 4 + 9 = 13
        let p = Complex::new(2.0, 3.0) * Complex::new(2.0, -3.0);
        assert!(close(p, Complex::new(13.0, 0.0)));
    }

    #[test]
    fn square_add_matches_general_product() {
        let z = Complex::new(-0.7, 0.3);
        let c = Complex::new(0.25, -0.5);
        assert!(close(z.square_add(c), z * z + c));
    }

    #[test]
    fn scalar_ops() {
        let a = Complex::new(3.0, -1.0);
        assert!(close(a * 2.0, Complex::new(6.0, -2.0)));
        assert!(close(a / 2.0, Complex::new(1.5, -0.5)));
    }

    #[test]
    fn norm_sq_of_three_four() {
        assert!((Complex::new(3.0, 4.0).norm_sq() - 25.0).abs() < EPSILON);
    }

    #[test]
    fn display_shows_sign_of_imaginary_part() {
        assert_eq!(Complex::new(1.0, -2.0).to_string(), "1 - 2i");
        assert_eq!(Complex::new(-1.0, 0.5).to_string(), "-1 + 0.5i");
    }

    #[test]
    fn finiteness() {
        assert!(Complex::new(1.0, 2.0).is_finite());
        assert!(!Complex::new(f64::NAN, 0.0).is_finite());
        assert!(!Complex::new(0.0, f64::INFINITY).is_finite());
    }
}
