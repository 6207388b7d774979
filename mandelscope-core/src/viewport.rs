use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// The visible rectangle of the complex plane.
///
/// `upper_left` has the smallest real and the largest imaginary part;
/// `lower_right` the opposite. Both corners are finite and the rectangle has
/// non-zero area, which is enforced on construction and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawViewport")]
pub struct Viewport {
    upper_left: Complex,
    lower_right: Complex,
}

#[derive(Deserialize)]
struct RawViewport {
    upper_left: Complex,
    lower_right: Complex,
}

impl TryFrom<RawViewport> for Viewport {
    type Error = CoreError;

    fn try_from(raw: RawViewport) -> Result<Self, Self::Error> {
        Self::new(raw.upper_left, raw.lower_right)
    }
}

impl Viewport {
    /// Real axis `[-2, 1]`, imaginary axis `[-1, 1]`.
    pub const DEFAULT: Self = Self {
        upper_left: Complex::new(-2.0, 1.0),
        lower_right: Complex::new(1.0, -1.0),
    };

    pub fn new(upper_left: Complex, lower_right: Complex) -> crate::Result<Self> {
        if !upper_left.is_finite() || !lower_right.is_finite() {
            return Err(CoreError::DegenerateViewport {
                reason: format!("corners must be finite, got {upper_left} .. {lower_right}"),
            });
        }
        if upper_left.re >= lower_right.re {
            return Err(CoreError::DegenerateViewport {
                reason: format!(
                    "upper-left real part {} must be < lower-right real part {}",
                    upper_left.re, lower_right.re
                ),
            });
        }
        if upper_left.im <= lower_right.im {
            return Err(CoreError::DegenerateViewport {
                reason: format!(
                    "upper-left imaginary part {} must be > lower-right imaginary part {}",
                    upper_left.im, lower_right.im
                ),
            });
        }
        Ok(Self {
            upper_left,
            lower_right,
        })
    }

    /// Build a viewport from its centre and half-extent.
    ///
    /// `half` follows the corner-difference convention: positive real,
    /// negative imaginary (i.e. `(lower_right - upper_left) / 2`).
    pub fn from_center(center: Complex, half: Complex) -> crate::Result<Self> {
        Self::new(center - half, center + half)
    }

    #[inline]
    pub fn upper_left(&self) -> Complex {
        self.upper_left
    }

    #[inline]
    pub fn lower_right(&self) -> Complex {
        self.lower_right
    }

    /// Corner difference `lower_right - upper_left` (real > 0, imaginary < 0).
    #[inline]
    pub fn span(&self) -> Complex {
        self.lower_right - self.upper_left
    }

    /// Extent along the real axis.
    #[inline]
    pub fn width(&self) -> f64 {
        self.lower_right.re - self.upper_left.re
    }

    /// Extent along the imaginary axis.
    #[inline]
    pub fn height(&self) -> f64 {
        self.upper_left.im - self.lower_right.im
    }

    pub fn center(&self) -> Complex {
        (self.upper_left + self.lower_right) / 2.0
    }

    /// The same rectangle moved by `delta` in plane units.
    pub fn translated(&self, delta: Complex) -> crate::Result<Self> {
        Self::new(self.upper_left + delta, self.lower_right + delta)
    }

    /// Keep `upper_left` fixed and multiply each extent by its factor.
    pub fn rescaled(&self, width_factor: f64, height_factor: f64) -> crate::Result<Self> {
        let lower_right = Complex::new(
            self.upper_left.re + self.width() * width_factor,
            self.upper_left.im - self.height() * height_factor,
        );
        Self::new(self.upper_left, lower_right)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.upper_left, self.lower_right)
    }
}
