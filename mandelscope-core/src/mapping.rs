//! Pixel ↔ complex-plane coordinate mapping.
//!
//! Pixel `(0, 0)` is the top-left corner of the output and maps to the
//! viewport's `upper_left`. Pixel y grows downward while the imaginary part
//! grows upward, so the y axis is inverted.

use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;
use crate::viewport::Viewport;

/// Dimensions of the output image in pixels. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawOutputSize")]
pub struct OutputSize {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct RawOutputSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawOutputSize> for OutputSize {
    type Error = CoreError;

    fn try_from(raw: RawOutputSize) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height)
    }
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidOutputSize { width, height });
        }
        Ok(Self { width, height })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for OutputSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// A (possibly fractional, possibly off-screen) position in output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Map an output pixel to the complex plane.
#[inline]
pub fn pixel_to_point(size: OutputSize, x: f64, y: f64, viewport: &Viewport) -> Complex {
    let ul = viewport.upper_left();
    Complex::new(
        ul.re + x * viewport.width() / size.width as f64,
        ul.im - y * viewport.height() / size.height as f64,
    )
}

/// Inverse of [`pixel_to_point`]: where `point` lands in the output.
///
/// Used to place the cached preview, whose bounds were recorded under an
/// older viewport, into the current output.
#[inline]
pub fn point_to_pixel(size: OutputSize, point: Complex, viewport: &Viewport) -> PixelPos {
    let ul = viewport.upper_left();
    PixelPos {
        x: (point.re - ul.re) * size.width as f64 / viewport.width(),
        y: (ul.im - point.im) * size.height as f64 / viewport.height(),
    }
}
