use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Outcome of iterating a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationResult {
    /// The orbit left the radius-2 disc at iteration index `iterations`.
    Escaped { iterations: u32 },

    /// The orbit stayed bounded for `max_iterations` steps.
    Interior,
}

impl IterationResult {
    /// Escape iteration, or `None` for interior points.
    #[inline]
    pub fn escape_iteration(self) -> Option<u32> {
        match self {
            Self::Escaped { iterations } => Some(iterations),
            Self::Interior => None,
        }
    }

    /// Grayscale value for this result; see [`intensity`].
    #[inline]
    pub fn intensity(self, max_iterations: u32) -> u8 {
        intensity(self.escape_iteration(), max_iterations)
    }
}

impl From<Option<u32>> for IterationResult {
    fn from(escape: Option<u32>) -> Self {
        match escape {
            Some(iterations) => Self::Escaped { iterations },
            None => Self::Interior,
        }
    }
}

/// Map an escape iteration to a single-channel intensity.
///
/// Escaping points get `255 - (floor(255 · i / max) mod 256)`, so fast escapes
/// are bright and slow escapes dim. Interior points are `0`. This mapping is
/// part of the output format and must stay bit-exact.
#[inline]
pub fn intensity(escape: Option<u32>, max_iterations: u32) -> u8 {
    match escape {
        Some(i) => {
            let scaled = 255.0 * f64::from(i) / f64::from(max_iterations);
            255 - (scaled as u32 % 256) as u8
        }
        None => 0,
    }
}

/// Parameters controlling iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FractalParams {
    max_iterations: u32,
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

    pub fn new(max_iterations: u32) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        Ok(Self { max_iterations })
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl TryFrom<u32> for FractalParams {
    type Error = CoreError;

    fn try_from(max_iterations: u32) -> Result<Self, Self::Error> {
        Self::new(max_iterations)
    }
}

impl From<FractalParams> for u32 {
    fn from(params: FractalParams) -> Self {
        params.max_iterations
    }
}

/// An escape-time fractal.
///
/// Renderers are generic over `F: Fractal` so the per-pixel call is
/// statically dispatched and inlined into the row loop.
pub trait Fractal {
    /// Iterate the orbit seeded by `point`.
    fn iterate(&self, point: Complex) -> IterationResult;

    fn params(&self) -> &FractalParams;

    /// Iterate `point` and map the result straight to an intensity.
    #[inline]
    fn intensity_at(&self, point: Complex) -> u8 {
        self.iterate(point).intensity(self.params().max_iterations())
    }
}
