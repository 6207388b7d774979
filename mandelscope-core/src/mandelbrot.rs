use crate::complex::Complex;
use crate::fractal::{Fractal, FractalParams, IterationResult};

/// Squared bailout radius: an orbit has escaped once `|z|² > 4`.
pub const ESCAPE_NORM_SQ: f64 = 4.0;

/// Escape time of `c` under `z ← z² + c`, starting from `z = 0`.
///
/// Returns the index of the first iteration whose result satisfies
/// `|z|² > 4`, or `None` if the orbit stays bounded for `max_iterations`
/// steps. `|z|² == 4` does not count as escaped.
#[inline]
pub fn escape_time(c: Complex, max_iterations: u32) -> Option<u32> {
    let mut z = Complex::ZERO;
    for i in 0..max_iterations {
        z = z.square_add(c);
        if z.norm_sq() > ESCAPE_NORM_SQ {
            return Some(i);
        }
    }
    None
}

/// The Mandelbrot set evaluated with plain `f64` iteration.
///
/// No interior shortcuts (cardioid or bulb tests, periodicity checks) are
/// applied: every pixel runs the full loop so output stays reproducible.
#[derive(Debug, Clone, Default)]
pub struct Mandelbrot {
    params: FractalParams,
}

impl Mandelbrot {
    pub fn new(params: FractalParams) -> Self {
        Self { params }
    }
}

impl Fractal for Mandelbrot {
    #[inline]
    fn iterate(&self, c: Complex) -> IterationResult {
        escape_time(c, self.params.max_iterations()).into()
    }

    fn params(&self) -> &FractalParams {
        &self.params
    }
}
