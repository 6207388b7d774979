pub mod complex;
pub mod error;
pub mod fractal;
pub mod mandelbrot;
pub mod mapping;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use fractal::{intensity, Fractal, FractalParams, IterationResult};
pub use mandelbrot::{escape_time, Mandelbrot};
pub use mapping::{pixel_to_point, point_to_pixel, OutputSize, PixelPos};
pub use viewport::Viewport;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
