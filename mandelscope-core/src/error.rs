use thiserror::Error;

/// Errors raised when constructing core value types.
///
/// Once a `Viewport`, `OutputSize` or `FractalParams` exists it is valid, so
/// mapping and evaluation never fail.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid output size: {width}×{height} (both must be > 0)")]
    InvalidOutputSize { width: u32, height: u32 },

    #[error("degenerate viewport: {reason}")]
    DegenerateViewport { reason: String },
}
