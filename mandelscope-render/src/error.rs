use std::collections::TryReserveError;

use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid frame dimensions: {width}×{height} overflows the addressable buffer")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to allocate {bytes} bytes for a {width}×{height} frame")]
    Allocation {
        width: u32,
        height: u32,
        bytes: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to build render thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to read configuration")]
    ConfigIo(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mandelscope_core::CoreError),
}
