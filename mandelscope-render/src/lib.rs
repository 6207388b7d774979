pub mod config;
pub mod controller;
pub mod error;
pub mod explorer;
pub mod frame;
pub mod preview;
pub mod scheduler;
pub mod tile;
pub mod version;

pub use config::ExplorerConfig;
pub use controller::{Action, DragState, ViewportController, ZoomDirection};
pub use error::RenderError;
pub use explorer::{Display, Explorer, FrameReady, InputEvent};
pub use frame::FrameBuffer;
pub use preview::{PixelRect, PreviewCache, PreviewImage, PreviewPlacement};
pub use scheduler::{render_band, PassComplete, PassPhase, RowComplete, TileScheduler};
pub use tile::{build_row_bands, RowBand};
pub use version::RenderVersion;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
