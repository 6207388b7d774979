use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mandelscope_core::{FractalParams, Viewport};

use crate::error::RenderError;
use crate::preview::DEFAULT_PREVIEW_SIZE;

/// Tunables for an [`Explorer`](crate::Explorer).
///
/// Every field has a default, so a partial JSON object (or `{}`) is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Side length of the square preview snapshot.
    #[serde(default = "default_preview_size")]
    pub preview_size: u32,
    #[serde(default)]
    pub initial_viewport: Viewport,
    /// Fraction of the output width/height a drag may travel before an
    /// intermediate render is started.
    #[serde(default = "default_drag_rerender_fraction")]
    pub drag_rerender_fraction: f64,
    /// Each zoom step grows or shrinks every half-extent by this fraction of
    /// the full extent.
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
    /// Render threads; `0` means one per core.
    #[serde(default)]
    pub threads: usize,
    /// Rows per render task.
    #[serde(default = "default_band_rows")]
    pub band_rows: u32,
}

fn default_max_iterations() -> u32 {
    FractalParams::DEFAULT_MAX_ITERATIONS
}
fn default_preview_size() -> u32 {
    DEFAULT_PREVIEW_SIZE
}
fn default_drag_rerender_fraction() -> f64 {
    0.125
}
fn default_zoom_step() -> f64 {
    0.1
}
fn default_band_rows() -> u32 {
    1
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            preview_size: default_preview_size(),
            initial_viewport: Viewport::default(),
            drag_rerender_fraction: default_drag_rerender_fraction(),
            zoom_step: default_zoom_step(),
            threads: 0,
            band_rows: default_band_rows(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded configuration from {}", path.display());
        debug!(?config, "Explorer configuration");
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        FractalParams::new(self.max_iterations)?;
        if self.preview_size == 0 {
            return Err(RenderError::InvalidConfig("preview_size must be >= 1".into()));
        }
        if !(self.drag_rerender_fraction > 0.0 && self.drag_rerender_fraction <= 1.0) {
            return Err(RenderError::InvalidConfig(format!(
                "drag_rerender_fraction must be in (0, 1], got {}",
                self.drag_rerender_fraction
            )));
        }
        if !(self.zoom_step > 0.0 && self.zoom_step < 0.5) {
            return Err(RenderError::InvalidConfig(format!(
                "zoom_step must be in (0, 0.5), got {}",
                self.zoom_step
            )));
        }
        if self.band_rows == 0 {
            return Err(RenderError::InvalidConfig("band_rows must be >= 1".into()));
        }
        Ok(())
    }

    pub fn fractal_params(&self) -> crate::Result<FractalParams> {
        Ok(FractalParams::new(self.max_iterations)?)
    }
}
