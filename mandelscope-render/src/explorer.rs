use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mandelscope_core::{Mandelbrot, OutputSize, PixelPos, Viewport};

use crate::config::ExplorerConfig;
use crate::controller::{Action, ViewportController, ZoomDirection};
use crate::frame::FrameBuffer;
use crate::preview::{PreviewCache, PreviewPlacement};
use crate::scheduler::{PassComplete, PassPhase, TileScheduler};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Normalized input delivered by the host UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    Resize { width: u32, height: u32 },
    Zoom { x: f64, y: f64, direction: ZoomDirection },
    DragStart { x: f64, y: f64 },
    DragMove { x: f64, y: f64 },
    DragEnd { x: f64, y: f64 },
}

/// Notification that a full frame is ready to be shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReady {
    pub version: u64,
    pub size: OutputSize,
    pub viewport: Viewport,
    pub elapsed: Duration,
}

/// What the host should paint right now.
#[derive(Debug, Clone, Copy)]
pub enum Display<'a> {
    /// Nothing rendered yet.
    Blank,
    /// The completed full-resolution frame, at its native position.
    Frame(&'a FrameBuffer),
    /// The cached preview, stretched into place for the current viewport.
    Preview(PreviewPlacement<'a>),
}

// ---------------------------------------------------------------------------
// Explorer
// ---------------------------------------------------------------------------

/// The interactive renderer as a plain object.
///
/// The host owns it, forwards input through the `on_*` methods, and calls
/// [`poll`](Self::poll) from its event loop to pick up finished frames. Every
/// method runs on the caller's thread, which makes that thread the single
/// coordination context for viewport, version, counter and preview state.
pub struct Explorer {
    controller: ViewportController,
    scheduler: TileScheduler,
    preview: PreviewCache,
    fractal: Mandelbrot,
}

impl Explorer {
    pub fn new(config: &ExplorerConfig) -> crate::Result<Self> {
        config.validate()?;
        let scheduler = TileScheduler::new(config.threads, config.band_rows)?;
        info!(
            threads = scheduler.threads(),
            max_iterations = config.max_iterations,
            preview_size = config.preview_size,
            viewport = %config.initial_viewport,
            "Explorer ready"
        );
        Ok(Self {
            controller: ViewportController::new(
                config.initial_viewport,
                config.zoom_step,
                config.drag_rerender_fraction,
            ),
            scheduler,
            preview: PreviewCache::new(config.preview_size),
            fractal: Mandelbrot::new(config.fractal_params()?),
        })
    }

    pub fn on_resize(&mut self, size: OutputSize) -> crate::Result<Action> {
        let action = self.controller.resize(size);
        self.apply(action)
    }

    pub fn on_zoom(&mut self, cursor: PixelPos, direction: ZoomDirection) -> crate::Result<Action> {
        let action = self.controller.zoom(cursor, direction);
        self.apply(action)
    }

    pub fn on_drag_start(&mut self, pos: PixelPos) -> crate::Result<Action> {
        let action = self.controller.drag_start(pos);
        self.apply(action)
    }

    pub fn on_drag_move(&mut self, pos: PixelPos) -> crate::Result<Action> {
        let action = self.controller.drag_move(pos);
        self.apply(action)
    }

    pub fn on_drag_end(&mut self, pos: PixelPos) -> crate::Result<Action> {
        let action = self.controller.drag_end(pos);
        self.apply(action)
    }

    /// Dispatch a host event to the matching `on_*` method.
    pub fn handle(&mut self, event: InputEvent) -> crate::Result<Action> {
        debug!(?event, "Input");
        match event {
            InputEvent::Resize { width, height } => self.on_resize(OutputSize::new(width, height)?),
            InputEvent::Zoom { x, y, direction } => self.on_zoom(PixelPos::new(x, y), direction),
            InputEvent::DragStart { x, y } => self.on_drag_start(PixelPos::new(x, y)),
            InputEvent::DragMove { x, y } => self.on_drag_move(PixelPos::new(x, y)),
            InputEvent::DragEnd { x, y } => self.on_drag_end(PixelPos::new(x, y)),
        }
    }

    fn apply(&mut self, action: Action) -> crate::Result<Action> {
        if action != Action::Render {
            return Ok(action);
        }
        let Some(size) = self.controller.size() else {
            return Ok(Action::None);
        };
        self.scheduler
            .start_pass(self.fractal.clone(), self.controller.viewport(), size)?;
        Ok(action)
    }

    /// Collect finished rows without blocking; `Some` when a frame completed.
    pub fn poll(&mut self) -> Option<FrameReady> {
        let done = self.scheduler.pump()?;
        Some(self.finish(done))
    }

    /// Block until the current pass completes or `timeout` elapses.
    pub fn wait_for_frame(&mut self, timeout: Duration) -> Option<FrameReady> {
        let done = self.scheduler.wait(timeout)?;
        Some(self.finish(done))
    }

    fn finish(&mut self, done: PassComplete) -> FrameReady {
        if let Some(frame) = self.scheduler.frame() {
            self.preview.capture(frame, done.viewport);
        }
        FrameReady {
            version: done.version,
            size: done.size,
            viewport: done.viewport,
            elapsed: done.elapsed,
        }
    }

    /// Choose between the full frame and the transformed preview.
    ///
    /// The frame is shown only once its pass is complete and no drag is in
    /// progress; otherwise the preview stands in, placed under the live
    /// viewport.
    pub fn display(&self) -> Display<'_> {
        if !self.controller.is_dragging() && self.scheduler.phase() == PassPhase::Complete {
            if let Some(frame) = self.scheduler.frame() {
                return Display::Frame(frame);
            }
        }
        self.controller
            .size()
            .and_then(|size| self.preview.render(size, &self.controller.viewport()))
            .map_or(Display::Blank, Display::Preview)
    }

    pub fn viewport(&self) -> Viewport {
        self.controller.viewport()
    }

    pub fn size(&self) -> Option<OutputSize> {
        self.controller.size()
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    pub fn phase(&self) -> PassPhase {
        self.scheduler.phase()
    }

    pub fn progress(&self) -> (u32, u32) {
        self.scheduler.progress()
    }

    pub fn current_version(&self) -> u64 {
        self.scheduler.current_version()
    }

    pub fn frame(&self) -> Option<&FrameBuffer> {
        self.scheduler.frame()
    }

    pub fn preview(&self) -> &PreviewCache {
        &self.preview
    }
}
