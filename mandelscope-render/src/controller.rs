use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mandelscope_core::{pixel_to_point, OutputSize, PixelPos, Viewport};

/// What the host should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing changed.
    None,
    /// The viewport moved; repaint from the preview, no new pass.
    Redraw,
    /// Start a new render pass for the current viewport.
    Render,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomDirection {
    In,
    Out,
}

/// Pointer bookkeeping while a drag is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Last position the viewport was panned to.
    pub anchor: PixelPos,
    /// Most recent pointer position.
    pub current: PixelPos,
    /// Pixel displacement accumulated since the last render was requested.
    pub since_render: PixelPos,
}

/// Owns the live viewport and turns input into viewport changes.
///
/// The controller never renders; it only reports through [`Action`] whether
/// a new pass is warranted or a cheap preview redraw is enough.
#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    size: Option<OutputSize>,
    drag: Option<DragState>,
    zoom_step: f64,
    drag_rerender_fraction: f64,
}

impl ViewportController {
    pub fn new(viewport: Viewport, zoom_step: f64, drag_rerender_fraction: f64) -> Self {
        Self {
            viewport,
            size: None,
            drag: None,
            zoom_step,
            drag_rerender_fraction,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn size(&self) -> Option<OutputSize> {
        self.size
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Adopt a new output size.
    ///
    /// After the first size, the plane extent is rescaled with the output
    /// (upper-left corner fixed) so each pixel keeps covering the same area of
    /// the plane and a larger window simply reveals more of it.
    pub fn resize(&mut self, size: OutputSize) -> Action {
        if self.size == Some(size) {
            return Action::None;
        }
        if let Some(old) = self.size {
            let fx = size.width() as f64 / old.width() as f64;
            let fy = size.height() as f64 / old.height() as f64;
            match self.viewport.rescaled(fx, fy) {
                Ok(vp) => self.viewport = vp,
                Err(e) => warn!(error = %e, %old, new = %size, "Keeping viewport across resize"),
            }
        }
        debug!(%size, viewport = %self.viewport, "Output resized");
        self.size = Some(size);
        Action::Render
    }

    /// Zoom one step toward (`In`) or away from (`Out`) the plane point under
    /// `cursor`, keeping that point fixed on screen.
    pub fn zoom(&mut self, cursor: PixelPos, direction: ZoomDirection) -> Action {
        let Some(size) = self.size else {
            return Action::None;
        };
        let span = self.viewport.span();
        let step = match direction {
            ZoomDirection::In => -self.zoom_step,
            ZoomDirection::Out => self.zoom_step,
        };
        let half = span / 2.0 + span * step;

        let zoomed = Viewport::from_center(self.viewport.center(), half).and_then(|candidate| {
            let before = pixel_to_point(size, cursor.x, cursor.y, &self.viewport);
            let after = pixel_to_point(size, cursor.x, cursor.y, &candidate);
            candidate.translated(before - after)
        });
        match zoomed {
            Ok(vp) => {
                debug!(?direction, viewport = %vp, "Zoomed");
                self.viewport = vp;
                // The zoom pass covers any movement made so far in a drag.
                if let Some(drag) = self.drag.as_mut() {
                    drag.since_render = PixelPos::default();
                }
                Action::Render
            }
            Err(e) => {
                warn!(?direction, error = %e, "Zoom limit reached");
                Action::None
            }
        }
    }

    /// Begin a drag. Until it ends, the display shows the preview.
    pub fn drag_start(&mut self, pos: PixelPos) -> Action {
        self.drag = Some(DragState {
            anchor: pos,
            current: pos,
            since_render: PixelPos::default(),
        });
        Action::Redraw
    }

    /// Pan by the pointer movement since the previous event.
    ///
    /// Returns `Render` once the displacement accumulated since the last
    /// render exceeds the configured fraction of the output width or height,
    /// so the live image never drifts too far from the preview.
    pub fn drag_move(&mut self, pos: PixelPos) -> Action {
        let Some(mut drag) = self.drag else {
            return Action::None;
        };
        self.pan(drag.anchor, pos);
        drag.since_render.x += pos.x - drag.anchor.x;
        drag.since_render.y += pos.y - drag.anchor.y;
        drag.anchor = pos;
        drag.current = pos;

        let action = match self.size {
            Some(size) if self.exceeds_threshold(drag.since_render, size) => {
                drag.since_render = PixelPos::default();
                Action::Render
            }
            _ => Action::Redraw,
        };
        self.drag = Some(drag);
        action
    }

    /// Finish the drag at `pos` and request a full render.
    pub fn drag_end(&mut self, pos: PixelPos) -> Action {
        let Some(drag) = self.drag.take() else {
            return Action::None;
        };
        self.pan(drag.anchor, pos);
        Action::Render
    }

    fn exceeds_threshold(&self, moved: PixelPos, size: OutputSize) -> bool {
        moved.x.abs() > size.width() as f64 * self.drag_rerender_fraction
            || moved.y.abs() > size.height() as f64 * self.drag_rerender_fraction
    }

    /// Move the viewport so the plane point under `from` ends up under `to`.
    fn pan(&mut self, from: PixelPos, to: PixelPos) {
        let Some(size) = self.size else {
            return;
        };
        let delta = pixel_to_point(size, from.x, from.y, &self.viewport)
            - pixel_to_point(size, to.x, to.y, &self.viewport);
        match self.viewport.translated(delta) {
            Ok(vp) => self.viewport = vp,
            Err(e) => warn!(error = %e, "Ignoring pan"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandelscope_core::Complex;

    const EPSILON: f64 = 1e-9;

    fn controller(w: u32, h: u32) -> ViewportController {
        let mut c = ViewportController::new(Viewport::default(), 0.1, 0.125);
        assert_eq!(c.resize(OutputSize::new(w, h).unwrap()), Action::Render);
        c
    }

    fn close(a: Complex, b: Complex) -> bool {
        (a.re - b.re).abs() < EPSILON && (a.im - b.im).abs() < EPSILON
    }

    #[test]
    fn first_resize_keeps_viewport() {
        let c = controller(300, 200);
        assert_eq!(c.viewport(), Viewport::default());
    }

    #[test]
    fn resize_preserves_plane_scale() {
        let mut c = controller(300, 200);
        assert_eq!(c.resize(OutputSize::new(600, 100).unwrap()), Action::Render);
        let vp = c.viewport();
        assert_eq!(vp.upper_left(), Viewport::DEFAULT.upper_left());
        assert!((vp.width() - 6.0).abs() < EPSILON);
        assert!((vp.height() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn repeated_size_is_a_no_op() {
        let mut c = controller(300, 200);
        assert_eq!(c.resize(OutputSize::new(300, 200).unwrap()), Action::None);
    }

    #[test]
    fn zoom_requires_a_size() {
        let mut c = ViewportController::new(Viewport::default(), 0.1, 0.125);
        assert_eq!(c.zoom(PixelPos::new(1.0, 1.0), ZoomDirection::In), Action::None);
    }

    #[test]
    fn zoom_in_at_centre_shrinks_about_centre() {
        let mut c = controller(300, 200);
        assert_eq!(
            c.zoom(PixelPos::new(150.0, 100.0), ZoomDirection::In),
            Action::Render
        );
        let vp = c.viewport();
        assert!((vp.width() - 2.4).abs() < EPSILON);
        assert!((vp.height() - 1.6).abs() < EPSILON);
        assert!(close(vp.center(), Viewport::DEFAULT.center()));
    }

    #[test]
    fn zoom_out_grows_extent() {
        let mut c = controller(300, 200);
        c.zoom(PixelPos::new(0.0, 0.0), ZoomDirection::Out);
        let vp = c.viewport();
        assert!((vp.width() - 3.6).abs() < EPSILON);
        assert!((vp.height() - 2.4).abs() < EPSILON);
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let mut c = controller(300, 200);
        let size = c.size().unwrap();
        let cursor = PixelPos::new(37.0, 151.0);
        let before = pixel_to_point(size, cursor.x, cursor.y, &c.viewport());
        for direction in [ZoomDirection::In, ZoomDirection::In, ZoomDirection::Out] {
            c.zoom(cursor, direction);
            let after = pixel_to_point(size, cursor.x, cursor.y, &c.viewport());
            assert!(close(before, after), "{before} drifted to {after}");
        }
    }

    #[test]
    fn small_drag_pans_without_render() {
        let mut c = controller(320, 160);
        assert_eq!(c.drag_start(PixelPos::new(100.0, 50.0)), Action::Redraw);
        assert!(c.is_dragging());

        // 10 px right, 5 px down: under 40 px / 20 px thresholds.
        assert_eq!(c.drag_move(PixelPos::new(110.0, 55.0)), Action::Redraw);
        let vp = c.viewport();
        // Plane moves opposite to the pointer: 10 px = 10 * 3/320 left,
        // 5 px = 5 * 2/160 up.
        let expected =
            Viewport::DEFAULT.upper_left() + Complex::new(-10.0 * 3.0 / 320.0, 5.0 * 2.0 / 160.0);
        assert!(close(vp.upper_left(), expected));
        let drag = c.drag().unwrap();
        assert_eq!(drag.anchor, PixelPos::new(110.0, 55.0));
        assert_eq!(drag.since_render, PixelPos::new(10.0, 5.0));
    }

    #[test]
    fn crossing_threshold_requests_render_and_resets() {
        let mut c = controller(320, 160);
        c.drag_start(PixelPos::new(0.0, 0.0));
        assert_eq!(c.drag_move(PixelPos::new(30.0, 0.0)), Action::Redraw);
        // Accumulated 41 px > 320 / 8.
        assert_eq!(c.drag_move(PixelPos::new(41.0, 0.0)), Action::Render);
        assert_eq!(c.drag().unwrap().since_render, PixelPos::default());
        assert_eq!(c.drag_move(PixelPos::new(45.0, 0.0)), Action::Redraw);
        // Vertical threshold is relative to height: 21 px > 160 / 8.
        assert_eq!(c.drag_move(PixelPos::new(45.0, -21.0)), Action::Render);
    }

    #[test]
    fn drag_end_pans_and_renders() {
        let mut c = controller(300, 200);
        c.drag_start(PixelPos::new(50.0, 50.0));
        assert_eq!(c.drag_end(PixelPos::new(20.0, 50.0)), Action::Render);
        assert!(!c.is_dragging());
        // 30 px left drag moves the view 0.3 right.
        assert!(close(
            c.viewport().upper_left(),
            Viewport::DEFAULT.upper_left() + Complex::new(0.3, 0.0)
        ));
    }

    #[test]
    fn move_or_end_without_drag_is_ignored() {
        let mut c = controller(300, 200);
        assert_eq!(c.drag_move(PixelPos::new(5.0, 5.0)), Action::None);
        assert_eq!(c.drag_end(PixelPos::new(5.0, 5.0)), Action::None);
        assert_eq!(c.viewport(), Viewport::default());
    }

    #[test]
    fn drag_round_trip_restores_viewport() {
        let mut c = controller(300, 200);
        c.drag_start(PixelPos::new(10.0, 10.0));
        c.drag_move(PixelPos::new(25.0, 18.0));
        c.drag_move(PixelPos::new(12.0, 3.0));
        c.drag_end(PixelPos::new(10.0, 10.0));
        assert!(close(c.viewport().upper_left(), Viewport::DEFAULT.upper_left()));
        assert!(close(c.viewport().lower_right(), Viewport::DEFAULT.lower_right()));
    }

    #[test]
    fn zoom_during_drag_restarts_threshold_count() {
        let mut c = controller(320, 160);
        c.drag_start(PixelPos::new(100.0, 50.0));
        // 30 px of the 40 px threshold.
        assert_eq!(c.drag_move(PixelPos::new(130.0, 50.0)), Action::Redraw);
        assert_eq!(c.zoom(PixelPos::new(130.0, 50.0), ZoomDirection::In), Action::Render);
        assert!(c.is_dragging());
        assert_eq!(c.drag().unwrap().since_render, PixelPos::default());

        // Another 30 px stays under the threshold counted from the zoom.
        assert_eq!(c.drag_move(PixelPos::new(160.0, 50.0)), Action::Redraw);
        assert_eq!(c.drag().unwrap().since_render, PixelPos::new(30.0, 0.0));
    }
}
