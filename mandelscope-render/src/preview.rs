use tracing::debug;

use mandelscope_core::{point_to_pixel, OutputSize, Viewport};

use crate::frame::FrameBuffer;

/// Default side length of the square preview snapshot.
pub const DEFAULT_PREVIEW_SIZE: u32 = 320;

/// A small, tightly packed grayscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PreviewImage {
    pub(crate) fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels, `width * height` bytes, no padding.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

/// Axis-aligned rectangle in output pixel space. May extend off-screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PixelRect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// The cached image together with where it should be drawn right now.
#[derive(Debug, Clone, Copy)]
pub struct PreviewPlacement<'a> {
    pub image: &'a PreviewImage,
    pub rect: PixelRect,
}

impl PreviewPlacement<'_> {
    /// Stretch the preview into a full output-sized frame.
    ///
    /// Each output pixel samples the preview texel under its centre; pixels
    /// outside the placement rectangle stay black. Hosts that cannot scale
    /// and translate an image themselves can show this directly.
    pub fn rasterize(&self, size: OutputSize) -> crate::Result<FrameBuffer> {
        let mut frame = FrameBuffer::new(size)?;
        let (rect_w, rect_h) = (self.rect.width(), self.rect.height());
        if rect_w <= 0.0 || rect_h <= 0.0 {
            return Ok(frame);
        }
        let (img_w, img_h) = (self.image.width as f64, self.image.height as f64);

        for y in 0..size.height() {
            let v = (y as f64 + 0.5 - self.rect.top) / rect_h * img_h;
            if !(0.0..img_h).contains(&v) {
                continue;
            }
            let row = frame.row_mut(y);
            for (x, out) in row.iter_mut().enumerate() {
                let u = (x as f64 + 0.5 - self.rect.left) / rect_w * img_w;
                if (0.0..img_w).contains(&u) {
                    *out = self.image.pixel(u as u32, v as u32);
                }
            }
        }
        Ok(frame)
    }
}

struct Snapshot {
    image: PreviewImage,
    bounds: Viewport,
}

/// The last fully rendered frame, downsampled, with the viewport it shows.
///
/// Only completed passes are captured, and only the most recent one is kept.
/// While a new pass is pending the snapshot is redrawn under the current
/// viewport so panning and zooming stay fluid.
pub struct PreviewCache {
    preview_size: u32,
    snapshot: Option<Snapshot>,
}

impl PreviewCache {
    pub fn new(preview_size: u32) -> Self {
        Self {
            preview_size: preview_size.max(1),
            snapshot: None,
        }
    }

    /// Replace the snapshot with a downsampled copy of `frame`.
    ///
    /// `bounds` must be the viewport the frame was rendered from.
    pub fn capture(&mut self, frame: &FrameBuffer, bounds: Viewport) {
        let image = frame.downsample(self.preview_size, self.preview_size);
        debug!(
            frame = %frame.size(),
            preview = self.preview_size,
            %bounds,
            "Captured preview"
        );
        self.snapshot = Some(Snapshot { image, bounds });
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Viewport of the captured frame.
    pub fn bounds(&self) -> Option<Viewport> {
        self.snapshot.as_ref().map(|s| s.bounds)
    }

    pub fn image(&self) -> Option<&PreviewImage> {
        self.snapshot.as_ref().map(|s| &s.image)
    }

    /// Where the snapshot lands in an output of `size` showing `current`.
    pub fn render(&self, size: OutputSize, current: &Viewport) -> Option<PreviewPlacement<'_>> {
        let snapshot = self.snapshot.as_ref()?;
        let top_left = point_to_pixel(size, snapshot.bounds.upper_left(), current);
        let bottom_right = point_to_pixel(size, snapshot.bounds.lower_right(), current);
        Some(PreviewPlacement {
            image: &snapshot.image,
            rect: PixelRect {
                left: top_left.x,
                top: top_left.y,
                right: bottom_right.x,
                bottom: bottom_right.y,
            },
        })
    }
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_SIZE)
    }
}
