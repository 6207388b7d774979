use mandelscope_core::OutputSize;

use crate::error::RenderError;
use crate::preview::PreviewImage;
use crate::tile::RowBand;

/// Row stride for an output `width` pixels wide: the next power of two.
///
/// Returns `None` when the stride does not fit in a `u32`.
pub fn stride_for(width: u32) -> Option<usize> {
    width.checked_next_power_of_two().map(|s| s as usize)
}

/// A single-channel (grayscale) frame with padded rows.
///
/// Pixel `(x, y)` lives at `y * stride + x`. Bytes between `width` and
/// `stride` on each row are padding and stay zero. The buffer has a single
/// owner; row tasks never borrow it, they hand finished bands to the owner
/// which copies them in with [`blit_band`](Self::blit_band).
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    size: OutputSize,
    stride: usize,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Allocate a zero-filled frame.
    ///
    /// Allocation is fallible: an oversized request surfaces as
    /// [`RenderError::Allocation`] instead of aborting the process.
    pub fn new(size: OutputSize) -> crate::Result<Self> {
        let (stride, data) = allocate(size)?;
        Ok(Self { size, stride, data })
    }

    /// Make the frame ready for a new pass at `size`.
    ///
    /// Reallocates when the size changed, otherwise zero-fills in place.
    /// Returns whether a reallocation happened. On error the frame is left
    /// exactly as it was.
    pub fn prepare(&mut self, size: OutputSize) -> crate::Result<bool> {
        if size == self.size {
            self.clear();
            return Ok(false);
        }
        let (stride, data) = allocate(size)?;
        self.size = size;
        self.stride = stride;
        self.data = data;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    #[inline]
    pub fn size(&self) -> OutputSize {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height()
    }

    /// Bytes per row, including padding.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[self.offset(x, y)]
    }

    /// The visible `width` bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width() as usize]
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = self.offset(0, y);
        let end = start + self.width() as usize;
        &mut self.data[start..end]
    }

    /// Full padded storage, `stride * height` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy a finished band (`band.height` unpadded rows) into place.
    pub fn blit_band(&mut self, band: &RowBand, pixels: &[u8]) {
        let width = self.width() as usize;
        debug_assert_eq!(pixels.len(), band.pixel_count(self.width()));
        for (row, src) in band.rows().zip(pixels.chunks_exact(width)) {
            self.row_mut(row).copy_from_slice(src);
        }
    }

    /// Nearest-neighbour resample to `width × height`.
    ///
    /// Each destination pixel samples the source pixel under its centre.
    pub fn downsample(&self, width: u32, height: u32) -> PreviewImage {
        let (src_w, src_h) = (self.width() as u64, self.height() as u64);
        let (dst_w, dst_h) = (width.max(1) as u64, height.max(1) as u64);
        let mut pixels = Vec::with_capacity((dst_w * dst_h) as usize);
        for v in 0..dst_h {
            let sy = (((2 * v + 1) * src_h) / (2 * dst_h)).min(src_h - 1) as u32;
            let row = self.row(sy);
            for u in 0..dst_w {
                let sx = (((2 * u + 1) * src_w) / (2 * dst_w)).min(src_w - 1) as usize;
                pixels.push(row[sx]);
            }
        }
        PreviewImage::new(dst_w as u32, dst_h as u32, pixels)
    }
}

fn allocate(size: OutputSize) -> crate::Result<(usize, Vec<u8>)> {
    let (width, height) = (size.width(), size.height());
    let stride = stride_for(width).ok_or(RenderError::InvalidDimensions { width, height })?;
    let bytes = stride
        .checked_mul(height as usize)
        .ok_or(RenderError::InvalidDimensions { width, height })?;

    let mut data = Vec::new();
    data.try_reserve_exact(bytes)
        .map_err(|source| RenderError::Allocation {
            width,
            height,
            bytes,
            source,
        })?;
    data.resize(bytes, 0);
    Ok((stride, data))
}
