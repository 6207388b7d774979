/// A run of consecutive output rows computed by one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBand {
    /// First row of the band.
    pub y: u32,
    /// Number of rows (may be smaller for the last band).
    pub height: u32,
}

impl RowBand {
    /// Rows covered by this band.
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.y..self.y + self.height
    }

    /// Number of pixels in the band for an output `width` pixels wide.
    pub fn pixel_count(&self, width: u32) -> usize {
        self.height as usize * width as usize
    }
}

/// Split `height` rows into bands of at most `band_rows` rows each.
///
/// Bands are disjoint and together cover every row exactly once, so row
/// tasks never touch each other's pixels.
pub fn build_row_bands(height: u32, band_rows: u32) -> Vec<RowBand> {
    let band_rows = band_rows.max(1);
    let mut bands = Vec::with_capacity(height.div_ceil(band_rows) as usize);
    let mut y = 0;
    while y < height {
        let h = band_rows.min(height - y);
        bands.push(RowBand { y, height: h });
        y += h;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_row_bands_by_default() {
        let bands = build_row_bands(5, 1);
        assert_eq!(bands.len(), 5);
        for (i, band) in bands.iter().enumerate() {
            assert_eq!(*band, RowBand { y: i as u32, height: 1 });
        }
    }

    #[test]
    fn bands_cover_every_row_once() {
        for (height, band_rows) in [(150, 16), (64, 64), (7, 3), (1, 8)] {
            let bands = build_row_bands(height, band_rows);
            let mut covered = vec![false; height as usize];
            for band in &bands {
                assert!(band.height >= 1 && band.height <= band_rows);
                for row in band.rows() {
                    assert!(!covered[row as usize], "row {row} covered twice");
                    covered[row as usize] = true;
                }
            }
            assert!(covered.iter().all(|&c| c), "all rows must be covered");
        }
    }

    #[test]
    fn last_band_is_truncated() {
        let bands = build_row_bands(10, 4);
        assert_eq!(bands.last(), Some(&RowBand { y: 8, height: 2 }));
        assert_eq!(bands[0].pixel_count(3), 12);
    }

    #[test]
    fn zero_band_rows_is_treated_as_one() {
        assert_eq!(build_row_bands(3, 0).len(), 3);
    }
}
