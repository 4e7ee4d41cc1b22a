//! Composition of sampled frames into a single grid image.

use image::{Rgb, RgbImage};

use crate::error::{CaptionError, Result};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A rows x cols arrangement with fixed pixel padding between cells.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    pub padding: u32,
}

impl GridLayout {
    pub(crate) fn new(rows: u32, cols: u32, padding: u32) -> Self {
        Self {
            rows,
            cols,
            padding,
        }
    }

    pub(crate) fn cell_count(&self) -> u32 {
        self.rows * self.cols
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(3, 3, 10)
    }
}

/// Paste `frames` into a white canvas laid out by `layout`, row-major.
///
/// Frames keep their native resolution; downscaling them measurably hurts
/// the keywords the model produces, so large sources yield large grids.
/// Cells past the end of `frames` stay white.
pub(crate) fn compose_grid(frames: &[RgbImage], layout: &GridLayout) -> Result<RgbImage> {
    let first = frames.first().ok_or(CaptionError::EmptySampleSet)?;
    let (cell_w, cell_h) = first.dimensions();

    for (index, frame) in frames.iter().enumerate() {
        let (w, h) = frame.dimensions();
        if (w, h) != (cell_w, cell_h) {
            return Err(CaptionError::MismatchedFrameSize {
                index,
                got_w: w,
                got_h: h,
                want_w: cell_w,
                want_h: cell_h,
            });
        }
    }

    let pad = layout.padding;
    let grid_w = cell_w * layout.cols + pad * (layout.cols - 1);
    let grid_h = cell_h * layout.rows + pad * (layout.rows - 1);
    let mut canvas = RgbImage::from_pixel(grid_w, grid_h, WHITE);

    for (idx, frame) in frames.iter().take(layout.cell_count() as usize).enumerate() {
        let row = idx as u32 / layout.cols;
        let col = idx as u32 % layout.cols;
        let x = col * (cell_w + pad);
        let y = row * (cell_h + pad);
        image::imageops::replace(&mut canvas, frame, i64::from(x), i64::from(y));
    }

    Ok(canvas)
}
