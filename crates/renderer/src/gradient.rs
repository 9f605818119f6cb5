//! Colorization of single-band tiles.

use rayon::prelude::*;

use crate::colormap::ColorMap;
use crate::error::{RenderError, Result};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Quantize `[r, g, b, a]` in [0, 1] with `round(c * 255)`.
    pub fn from_unit(rgba: [f32; 4]) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(q(rgba[0]), q(rgba[1]), q(rgba[2]), q(rgba[3]))
    }
}

/// An 8-bit RGBA raster, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        let i = (y * self.width + x) * 4;
        Color::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }
}

/// Color of a single value: NaN is transparent, everything else is
/// clamped to [0, 1] and looked up in `cmap`.
pub fn value_color(value: f32, cmap: &ColorMap) -> Color {
    if value.is_nan() {
        Color::transparent()
    } else {
        Color::from_unit(cmap.sample(value))
    }
}

/// Render `values` (row-major, `height` rows of `width`) through `cmap`.
///
/// FITS images store the bottom row first, so the output is flipped
/// vertically: input row `y` becomes output row `height - 1 - y`.
///
/// # Arguments
/// - `values`: normalized values, nominally in [0, 1]
/// - `width`: Number of columns
/// - `height`: Number of rows
/// - `cmap`: color map to sample
pub fn colorize(values: &[f32], width: usize, height: usize, cmap: &ColorMap) -> Result<RgbaImage> {
    if values.len() != width * height {
        return Err(RenderError::DimensionMismatch {
            values: values.len(),
            width,
            height,
        });
    }

    let mut pixels = vec![0u8; width * height * 4];
    if width == 0 || height == 0 {
        return Ok(RgbaImage { width, height, pixels });
    }

    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(out_row, row_pixels)| {
            let src_row = height - 1 - out_row;
            let src = &values[src_row * width..(src_row + 1) * width];
            for (value, pixel) in src.iter().zip(row_pixels.chunks_exact_mut(4)) {
                let color = value_color(*value, cmap);
                pixel.copy_from_slice(&[color.r, color.g, color.b, color.a]);
            }
        });

    Ok(RgbaImage { width, height, pixels })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planck() -> ColorMap {
        ColorMap::by_name("planck-like").unwrap()
    }

    #[test]
    fn test_from_unit_rounds() {
        assert_eq!(Color::from_unit([0.0, 0.5, 1.0, 1.0]), Color::new(0, 128, 255, 255));
        assert_eq!(Color::from_unit([0.67, 0.83, -1.0, 2.0]), Color::new(171, 212, 0, 255));
    }

    #[test]
    fn test_nan_is_transparent() {
        assert_eq!(value_color(f32::NAN, &planck()), Color::transparent());
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let cmap = planck();
        assert_eq!(value_color(-4.0, &cmap), value_color(0.0, &cmap));
        assert_eq!(value_color(9.0, &cmap), value_color(1.0, &cmap));
        assert_eq!(value_color(f32::INFINITY, &cmap), value_color(1.0, &cmap));
    }

    #[test]
    fn test_colorize_flips_rows() {
        // Row 0 (bottom in FITS) is 0.0, row 1 (top) is 1.0.
        let values = [0.0, 0.0, 1.0, 1.0];
        let image = colorize(&values, 2, 2, &planck()).unwrap();
        assert_eq!(image.pixel(0, 0), Color::new(128, 0, 0, 255));
        assert_eq!(image.pixel(1, 1), Color::new(0, 0, 128, 255));
    }

    #[test]
    fn test_colorize_rejects_wrong_length() {
        let err = colorize(&[0.0; 5], 2, 2, &planck()).unwrap_err();
        assert!(matches!(err, RenderError::DimensionMismatch { values: 5, .. }));
    }

    #[test]
    fn test_colorize_empty_image() {
        let image = colorize(&[], 0, 0, &planck()).unwrap();
        assert!(image.pixels.is_empty());
    }
}
