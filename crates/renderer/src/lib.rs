//! Image rendering for HiPS tiles.
//!
//! - Named color maps (`planck-like`, `viridis`, ... and `_r` reversals)
//! - Colorization of normalized single-band tiles
//! - Deterministic PNG encoding

pub mod colormap;
pub mod error;
pub mod gradient;
pub mod png;

pub use colormap::{available, is_registered, ColorMap};
pub use error::{RenderError, Result};
pub use gradient::{colorize, Color, RgbaImage};
pub use png::encode_png;

/// Colorize `values` and encode the result as PNG.
pub fn render_png(values: &[f32], width: usize, height: usize, cmap: &ColorMap) -> Result<Vec<u8>> {
    encode_png(&colorize(values, width, height, cmap)?)
}
