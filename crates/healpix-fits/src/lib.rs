//! Minimal FITS support for the HiPS publisher.
//!
//! Two shapes of file are handled:
//! - HEALPix maps: a binary table extension, one value per pixel
//! - tile images: a two-axis primary HDU, as written by `hipsgen`
//!
//! Anything else (compressed HDUs, partial-sky maps, cubes) is rejected
//! with [`FitsError::Unsupported`].

pub mod error;
pub mod header;
pub mod image;
pub mod map;

pub use error::{FitsError, Result};
pub use header::{Header, Value};
pub use image::TileImage;
pub use map::{is_unseen, npix_to_nside, HealpixMap, Ordering, UNSEEN};

use std::path::Path;

/// Read a HEALPix map from `path`.
pub fn read_map(path: impl AsRef<Path>) -> Result<HealpixMap> {
    HealpixMap::read(path)
}

/// Write `map` to `path` atomically, as single-precision values.
pub fn write_map(path: &Path, map: &HealpixMap) -> hips_common::HipsResult<()> {
    hips_common::fs::write_atomic(path, &map.to_fits_bytes())
}
