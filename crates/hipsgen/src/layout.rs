//! Tile directory layout produced by `hipsgen`.
//!
//! ```text
//! <tiles_dir>/
//! ├── properties
//! └── Norder3/
//!     ├── Allsky.fits        overview of the whole sky
//!     └── Dir0/
//!         ├── Npix0.fits     detail tiles
//!         └── ...
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{HipsgenError, Result};

/// Order whose tiles are colorized.
pub const TILE_ORDER: u32 = 3;

/// File name of the overview tile.
pub const OVERVIEW_FILE: &str = "Allsky.fits";

/// Directory holding the detail tiles of [`TILE_ORDER`].
pub const DETAIL_DIR: &str = "Dir0";

/// Suffix of the directory a run writes into before it is renamed into place.
pub const STAGING_SUFFIX: &str = ".partial";

/// File in the tile directory naming the color map its PNGs were drawn with.
pub const COLOR_MAP_STAMP: &str = ".colormap";

const FITS_EXTENSION: &str = "fits";
const PNG_EXTENSION: &str = "png";

/// `<tiles_dir>/Norder3`.
pub fn order_dir(tiles_dir: &Path) -> PathBuf {
    tiles_dir.join(format!("Norder{}", TILE_ORDER))
}

/// `<tiles_dir>.partial`: where tiles are generated so that `tiles_dir`
/// only ever appears complete.
pub fn staging_dir(tiles_dir: &Path) -> PathBuf {
    let mut name = tiles_dir.as_os_str().to_os_string();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// `<tiles_dir>/.colormap`.
pub fn color_map_stamp(tiles_dir: &Path) -> PathBuf {
    tiles_dir.join(COLOR_MAP_STAMP)
}

/// Path of the colorized image for `tile`: the file name's `.fits`
/// extension becomes `.png`, the directory part is untouched.
pub fn png_path_for(tile: &Path) -> PathBuf {
    tile.with_extension(PNG_EXTENSION)
}

/// The tiles to colorize for one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileManifest {
    pub tiles_dir: PathBuf,
    pub overview: PathBuf,
    /// Detail tiles in file-name order.
    pub details: Vec<PathBuf>,
}

impl TileManifest {
    /// Inspect an existing tile directory.
    ///
    /// A missing overview tile means the tiling tool failed.
    pub fn scan(tiles_dir: &Path) -> Result<Self> {
        let order_dir = order_dir(tiles_dir);
        let overview = order_dir.join(OVERVIEW_FILE);
        if !overview.is_file() {
            return Err(HipsgenError::MissingOverview(overview));
        }

        let detail_dir = order_dir.join(DETAIL_DIR);
        let mut details = Vec::new();
        if detail_dir.is_dir() {
            for entry in WalkDir::new(&detail_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| HipsgenError::Layout {
                    path: detail_dir.clone(),
                    message: e.to_string(),
                })?;
                let is_fits = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(FITS_EXTENSION));
                if entry.file_type().is_file() && is_fits {
                    details.push(entry.into_path());
                }
            }
        }

        Ok(Self {
            tiles_dir: tiles_dir.to_path_buf(),
            overview,
            details,
        })
    }

    /// Overview first, then the detail tiles.
    pub fn tiles(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.overview.as_path()).chain(self.details.iter().map(PathBuf::as_path))
    }

    /// Number of tiles, overview included.
    pub fn tile_count(&self) -> usize {
        1 + self.details.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_path_for() {
        assert_eq!(
            png_path_for(Path::new("/out/map.fitsHiPS/Norder3/Dir0/Npix12.fits")),
            PathBuf::from("/out/map.fitsHiPS/Norder3/Dir0/Npix12.png")
        );
        // Only the file name changes, even when a directory contains ".fits".
        assert_eq!(
            png_path_for(Path::new("a.fits/Allsky.fits")),
            PathBuf::from("a.fits/Allsky.png")
        );
    }

    #[test]
    fn test_color_map_stamp_is_inside_tiles_dir() {
        assert_eq!(
            color_map_stamp(Path::new("/out/map.fitsHiPS")),
            PathBuf::from("/out/map.fitsHiPS/.colormap")
        );
    }

    #[test]
    fn test_staging_dir() {
        assert_eq!(
            staging_dir(Path::new("/out/map.fitsHiPS")),
            PathBuf::from("/out/map.fitsHiPS.partial")
        );
    }

    #[test]
    fn test_scan_missing_overview() {
        let dir = tempfile::tempdir().unwrap();
        let err = TileManifest::scan(dir.path()).unwrap_err();
        assert!(matches!(err, HipsgenError::MissingOverview(_)));
    }

    #[test]
    fn test_scan_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let order = order_dir(dir.path());
        let detail = order.join(DETAIL_DIR);
        std::fs::create_dir_all(&detail).unwrap();
        std::fs::write(order.join(OVERVIEW_FILE), b"x").unwrap();
        for name in ["Npix2.fits", "Npix10.fits", "Npix1.fits", "Npix1.png", "notes.txt"] {
            std::fs::write(detail.join(name), b"x").unwrap();
        }

        let manifest = TileManifest::scan(dir.path()).unwrap();
        let names: Vec<_> = manifest
            .details
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Npix1.fits", "Npix10.fits", "Npix2.fits"]);
        assert_eq!(manifest.tile_count(), 4);
        assert_eq!(manifest.tiles().next(), Some(manifest.overview.as_path()));
    }

    #[test]
    fn test_scan_without_detail_dir() {
        let dir = tempfile::tempdir().unwrap();
        let order = order_dir(dir.path());
        std::fs::create_dir_all(&order).unwrap();
        std::fs::write(order.join(OVERVIEW_FILE), b"x").unwrap();
        let manifest = TileManifest::scan(dir.path()).unwrap();
        assert!(manifest.details.is_empty());
    }
}
