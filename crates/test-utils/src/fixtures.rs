//! On-disk fixtures: map files, tile trees and page templates.

use std::path::{Path, PathBuf};

use healpix_fits::{HealpixMap, Ordering, TileImage};

use crate::generators::ramp_tile;

/// Minimal single-viewer page template.
pub const INDEX_TEMPLATE: &str = "<html><body><div id=\"aladin-lite-div\"></div>\n<script>\nvar aladin = A.aladin('#aladin-lite-div');\n$INSERT_MAP_CODE_HERE$\n</script></body></html>\n";

/// Minimal two-viewer page template.
pub const DOUBLE_INDEX_TEMPLATE: &str = "<html><body>\n<script>\n$INSERT_MAP_CODE_HERE$\n</script>\n<script>\n$INSERT_MAP_CODE_HERE_2$\n</script></body></html>\n";

/// Wrap `values` as a RING-ordered map.
///
/// Panics if `values.len()` is not a valid HEALPix size.
pub fn toy_map(values: Vec<f64>) -> HealpixMap {
    HealpixMap::new(values, Ordering::Ring).expect("toy map must have 12 * nside^2 pixels")
}

/// Write `values` as a map file at `dir/name` and return the path.
pub fn write_test_map(dir: &Path, name: &str, values: Vec<f64>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, toy_map(values).to_fits_bytes()).expect("failed to write test map");
    path
}

/// Write a tile tree shaped like `hipsgen` output under `tiles_dir`:
/// `Norder3/Allsky.fits` plus `detail_tiles` tiles in `Norder3/Dir0/`.
///
/// Returns the written tile paths, overview first.
pub fn write_fake_tile_tree(tiles_dir: &Path, detail_tiles: usize, tile_size: usize) -> Vec<PathBuf> {
    let order_dir = tiles_dir.join("Norder3");
    let detail_dir = order_dir.join("Dir0");
    std::fs::create_dir_all(&detail_dir).expect("failed to create tile directories");

    let tile = TileImage::new(tile_size, tile_size, ramp_tile(tile_size, tile_size))
        .expect("ramp tile has width * height pixels");
    let bytes = tile.to_fits_bytes();

    let mut written = vec![order_dir.join("Allsky.fits")];
    written.extend((0..detail_tiles).map(|i| detail_dir.join(format!("Npix{}.fits", i))));
    for path in &written {
        std::fs::write(path, &bytes).expect("failed to write tile");
    }
    std::fs::write(tiles_dir.join("properties"), "hips_order = 3\n").expect("failed to write properties");
    written
}

/// Write the page templates into `dir` and return their paths.
pub fn write_templates(dir: &Path) -> (PathBuf, PathBuf) {
    let single = dir.join("html_template.html");
    let double = dir.join("html_template_double.html");
    std::fs::write(&single, INDEX_TEMPLATE).expect("failed to write template");
    std::fs::write(&double, DOUBLE_INDEX_TEMPLATE).expect("failed to write template");
    (single, double)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::ramp_values;

    #[test]
    fn test_write_test_map_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_map(dir.path(), "ramp.fits", ramp_values(2));
        let map = healpix_fits::read_map(&path).unwrap();
        assert_eq!(map.nside(), 2);
        assert_eq!(map.values()[47], 47.0);
    }

    #[test]
    fn test_fake_tile_tree_layout() {
        let dir = tempfile::tempdir().unwrap();
        let tiles = write_fake_tile_tree(dir.path(), 3, 8);
        assert_eq!(tiles.len(), 4);
        assert!(dir.path().join("Norder3/Allsky.fits").exists());
        assert!(dir.path().join("Norder3/Dir0/Npix2.fits").exists());

        let tile = TileImage::read(&tiles[1]).unwrap();
        assert_eq!((tile.width, tile.height), (8, 8));
    }
}
