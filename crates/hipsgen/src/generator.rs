//! The tile generation seam.

use async_trait::async_trait;
use hips_common::HipsResult;
use std::path::Path;

use crate::layout::TileManifest;
use crate::report::PixelRange;

/// Something that turns a flat HEALPix map into a HiPS tile tree.
///
/// The production implementation is [`crate::HipsgenCli`]; tests script
/// their own.
#[async_trait]
pub trait TileGenerator: Send + Sync {
    /// First pass: find the pixel range of `source`.
    async fn probe(&self, source: &Path, out_dir: &Path) -> HipsResult<PixelRange>;

    /// Second pass: write the tiles for `source` into `out_dir`, cutting
    /// pixel values at `range`.
    async fn generate(&self, source: &Path, out_dir: &Path, range: PixelRange) -> HipsResult<()>;

    /// Probe, generate, then list what was produced.
    async fn generate_tiles(&self, source: &Path, out_dir: &Path) -> HipsResult<TileManifest> {
        let range = self.probe(source, out_dir).await?;
        self.generate(source, out_dir, range).await?;
        Ok(TileManifest::scan(out_dir)?)
    }
}
