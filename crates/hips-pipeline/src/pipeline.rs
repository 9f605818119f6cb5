//! One map, end to end.

use healpix_fits::{read_map, write_map, HealpixMap, TileImage};
use hips_common::{
    fs, log_debug, log_info, log_trace, HipsError, HipsResult, IoResultExt, Logger, MapJob,
};
use hipsgen::{color_map_stamp, png_path_for, staging_dir, TileGenerator, TileManifest};
use map_processor::{normalize_with_stats, ClipRange, Mask};
use rayon::prelude::*;
use renderer::ColorMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinError;

/// Coordinate system written into normalized maps.
pub const NORMALIZED_COORDSYS: &str = "C";

/// What processing one job produced.
#[derive(Debug, Clone)]
pub struct ProcessedJob {
    pub job: MapJob,
    pub normalized_path: PathBuf,
    pub tiles_dir: PathBuf,
    pub manifest: TileManifest,
    /// `false` when an existing tile directory was reused.
    pub tiles_generated: bool,
    pub images_written: usize,
    pub images_skipped: usize,
    pub clip: ClipRange,
}

/// Read, normalize, tile and colorize one map.
pub struct MapPipeline {
    generator: Arc<dyn TileGenerator>,
    logger: Arc<dyn Logger>,
}

impl MapPipeline {
    pub fn new(generator: Arc<dyn TileGenerator>, logger: Arc<dyn Logger>) -> Self {
        Self { generator, logger }
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Run every step for `job`, writing below `output_root`.
    ///
    /// Reruns are cheap: an existing tile directory is reused without
    /// invoking the generator, and existing PNGs are left alone as long as
    /// they were drawn with the job's color map.
    pub async fn process(&self, job: &MapJob, output_root: &Path) -> HipsResult<ProcessedJob> {
        job.validate()?;
        let cmap = ColorMap::by_name(&job.color_map)
            .map_err(|e| HipsError::config(format!("map '{}': {}", job.tag, e)))?;

        let normalized_path = job.normalized_path(output_root)?;
        let clip = self.normalize_to(job, &normalized_path)?;

        let tiles_dir = output_root.join(job.tiles_dir_name()?);
        let (manifest, tiles_generated) = self.ensure_tiles(job, &normalized_path, &tiles_dir).await?;

        self.match_color_map(job, &manifest, &cmap).await?;
        let (images_written, images_skipped) = self.colorize_tiles(&manifest, cmap).await?;
        log_info!(
            self.logger,
            "map '{}': {} tile images written, {} already present",
            job.tag,
            images_written,
            images_skipped
        );

        Ok(ProcessedJob {
            job: job.clone(),
            normalized_path,
            tiles_dir,
            manifest,
            tiles_generated,
            images_written,
            images_skipped,
            clip,
        })
    }

    fn normalize_to(&self, job: &MapJob, target: &Path) -> HipsResult<ClipRange> {
        log_info!(self.logger, "map '{}': reading {}", job.tag, job.source.display());
        let map = read_input(&job.source)?;

        let mask = match &job.mask {
            Some(mask_path) => {
                log_debug!(self.logger, "map '{}': reading mask {}", job.tag, mask_path.display());
                Some(Mask::from_map(&read_input(mask_path)?))
            }
            None => None,
        };

        let normalized = normalize_with_stats(map.values(), mask.as_ref(), job.low_sigma, job.high_sigma)
            .map_err(HipsError::from)?;

        log_info!(
            self.logger,
            "map '{}': clipped range [{}, {}] after {} rounds, {} pixels kept",
            job.tag,
            normalized.range.min,
            normalized.range.max,
            normalized.range.rounds,
            normalized.range.survivors
        );

        let output = map
            .with_values(normalized.values)
            .map_err(HipsError::from)?
            .with_coordsys(NORMALIZED_COORDSYS);
        write_map(target, &output)?;
        log_debug!(self.logger, "map '{}': wrote {}", job.tag, target.display());
        Ok(normalized.range)
    }

    async fn ensure_tiles(
        &self,
        job: &MapJob,
        normalized_path: &Path,
        tiles_dir: &Path,
    ) -> HipsResult<(TileManifest, bool)> {
        if tiles_dir.exists() {
            log_info!(
                self.logger,
                "map '{}': reusing existing tiles in {}",
                job.tag,
                tiles_dir.display()
            );
            return Ok((TileManifest::scan(tiles_dir)?, false));
        }

        let staging = staging_dir(tiles_dir);
        if staging.exists() {
            log_info!(
                self.logger,
                "map '{}': removing incomplete tiles in {}",
                job.tag,
                staging.display()
            );
            tokio::fs::remove_dir_all(&staging).await.at_path(&staging)?;
        }

        self.generator.generate_tiles(normalized_path, &staging).await?;
        tokio::fs::rename(&staging, tiles_dir).await.at_path(tiles_dir)?;
        Ok((TileManifest::scan(tiles_dir)?, true))
    }

    /// Colorize every tile that has no PNG yet. Returns (written, skipped).
    async fn colorize_tiles(&self, manifest: &TileManifest, cmap: ColorMap) -> HipsResult<(usize, usize)> {
        let tiles: Vec<PathBuf> = manifest.tiles().map(Path::to_path_buf).collect();
        let logger = Arc::clone(&self.logger);

        let written = tokio::task::spawn_blocking(move || {
            tiles
                .par_iter()
                .map(|tile| colorize_tile(tile, &cmap, logger.as_ref()))
                .collect::<HipsResult<Vec<bool>>>()
        })
        .await;
        let written = join_blocking(written, "tile colorization")?;

        let count = written.iter().filter(|w| **w).count();
        Ok((count, written.len() - count))
    }

    /// Make the PNGs in the tile directory match `cmap`.
    ///
    /// When the stamp names another color map, or is missing, every PNG is
    /// removed before the stamp is rewritten, so an interrupted rerun never
    /// leaves images of two color maps behind.
    async fn match_color_map(&self, job: &MapJob, manifest: &TileManifest, cmap: &ColorMap) -> HipsResult<()> {
        let stamp = color_map_stamp(&manifest.tiles_dir);
        let previous = match tokio::fs::read_to_string(&stamp).await {
            Ok(name) => Some(name.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(HipsError::filesystem(&stamp, e)),
        };
        if previous.as_deref() == Some(cmap.name()) {
            return Ok(());
        }

        let pngs: Vec<PathBuf> = manifest.tiles().map(png_path_for).collect();
        let removed = tokio::task::spawn_blocking(move || remove_existing(&pngs)).await;
        let removed = join_blocking(removed, "stale tile image removal")?;
        if removed > 0 {
            log_info!(
                self.logger,
                "map '{}': color map changed from {} to {}, removed {} tile images",
                job.tag,
                previous.as_deref().unwrap_or("unknown"),
                cmap.name(),
                removed
            );
        }
        fs::write_atomic(&stamp, cmap.name().as_bytes())
    }
}

fn remove_existing(paths: &[PathBuf]) -> HipsResult<usize> {
    let mut removed = 0;
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(HipsError::filesystem(path, e)),
        }
    }
    Ok(removed)
}

/// Result of a blocking task. A panic inside the task is resumed on the
/// caller's thread.
fn join_blocking<T>(joined: Result<HipsResult<T>, JoinError>, task: &str) -> HipsResult<T> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(HipsError::input_data(format!("{} task did not complete: {}", task, e))),
    }
}

/// Write `<tile>.png` unless it exists. Returns whether a file was written.
pub fn colorize_tile(tile: &Path, cmap: &ColorMap, logger: &dyn Logger) -> HipsResult<bool> {
    let png_path = png_path_for(tile);
    if png_path.exists() {
        return Ok(false);
    }

    let image = TileImage::read(tile)
        .map_err(|e| HipsError::input_data(format!("tile {}: {}", tile.display(), e)))?;
    let png = renderer::render_png(&image.data, image.width, image.height, cmap)
        .map_err(|e| HipsError::input_data(format!("tile {}: {}", tile.display(), e)))?;
    fs::write_atomic(&png_path, &png)?;
    log_trace!(logger, "wrote {}", png_path.display());
    Ok(true)
}

fn read_input(path: &Path) -> HipsResult<HealpixMap> {
    read_map(path).map_err(|e| HipsError::input_data(format!("{}: {}", path.display(), e)))
}
