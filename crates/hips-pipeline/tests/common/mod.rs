//! Scripted tile generator shared by the pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hips_common::{HipsError, HipsResult};
use hipsgen::{PixelRange, TileGenerator};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DETAIL_TILES: usize = 3;
pub const TILE_SIZE: usize = 16;

/// Writes a small fake tile tree instead of running `hipsgen`.
#[derive(Default)]
pub struct FakeTileGenerator {
    probes: AtomicUsize,
    generations: AtomicUsize,
    fail_generate: bool,
    out_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeTileGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose second pass always fails.
    pub fn failing() -> Self {
        Self {
            fail_generate: true,
            ..Self::default()
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn generations(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.probes() + self.generations()
    }

    pub fn out_dirs(&self) -> Vec<PathBuf> {
        self.out_dirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TileGenerator for FakeTileGenerator {
    async fn probe(&self, _source: &Path, out_dir: &Path) -> HipsResult<PixelRange> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.out_dirs.lock().unwrap().push(out_dir.to_path_buf());
        Ok(PixelRange::new(0.0, 1.0)?)
    }

    async fn generate(&self, _source: &Path, out_dir: &Path, _range: PixelRange) -> HipsResult<()> {
        self.generations.fetch_add(1, Ordering::SeqCst);
        if self.fail_generate {
            // Leave a half-written tree behind, like an interrupted run.
            std::fs::create_dir_all(out_dir.join("Norder3")).unwrap();
            return Err(HipsError::external_tool("hipsgen exited with status 1"));
        }
        test_utils::write_fake_tile_tree(out_dir, DETAIL_TILES, TILE_SIZE);
        Ok(())
    }
}
