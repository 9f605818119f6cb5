//! End-to-end processing of single maps with a scripted tile generator.

mod common;

use common::{FakeTileGenerator, DETAIL_TILES, TILE_SIZE};
use hips_common::{ErrorKind, LogLevel, Logger, MapJob, MemoryLogger, NoOpLogger};
use hips_pipeline::MapPipeline;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use test_utils::{assert_approx_eq, ramp_values, ramp_with_outliers, write_test_map};
use walkdir::WalkDir;

fn pipeline(generator: &Arc<FakeTileGenerator>) -> MapPipeline {
    let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
    MapPipeline::new(generator.clone(), logger)
}

fn snapshot(dir: &Path) -> BTreeMap<String, (Vec<u8>, SystemTime)> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let key = e.path().strip_prefix(dir).unwrap().display().to_string();
            let bytes = std::fs::read(e.path()).unwrap();
            let mtime = e.metadata().unwrap().modified().unwrap();
            (key, (bytes, mtime))
        })
        .collect()
}

#[tokio::test]
async fn test_process_writes_normalized_map_tiles_and_images() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "kappaE.fits", ramp_with_outliers(4, 1.0e6));

    let generator = Arc::new(FakeTileGenerator::new());
    let job = MapJob::new(&source, "KappaE", "planck-like");
    let processed = pipeline(&generator).process(&job, output.path()).await.unwrap();

    assert_eq!(generator.probes(), 1);
    assert_eq!(generator.generations(), 1);
    assert!(processed.tiles_generated);

    // Normalized map: same size, unit interval, equatorial frame.
    assert_eq!(processed.normalized_path, output.path().join("kappaE.fits"));
    let normalized = healpix_fits::read_map(&processed.normalized_path).unwrap();
    assert_eq!(normalized.nside(), 4);
    assert_eq!(normalized.coordsys(), Some("C"));
    assert!(normalized.values().iter().all(|v| (0.0..=1.0).contains(v)));
    assert!(processed.clip.max < 1.0e6);

    // Tiles were generated into a staging directory and moved into place.
    assert_eq!(processed.tiles_dir, output.path().join("kappaE.fitsHiPS"));
    assert!(!output.path().join("kappaE.fitsHiPS.partial").exists());
    assert!(generator.out_dirs()[0].ends_with("kappaE.fitsHiPS.partial"));
    assert_eq!(processed.manifest.tile_count(), 1 + DETAIL_TILES);

    assert_eq!(processed.images_written, 1 + DETAIL_TILES);
    assert_eq!(processed.images_skipped, 0);
    for tile in processed.manifest.tiles() {
        let png = image::open(tile.with_extension("png")).unwrap();
        assert_eq!(png.width() as usize, TILE_SIZE);
        assert_eq!(png.height() as usize, TILE_SIZE);
    }
}

#[tokio::test]
async fn test_rerun_reuses_tiles_without_touching_them() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "kappaB.fits", ramp_values(2));
    let job = MapJob::new(&source, "KappaB", "viridis");

    let generator = Arc::new(FakeTileGenerator::new());
    let first = pipeline(&generator).process(&job, output.path()).await.unwrap();
    let before = snapshot(&first.tiles_dir);
    let calls = generator.calls();

    let second = pipeline(&generator).process(&job, output.path()).await.unwrap();

    assert_eq!(generator.calls(), calls);
    assert!(!second.tiles_generated);
    assert_eq!(second.images_written, 0);
    assert_eq!(second.images_skipped, 1 + DETAIL_TILES);
    assert_eq!(second.manifest, first.manifest);
    assert_eq!(snapshot(&second.tiles_dir), before);
}

#[tokio::test]
async fn test_interrupted_colorization_resumes() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "map.fits", ramp_values(2));
    let job = MapJob::new(&source, "Map", "gray");

    let generator = Arc::new(FakeTileGenerator::new());
    let first = pipeline(&generator).process(&job, output.path()).await.unwrap();

    let removed = first.manifest.details[1].with_extension("png");
    std::fs::remove_file(&removed).unwrap();

    let second = pipeline(&generator).process(&job, output.path()).await.unwrap();
    assert_eq!(second.images_written, 1);
    assert_eq!(second.images_skipped, DETAIL_TILES);
    assert!(removed.exists());
}

#[tokio::test]
async fn test_changed_color_map_redraws_every_image() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "map.fits", ramp_values(2));

    let generator = Arc::new(FakeTileGenerator::new());
    let first = pipeline(&generator)
        .process(&MapJob::new(&source, "Map", "gray"), output.path())
        .await
        .unwrap();
    let allsky = first.tiles_dir.join("Norder3/Allsky.png");
    let gray = std::fs::read(&allsky).unwrap();

    let recolored = MapJob::new(&source, "Map", "planck-like");
    let second = pipeline(&generator).process(&recolored, output.path()).await.unwrap();
    assert!(!second.tiles_generated);
    assert_eq!(second.images_written, 1 + DETAIL_TILES);
    assert_eq!(second.images_skipped, 0);
    assert_ne!(std::fs::read(&allsky).unwrap(), gray);
    assert_eq!(
        std::fs::read_to_string(second.tiles_dir.join(".colormap")).unwrap(),
        "planck-like"
    );

    let third = pipeline(&generator).process(&recolored, output.path()).await.unwrap();
    assert_eq!(third.images_written, 0);
    assert_eq!(third.images_skipped, 1 + DETAIL_TILES);
}

#[tokio::test]
async fn test_images_without_color_map_record_are_redrawn() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "map.fits", ramp_values(2));
    let job = MapJob::new(&source, "Map", "hot");

    let generator = Arc::new(FakeTileGenerator::new());
    let first = pipeline(&generator).process(&job, output.path()).await.unwrap();
    std::fs::remove_file(first.tiles_dir.join(".colormap")).unwrap();

    let logger = Arc::new(MemoryLogger::new());
    let shared: Arc<dyn Logger> = logger.clone();
    let second = MapPipeline::new(generator.clone(), shared)
        .process(&job, output.path())
        .await
        .unwrap();
    assert_eq!(second.images_written, 1 + DETAIL_TILES);
    assert!(logger
        .messages_at(LogLevel::Info)
        .iter()
        .any(|m| m.contains("from unknown to hot")));
}

#[tokio::test]
async fn test_failed_generation_leaves_no_tile_directory() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "map.fits", ramp_values(2));
    let job = MapJob::new(&source, "Map", "gray");

    let failing = Arc::new(FakeTileGenerator::failing());
    let err = pipeline(&failing).process(&job, output.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert!(!output.path().join("map.fitsHiPS").exists());
    assert!(output.path().join("map.fitsHiPS.partial").exists());

    // The next run discards the incomplete staging directory.
    let generator = Arc::new(FakeTileGenerator::new());
    let processed = pipeline(&generator).process(&job, output.path()).await.unwrap();
    assert!(processed.tiles_generated);
    assert!(!output.path().join("map.fitsHiPS.partial").exists());
    assert!(processed.tiles_dir.join("Norder3/Allsky.png").exists());
}

#[tokio::test]
async fn test_masked_pixels_take_minimum_value() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let npix = test_utils::npix(2);
    let values = ramp_values(2);
    let mask: Vec<f64> = (0..npix).map(|i| if i < npix / 2 { 1.0 } else { 0.0 }).collect();
    let source = write_test_map(input.path(), "map.fits", values);
    let mask_path = write_test_map(input.path(), "mask.fits", mask);

    let generator = Arc::new(FakeTileGenerator::new());
    let job = MapJob::new(&source, "Map", "gray").with_mask(&mask_path);
    let processed = pipeline(&generator).process(&job, output.path()).await.unwrap();

    let normalized = healpix_fits::read_map(&processed.normalized_path).unwrap();
    let values = normalized.values();
    let in_mask_min = values[..npix / 2].iter().cloned().fold(f64::INFINITY, f64::min);
    assert_approx_eq!(in_mask_min, 0.0, 1e-6);
    for v in &values[npix / 2..] {
        assert_approx_eq!(*v, in_mask_min, 1e-6);
    }
}

#[tokio::test]
async fn test_degenerate_map_is_normalization_error() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "flat.fits", vec![5.0; 12]);

    let generator = Arc::new(FakeTileGenerator::new());
    let logger = Arc::new(MemoryLogger::new());
    let pipeline = MapPipeline::new(generator.clone(), logger.clone());
    let err = pipeline
        .process(&MapJob::new(&source, "Flat", "gray"), output.path())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Normalization);
    assert_eq!(generator.calls(), 0);
    assert!(!output.path().join("flat.fits").exists());
}

#[tokio::test]
async fn test_missing_source_is_input_data_error() {
    let output = tempfile::tempdir().unwrap();
    let generator = Arc::new(FakeTileGenerator::new());
    let job = MapJob::new(output.path().join("absent.fits"), "Absent", "gray");

    let err = pipeline(&generator).process(&job, output.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputData);
    assert!(err.to_string().contains("absent.fits"));
}

#[tokio::test]
async fn test_mask_with_wrong_size_is_input_data_error() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let source = write_test_map(input.path(), "map.fits", ramp_values(2));
    let mask = write_test_map(input.path(), "mask.fits", vec![1.0; 12]);

    let generator = Arc::new(FakeTileGenerator::new());
    let job = MapJob::new(&source, "Map", "gray").with_mask(&mask);
    let err = pipeline(&generator).process(&job, output.path()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputData);
}
