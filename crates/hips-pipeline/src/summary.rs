//! Machine-readable record of a run.

use chrono::{DateTime, Utc};
use hips_common::{fs, HipsError, HipsResult, MapJob};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::pipeline::ProcessedJob;

pub const SUMMARY_FILE: &str = "run_summary.json";

/// A job that produced its tiles and images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub tag: String,
    pub source: PathBuf,
    pub normalized: PathBuf,
    pub tiles_dir: PathBuf,
    pub tiles: usize,
    pub tiles_generated: bool,
    pub images_written: usize,
    pub images_skipped: usize,
    pub clip_min: f64,
    pub clip_max: f64,
}

impl From<&ProcessedJob> for JobOutcome {
    fn from(processed: &ProcessedJob) -> Self {
        Self {
            tag: processed.job.tag.clone(),
            source: processed.job.source.clone(),
            normalized: processed.normalized_path.clone(),
            tiles_dir: processed.tiles_dir.clone(),
            tiles: processed.manifest.tile_count(),
            tiles_generated: processed.tiles_generated,
            images_written: processed.images_written,
            images_skipped: processed.images_skipped,
            clip_min: processed.clip.min,
            clip_max: processed.clip.max,
        }
    }
}

/// A job that failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub tag: String,
    pub source: PathBuf,
    /// One of `config`, `input_data`, `normalization`, `external_tool`,
    /// `filesystem`.
    pub kind: String,
    pub message: String,
}

impl JobFailure {
    pub fn new(job: &MapJob, error: &HipsError) -> Self {
        Self {
            tag: job.tag.clone(),
            source: job.source.clone(),
            kind: error.kind().as_str().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: Vec<JobOutcome>,
    pub failed: Vec<JobFailure>,
    /// Set when the abort policy stopped the run early.
    #[serde(default)]
    pub aborted: bool,
}

impl RunSummary {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            succeeded: Vec::new(),
            failed: Vec::new(),
            aborted: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.aborted
    }

    /// Process exit code for a run that completed: 0 when every job
    /// succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Write `run_summary.json` under `output_root`.
    pub fn write(&self, output_root: &Path) -> HipsResult<PathBuf> {
        let path = output_root.join(SUMMARY_FILE);
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| HipsError::config(format!("cannot serialize run summary: {}", e)))?;
        fs::write_atomic(&path, &json)?;
        Ok(path)
    }
}
