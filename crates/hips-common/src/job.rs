//! Run and job configuration records.
//!
//! These are the typed forms of the YAML run configuration. Loading and
//! environment expansion live in the `hips-builder` binary; everything here
//! is plain data plus structural validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HipsError, HipsResult};

/// Default sigma used for both clip thresholds.
pub const DEFAULT_CLIP_SIGMA: f64 = 3.0;

/// One map to publish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapJob {
    /// HEALPix map to publish.
    #[serde(rename = "filename")]
    pub source: PathBuf,

    /// Display name of the layer in the viewer.
    pub tag: String,

    /// Registered color map name (e.g. `planck-like`, `viridis_r`).
    #[serde(rename = "cmap")]
    pub color_map: String,

    /// Optional auxiliary map; pixels with a value above 0.99 are kept.
    #[serde(rename = "filename_mask", default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<PathBuf>,

    #[serde(default = "default_sigma")]
    pub low_sigma: f64,

    #[serde(default = "default_sigma")]
    pub high_sigma: f64,
}

fn default_sigma() -> f64 {
    DEFAULT_CLIP_SIGMA
}

impl MapJob {
    pub fn new(source: impl Into<PathBuf>, tag: impl Into<String>, color_map: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            tag: tag.into(),
            color_map: color_map.into(),
            mask: None,
            low_sigma: DEFAULT_CLIP_SIGMA,
            high_sigma: DEFAULT_CLIP_SIGMA,
        }
    }

    pub fn with_mask(mut self, mask: impl Into<PathBuf>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    pub fn with_sigmas(mut self, low_sigma: f64, high_sigma: f64) -> Self {
        self.low_sigma = low_sigma;
        self.high_sigma = high_sigma;
        self
    }

    /// File name of the source map. Output artifacts are namespaced by it.
    pub fn source_basename(&self) -> HipsResult<String> {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                HipsError::config(format!(
                    "map '{}': source path {} has no file name",
                    self.tag,
                    self.source.display()
                ))
            })
    }

    /// Where the normalized map is written under `output_root`.
    pub fn normalized_path(&self, output_root: &Path) -> HipsResult<PathBuf> {
        Ok(output_root.join(self.source_basename()?))
    }

    /// Name of the tile directory, relative to `output_root`.
    pub fn tiles_dir_name(&self) -> HipsResult<String> {
        Ok(format!("{}HiPS", self.source_basename()?))
    }

    /// Structural checks that need no other crate.
    pub fn validate(&self) -> HipsResult<()> {
        if self.tag.trim().is_empty() {
            return Err(HipsError::config(format!(
                "map {}: tag must not be empty",
                self.source.display()
            )));
        }
        if self.color_map.trim().is_empty() {
            return Err(HipsError::config(format!("map '{}': cmap must not be empty", self.tag)));
        }
        for (name, sigma) in [("low_sigma", self.low_sigma), ("high_sigma", self.high_sigma)] {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(HipsError::config(format!(
                    "map '{}': {} must be a positive number, got {}",
                    self.tag, name, sigma
                )));
            }
        }
        self.source_basename()?;
        Ok(())
    }
}

/// What the runner does after a job fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobErrorPolicy {
    /// Log, record and move on to the next job.
    #[default]
    Continue,
    /// Stop the run at the first failed job.
    Abort,
}

/// Settings for the external `hipsgen` invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HipsgenSettings {
    /// Java launcher.
    pub java: PathBuf,
    /// Aladin jar providing `-hipsgen`.
    pub jar: PathBuf,
    /// Value for `-Xmx`.
    pub max_heap: String,
    /// Upper bound for a single invocation.
    pub timeout_secs: u64,
}

impl Default for HipsgenSettings {
    fn default() -> Self {
        Self {
            java: PathBuf::from("java"),
            jar: PathBuf::from("AladinBeta.jar"),
            max_heap: "16000m".to_string(),
            timeout_secs: 6 * 60 * 60,
        }
    }
}

impl HipsgenSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Index page templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTemplates {
    /// Single-viewer page template.
    pub template: PathBuf,
    /// Two-pane page template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_view_template: Option<PathBuf>,
}

/// Whole-run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "results_dirname")]
    pub output_dir: PathBuf,

    /// Refuse to reuse an existing output directory.
    #[serde(default)]
    pub fresh_run: bool,

    #[serde(default)]
    pub on_job_error: JobErrorPolicy,

    #[serde(default)]
    pub hipsgen: HipsgenSettings,

    #[serde(rename = "homepage", default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<PageTemplates>,

    #[serde(rename = "healpix_maps")]
    pub jobs: Vec<MapJob>,
}

impl RunConfig {
    pub fn new(output_dir: impl Into<PathBuf>, jobs: Vec<MapJob>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fresh_run: false,
            on_job_error: JobErrorPolicy::default(),
            hipsgen: HipsgenSettings::default(),
            pages: None,
            jobs,
        }
    }

    /// Structural validation: every job valid, tags unique, no two jobs
    /// sharing a normalized file or tile directory.
    pub fn validate(&self) -> HipsResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(HipsError::config("results_dirname must not be empty"));
        }
        if self.jobs.is_empty() {
            return Err(HipsError::config("healpix_maps must list at least one map"));
        }
        if self.hipsgen.timeout_secs == 0 {
            return Err(HipsError::config("hipsgen.timeout_secs must be greater than 0"));
        }

        let mut tags = HashSet::new();
        let mut basenames = HashSet::new();
        for job in &self.jobs {
            job.validate()?;
            if !tags.insert(job.tag.as_str()) {
                return Err(HipsError::config(format!("duplicate map tag '{}'", job.tag)));
            }
            let basename = job.source_basename()?;
            if !basenames.insert(basename.clone()) {
                return Err(HipsError::config(format!(
                    "map '{}': another map has the same file name '{}' and would share its output",
                    job.tag, basename
                )));
            }
        }
        Ok(())
    }
}
