//! `hipsgen` run as a child process.

use async_trait::async_trait;
use hips_common::{log_debug, log_info, log_warn, HipsResult, HipsgenSettings, Logger};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::error::{HipsgenError, Result};
use crate::generator::TileGenerator;
use crate::layout::STAGING_SUFFIX;
use crate::report::{parse_pixel_range, PixelRange};

/// Which of the two passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Probe,
    Final,
}

impl Pass {
    fn label(&self) -> &'static str {
        match self {
            Pass::Probe => "probe",
            Pass::Final => "final",
        }
    }
}

/// Runs `java -jar <jar> -hipsgen` with an explicit argument vector.
///
/// Console output of both passes goes to a report file next to the tile
/// directory (see [`HipsgenCli::report_path`]).
pub struct HipsgenCli {
    settings: HipsgenSettings,
    logger: Arc<dyn Logger>,
}

impl HipsgenCli {
    pub fn new(settings: HipsgenSettings, logger: Arc<dyn Logger>) -> Self {
        Self { settings, logger }
    }

    pub fn settings(&self) -> &HipsgenSettings {
        &self.settings
    }

    /// `<parent>/<tiles dir name>.hipsgen.log` for a tile directory. A
    /// staging directory shares the report of its final directory.
    pub fn report_path(out_dir: &Path) -> PathBuf {
        let name = out_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tiles".to_string());
        let name = name.strip_suffix(STAGING_SUFFIX).unwrap_or(&name);
        let parent = out_dir.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}.hipsgen.log", name))
    }

    /// Argument vector after the program name.
    pub fn arguments(&self, source: &Path, out_dir: &Path, range: Option<PixelRange>) -> Vec<OsString> {
        let mut input = OsString::from("in=");
        input.push(source);
        let mut output = OsString::from("out=");
        output.push(out_dir);

        let mut args = vec![
            OsString::from(format!("-Xmx{}", self.settings.max_heap)),
            OsString::from("-jar"),
            self.settings.jar.clone().into_os_string(),
            OsString::from("-hipsgen"),
            input,
            output,
        ];
        if let Some(range) = range {
            args.push(OsString::from(format!("pixelCut={}", range.pixel_cut())));
        }
        args
    }

    async fn run(&self, pass: Pass, source: &Path, out_dir: &Path, range: Option<PixelRange>) -> Result<PathBuf> {
        let report_path = Self::report_path(out_dir);
        let report = open_report(&report_path, pass)?;
        let report_err = report.try_clone().map_err(|source| HipsgenError::Report {
            path: report_path.clone(),
            source,
        })?;

        let args = self.arguments(source, out_dir, range);
        log_debug!(
            self.logger,
            "hipsgen {} pass: {} {:?}",
            pass.label(),
            self.settings.java.display(),
            args
        );

        let mut child = Command::new(&self.settings.java)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(report))
            .stderr(Stdio::from(report_err))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HipsgenError::Spawn {
                program: self.settings.java.display().to_string(),
                source,
            })?;

        let timeout = self.settings.timeout();
        let waited = tokio::time::timeout(timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status.map_err(HipsgenError::Wait)?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    log_warn!(self.logger, "failed to kill timed out hipsgen: {}", e);
                }
                return Err(HipsgenError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            log_warn!(
                self.logger,
                "hipsgen {} pass for {} exited with {} (report: {})",
                pass.label(),
                source.display(),
                status,
                report_path.display()
            );
        }
        Ok(report_path)
    }
}

/// The probe pass starts a fresh report; the final pass appends to it.
fn open_report(path: &Path, pass: Pass) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    match pass {
        Pass::Probe => options.write(true).truncate(true),
        Pass::Final => options.append(true),
    };
    options.open(path).map_err(|source| HipsgenError::Report {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl TileGenerator for HipsgenCli {
    async fn probe(&self, source: &Path, out_dir: &Path) -> HipsResult<PixelRange> {
        log_info!(self.logger, "probing pixel range of {}", source.display());
        let report_path = self.run(Pass::Probe, source, out_dir, None).await?;

        let report = tokio::fs::read(&report_path)
            .await
            .map_err(|source| HipsgenError::Report {
                path: report_path.clone(),
                source,
            })?;
        let range = parse_pixel_range(&String::from_utf8_lossy(&report)).map_err(|e| {
            HipsgenError::report_parse(format!("{} (report: {})", e, report_path.display()))
        })?;

        log_info!(self.logger, "pixel range of {}: {}", source.display(), range);
        Ok(range)
    }

    async fn generate(&self, source: &Path, out_dir: &Path, range: PixelRange) -> HipsResult<()> {
        log_info!(
            self.logger,
            "generating tiles for {} into {} (pixelCut={})",
            source.display(),
            out_dir.display(),
            range.pixel_cut()
        );
        self.run(Pass::Final, source, out_dir, Some(range)).await?;
        Ok(())
    }
}
