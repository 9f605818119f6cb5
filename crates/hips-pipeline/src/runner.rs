//! Batch execution of a run configuration.

use hips_common::{
    fs, log_error, log_info, log_warn, HipsError, HipsResult, JobErrorPolicy, Logger, RunConfig,
};
use hipsgen::TileGenerator;
use std::path::Path;
use std::sync::Arc;

use crate::homepage::{write_index_pages, IndexLayer, LoadedTemplates};
use crate::pipeline::MapPipeline;
use crate::summary::{JobFailure, JobOutcome, RunSummary};

/// Full validation of a run configuration: structure plus color map names.
pub fn validate_config(config: &RunConfig) -> HipsResult<()> {
    config.validate()?;
    for job in &config.jobs {
        if !renderer::is_registered(&job.color_map) {
            return Err(HipsError::config(format!(
                "map '{}': unknown color map '{}' (available: {})",
                job.tag,
                job.color_map,
                renderer::available().join(", ")
            )));
        }
    }
    Ok(())
}

/// Runs every job of a configuration, one at a time, in order.
pub struct JobRunner {
    pipeline: MapPipeline,
    logger: Arc<dyn Logger>,
}

impl JobRunner {
    pub fn new(generator: Arc<dyn TileGenerator>, logger: Arc<dyn Logger>) -> Self {
        Self {
            pipeline: MapPipeline::new(generator, Arc::clone(&logger)),
            logger,
        }
    }

    /// Process `config`.
    ///
    /// Returns `Err` for run-fatal errors (configuration, the output root)
    /// and, under [`JobErrorPolicy::Abort`], for the first failed job. Under
    /// the default policy failed jobs are only recorded in the summary.
    pub async fn run(&self, config: &RunConfig) -> HipsResult<RunSummary> {
        validate_config(config)?;
        let templates = config.pages.as_ref().map(LoadedTemplates::load).transpose()?;

        let output_root = config.output_dir.as_path();
        prepare_output_root(output_root, config.fresh_run)?;

        let mut summary = RunSummary::start();
        log_info!(
            self.logger,
            "processing {} maps into {}",
            config.jobs.len(),
            output_root.display()
        );

        for job in &config.jobs {
            match self.pipeline.process(job, output_root).await {
                Ok(processed) => summary.succeeded.push(JobOutcome::from(&processed)),
                Err(err) => {
                    log_error!(
                        self.logger,
                        "map '{}' ({}) failed: {}",
                        job.tag,
                        job.source.display(),
                        err
                    );
                    summary.failed.push(JobFailure::new(job, &err));

                    if config.on_job_error == JobErrorPolicy::Abort {
                        summary.aborted = true;
                        self.finish(&mut summary, output_root);
                        return Err(err);
                    }
                }
            }
        }

        let pages = match &templates {
            Some(templates) => self.write_pages(&summary, output_root, templates),
            None => Ok(()),
        };

        // The summary is written even when the index pages are not.
        self.finish(&mut summary, output_root);
        pages?;
        Ok(summary)
    }

    fn write_pages(
        &self,
        summary: &RunSummary,
        output_root: &Path,
        templates: &LoadedTemplates,
    ) -> HipsResult<()> {
        let layers: Vec<IndexLayer> = summary
            .succeeded
            .iter()
            .filter_map(|outcome| {
                let dir = outcome.tiles_dir.file_name()?.to_string_lossy().into_owned();
                Some(IndexLayer::new(outcome.tag.clone(), dir))
            })
            .collect();
        write_index_pages(output_root, &layers, templates, self.logger.as_ref()).map_err(|err| {
            log_error!(self.logger, "could not write index pages: {}", err);
            err
        })?;
        Ok(())
    }

    fn finish(&self, summary: &mut RunSummary, output_root: &Path) {
        summary.finish();
        match summary.write(output_root) {
            Ok(path) => log_info!(self.logger, "wrote {}", path.display()),
            Err(err) => log_warn!(self.logger, "could not write run summary: {}", err),
        }
        log_info!(
            self.logger,
            "run finished: {} succeeded, {} failed",
            summary.succeeded.len(),
            summary.failed.len()
        );
    }
}

fn prepare_output_root(output_root: &Path, fresh_run: bool) -> HipsResult<()> {
    if fresh_run && output_root.exists() {
        return Err(HipsError::filesystem(
            output_root,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "output directory exists and fresh_run is set",
            ),
        ));
    }
    fs::ensure_dir(output_root)
}
