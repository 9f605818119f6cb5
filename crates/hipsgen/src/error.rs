//! Error types for the tiling tool driver.

use hips_common::HipsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running `hipsgen` or reading its output.
#[derive(Error, Debug)]
pub enum HipsgenError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hipsgen did not finish within {secs}s and was killed")]
    Timeout { secs: u64 },

    #[error("cannot use report file {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unparseable hipsgen report: {0}")]
    ReportParse(String),

    #[error("hipsgen produced no overview tile at {}", .0.display())]
    MissingOverview(PathBuf),

    #[error("cannot scan tile directory {}: {message}", path.display())]
    Layout { path: PathBuf, message: String },

    #[error("failed waiting for hipsgen: {0}")]
    Wait(#[source] std::io::Error),
}

impl HipsgenError {
    pub fn report_parse(msg: impl Into<String>) -> Self {
        Self::ReportParse(msg.into())
    }
}

impl From<HipsgenError> for HipsError {
    fn from(err: HipsgenError) -> Self {
        HipsError::ExternalTool(err.to_string())
    }
}

/// Result type for hipsgen operations.
pub type Result<T> = std::result::Result<T, HipsgenError>;
