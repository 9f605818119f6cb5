//! Error types for FITS decoding.

use hips_common::HipsError;
use thiserror::Error;

/// Errors raised while decoding FITS content.
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("failed to read FITS file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file ended before {0} was complete")]
    UnexpectedEof(&'static str),

    #[error("invalid FITS header: {0}")]
    InvalidHeader(String),

    #[error("missing required keyword {0}")]
    MissingKeyword(String),

    #[error("unsupported FITS layout: {0}")]
    Unsupported(String),

    #[error("{npix} pixels is not a valid HEALPix map size (12 * nside^2)")]
    InvalidPixelCount { npix: usize },
}

impl FitsError {
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

impl From<FitsError> for HipsError {
    fn from(err: FitsError) -> Self {
        HipsError::InputData(err.to_string())
    }
}

/// Result type for FITS operations.
pub type Result<T> = std::result::Result<T, FitsError>;
