//! Error types for map normalization.

use hips_common::HipsError;
use thiserror::Error;

/// Errors that can occur while normalizing a map.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// No usable pixel is selected (empty input, empty mask, or only
    /// `UNSEEN`/NaN values under the mask).
    #[error("no usable pixels selected for normalization")]
    EmptySelection,

    /// All surviving pixels share one value, so the display range is empty.
    #[error("clipped range is degenerate: every surviving pixel equals {value}")]
    DegenerateRange { value: f64 },

    /// Mask and map differ in pixel count.
    #[error("mask has {mask} pixels but the map has {values}")]
    LengthMismatch { values: usize, mask: usize },

    /// A clip threshold is not a positive finite number.
    #[error("clip threshold {name} must be positive and finite, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

impl From<NormalizeError> for HipsError {
    fn from(err: NormalizeError) -> Self {
        match err {
            // A mask that does not fit the map is bad input, not a
            // statistics problem.
            NormalizeError::LengthMismatch { .. } => HipsError::InputData(err.to_string()),
            NormalizeError::InvalidThreshold { .. } => HipsError::Config(err.to_string()),
            _ => HipsError::Normalization(err.to_string()),
        }
    }
}

/// Result type for normalization.
pub type Result<T> = std::result::Result<T, NormalizeError>;
