//! Error types for rendering.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("unknown color map '{name}' (available: {available})")]
    UnknownColorMap { name: String, available: String },

    #[error("{values} values do not fill a {width}x{height} image")]
    DimensionMismatch {
        values: usize,
        width: usize,
        height: usize,
    },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
