//! Error types shared by every stage of the map publishing pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using HipsError.
pub type HipsResult<T> = Result<T, HipsError>;

/// Primary error type for map publishing.
///
/// The variants are the error *kinds* the runner reasons about: whether a
/// failure is confined to one job or aborts the whole run depends only on
/// the variant, never on the message.
#[derive(Debug, Error)]
pub enum HipsError {
    /// Missing or invalid configuration (job fields, templates, color maps).
    #[error("configuration error: {0}")]
    Config(String),

    /// Unreadable map/mask file, malformed FITS, mismatched pixel counts.
    #[error("input data error: {0}")]
    InputData(String),

    /// Degenerate clip range or empty mask selection.
    #[error("normalization error: {0}")]
    Normalization(String),

    /// Tiling tool failed, timed out, or produced an unparsable report.
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Cannot create a directory or write a file.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`HipsError`], used for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    InputData,
    Normalization,
    ExternalTool,
    Filesystem,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::InputData => "input_data",
            ErrorKind::Normalization => "normalization",
            ErrorKind::ExternalTool => "external_tool",
            ErrorKind::Filesystem => "filesystem",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HipsError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an InputData error.
    pub fn input_data(msg: impl Into<String>) -> Self {
        Self::InputData(msg.into())
    }

    /// Create a Normalization error.
    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization(msg.into())
    }

    /// Create an ExternalTool error.
    pub fn external_tool(msg: impl Into<String>) -> Self {
        Self::ExternalTool(msg.into())
    }

    /// Create a Filesystem error for `path`.
    pub fn filesystem(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HipsError::Config(_) => ErrorKind::Config,
            HipsError::InputData(_) => ErrorKind::InputData,
            HipsError::Normalization(_) => ErrorKind::Normalization,
            HipsError::ExternalTool(_) => ErrorKind::ExternalTool,
            HipsError::Filesystem { .. } => ErrorKind::Filesystem,
        }
    }
}

/// Attach a path to an `io::Error`, turning it into a [`HipsError::Filesystem`].
pub trait IoResultExt<T> {
    fn at_path(self, path: impl AsRef<Path>) -> HipsResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at_path(self, path: impl AsRef<Path>) -> HipsResult<T> {
        self.map_err(|e| HipsError::filesystem(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(HipsError::config("x").kind(), ErrorKind::Config);
        assert_eq!(HipsError::input_data("x").kind(), ErrorKind::InputData);
        assert_eq!(HipsError::normalization("x").kind(), ErrorKind::Normalization);
        assert_eq!(HipsError::external_tool("x").kind(), ErrorKind::ExternalTool);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(HipsError::filesystem("/tmp/x", io).kind(), ErrorKind::Filesystem);
    }

    #[test]
    fn test_filesystem_display_includes_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = HipsError::filesystem("/data/results", io);
        let msg = err.to_string();
        assert!(msg.contains("/data/results"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_at_path() {
        let res: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = res.at_path("/a/b").unwrap_err();
        assert!(matches!(err, HipsError::Filesystem { ref path, .. } if path == Path::new("/a/b")));
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(ErrorKind::ExternalTool.as_str(), "external_tool");
        assert_eq!(ErrorKind::Normalization.to_string(), "normalization");
    }
}
