//! Common types shared across the HEALPix → HiPS publishing crates.

pub mod error;
pub mod fs;
pub mod job;
pub mod log;

pub use error::{ErrorKind, HipsError, HipsResult, IoResultExt};
pub use job::{HipsgenSettings, JobErrorPolicy, MapJob, PageTemplates, RunConfig, DEFAULT_CLIP_SIGMA};
pub use log::{LogLevel, Logger, MemoryLogger, NoOpLogger, TracingLogger};
