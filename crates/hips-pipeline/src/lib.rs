//! Publishing pipeline: HEALPix map in, colorized HiPS tile tree out.
//!
//! [`MapPipeline`] handles a single map: normalize, tile through a
//! [`hipsgen::TileGenerator`], colorize the tiles. [`JobRunner`] applies it
//! to every map of a [`hips_common::RunConfig`], writes the viewer index
//! pages and a `run_summary.json`.

pub mod homepage;
pub mod pipeline;
pub mod runner;
pub mod summary;

pub use homepage::{write_index_pages, IndexLayer, LoadedTemplates};
pub use pipeline::{colorize_tile, MapPipeline, ProcessedJob};
pub use runner::{validate_config, JobRunner};
pub use summary::{JobFailure, JobOutcome, RunSummary};
