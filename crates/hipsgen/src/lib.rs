//! Driving the external `hipsgen` tiling tool.
//!
//! Tiling is two runs of the tool against the same output directory:
//!
//! 1. a probe run whose console report gives the map's pixel range
//! 2. a final run with `pixelCut=<min> <max>` taken from that range
//!
//! [`TileGenerator`] is the seam the pipeline talks to; [`HipsgenCli`] is
//! the process-backed implementation. [`TileManifest`] lists the tiles a
//! run produced.

pub mod cli;
pub mod error;
pub mod generator;
pub mod layout;
pub mod report;

pub use cli::HipsgenCli;
pub use error::{HipsgenError, Result};
pub use generator::TileGenerator;
pub use layout::{color_map_stamp, png_path_for, staging_dir, TileManifest};
pub use report::{parse_pixel_range, PixelRange};
