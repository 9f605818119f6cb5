//! Map preparation for tiling.
//!
//! Raw physical values are clipped with iterative sigma clipping and
//! rescaled into [0, 1] so the tiling tool and the color maps see a stable
//! display range. An optional [`Mask`] restricts both the statistics and
//! the rescaled region.
//!
//! ```
//! use map_processor::{normalize, Mask};
//!
//! let values = vec![0.0, 2.0, 4.0, 100.0];
//! let mask = Mask::from_bools(vec![true, true, true, false]);
//! let out = normalize(&values, Some(&mask), 3.0, 3.0).unwrap();
//! assert_eq!(out, vec![0.0, 0.5, 1.0, 0.0]);
//! ```

pub mod error;
pub mod mask;
pub mod normalize;

pub use error::{NormalizeError, Result};
pub use mask::{Mask, MASK_THRESHOLD};
pub use normalize::{normalize, normalize_with_stats, sigma_clip, ClipRange, Normalized};
