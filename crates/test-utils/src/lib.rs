//! Test support for the HiPS publisher workspace.
//!
//! - [`generators`]: pixel data with known statistics (ramps, outliers,
//!   tile-sized grids)
//! - [`fixtures`]: files on disk shaped like the real inputs and like
//!   `hipsgen` output
//! - float assertions with a tolerance
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, ramp_values, write_test_map};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = write_test_map(dir.path(), "ramp.fits", ramp_values(2));
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Panic unless `|left - right| <= epsilon`. Operands are compared as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Element-wise [`assert_approx_eq!`] over two slices of equal length.
#[macro_export]
macro_rules! assert_all_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = &$left;
        let right = &$right;
        assert_eq!(left.len(), right.len(), "length mismatch");
        for (l, r) in left.iter().zip(right.iter()) {
            $crate::assert_approx_eq!(*l, *r, $epsilon);
        }
    }};
}
