//! Synthetic pixel data with known statistics.

/// Number of pixels of a full-sky map at `nside`.
pub fn npix(nside: u32) -> usize {
    12 * (nside as usize) * (nside as usize)
}

/// A linear ramp `0, 1, 2, ...` over a full-sky map.
///
/// # Example
///
/// ```
/// use test_utils::ramp_values;
///
/// let v = ramp_values(1);
/// assert_eq!(v.len(), 12);
/// assert_eq!(v[11], 11.0);
/// ```
pub fn ramp_values(nside: u32) -> Vec<f64> {
    (0..npix(nside)).map(|i| i as f64).collect()
}

/// A ramp over `[0, 1)` with a handful of extreme outliers mixed in.
///
/// Every 97th pixel is set to `outlier`, so sigma clipping should remove
/// them and leave the `[0, 1)` ramp as the display range.
pub fn ramp_with_outliers(nside: u32, outlier: f64) -> Vec<f64> {
    let n = npix(nside);
    (0..n)
        .map(|i| if i % 97 == 96 { outlier } else { i as f64 / n as f64 })
        .collect()
}

/// Values already in `[0, 1]` including both ends.
pub fn unit_values(nside: u32) -> Vec<f64> {
    let n = npix(nside);
    (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
}

/// A tile-sized grid of single-band values `row * width + col`, scaled
/// to `[0, 1]`.
pub fn ramp_tile(width: usize, height: usize) -> Vec<f32> {
    let total = (width * height).max(2) - 1;
    (0..width * height).map(|i| i as f32 / total as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npix() {
        assert_eq!(npix(1), 12);
        assert_eq!(npix(8), 768);
    }

    #[test]
    fn test_ramp_with_outliers() {
        let v = ramp_with_outliers(8, 1e6);
        assert_eq!(v.iter().filter(|x| **x == 1e6).count(), 768 / 97);
        assert!(v.iter().filter(|x| **x != 1e6).all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_unit_values_span() {
        let v = unit_values(2);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[47], 1.0);
    }

    #[test]
    fn test_ramp_tile() {
        let t = ramp_tile(4, 4);
        assert_eq!(t.len(), 16);
        assert_eq!(t[0], 0.0);
        assert_eq!(t[15], 1.0);
    }
}
