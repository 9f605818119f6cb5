//! Boolean pixel selectors derived from auxiliary maps.

use healpix_fits::HealpixMap;

/// Auxiliary-map value above which a pixel is selected.
pub const MASK_THRESHOLD: f64 = 0.99;

/// Per-pixel selection, same length as the map it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    selected: Vec<bool>,
}

impl Mask {
    pub fn from_bools(selected: Vec<bool>) -> Self {
        Self { selected }
    }

    /// Select pixels whose value is greater than [`MASK_THRESHOLD`].
    /// NaN never selects.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            selected: values.iter().map(|v| *v > MASK_THRESHOLD).collect(),
        }
    }

    pub fn from_map(map: &HealpixMap) -> Self {
        Self::from_values(map.values())
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let mask = Mask::from_values(&[0.0, 0.99, 0.991, 1.0, f64::NAN]);
        assert_eq!(mask.as_slice(), &[false, false, true, true, false]);
        assert_eq!(mask.selected_count(), 2);
    }

    #[test]
    fn test_out_of_range_index_is_unselected() {
        let mask = Mask::from_bools(vec![true]);
        assert!(mask.is_selected(0));
        assert!(!mask.is_selected(5));
    }
}
