//! Sigma-clipped rescaling of pixel values into [0, 1].

use healpix_fits::is_unseen;
use rayon::prelude::*;

use crate::error::{NormalizeError, Result};
use crate::mask::Mask;

/// Outcome of iterative sigma clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRange {
    /// Smallest surviving value.
    pub min: f64,
    /// Largest surviving value.
    pub max: f64,
    /// Number of values left after clipping.
    pub survivors: usize,
    /// Clipping rounds that discarded at least one value.
    pub rounds: usize,
}

/// Normalized values plus the statistics that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub values: Vec<f64>,
    pub range: ClipRange,
    /// Value given to unselected and unusable pixels.
    pub fill: f64,
}

/// Rescale `values` into [0, 1] using a sigma-clipped range.
///
/// See [`normalize_with_stats`].
pub fn normalize(
    values: &[f64],
    mask: Option<&Mask>,
    low_sigma: f64,
    high_sigma: f64,
) -> Result<Vec<f64>> {
    normalize_with_stats(values, mask, low_sigma, high_sigma).map(|n| n.values)
}

/// Rescale `values` into [0, 1].
///
/// The clip range is computed from the selected pixels only (all pixels
/// without a mask; `UNSEEN` and NaN are never selected). Selected pixels
/// are mapped linearly so that the clipped range spans [0, 1] and clamped.
/// Every other pixel receives the smallest rescaled selected value.
pub fn normalize_with_stats(
    values: &[f64],
    mask: Option<&Mask>,
    low_sigma: f64,
    high_sigma: f64,
) -> Result<Normalized> {
    check_threshold("low_sigma", low_sigma)?;
    check_threshold("high_sigma", high_sigma)?;
    if let Some(mask) = mask {
        if mask.len() != values.len() {
            return Err(NormalizeError::LengthMismatch {
                values: values.len(),
                mask: mask.len(),
            });
        }
    }

    let selected: Vec<bool> = values
        .iter()
        .enumerate()
        .map(|(i, v)| !is_unseen(*v) && mask.map_or(true, |m| m.is_selected(i)))
        .collect();

    let subset: Vec<f64> = values
        .iter()
        .zip(&selected)
        .filter_map(|(v, keep)| keep.then_some(*v))
        .collect();

    let range = sigma_clip(subset, low_sigma, high_sigma)?;
    let span = range.max - range.min;
    if span <= 0.0 || !span.is_finite() {
        return Err(NormalizeError::DegenerateRange { value: range.min });
    }

    let rescale = |x: f64| ((x - range.min) / span).clamp(0.0, 1.0);

    let fill = values
        .iter()
        .zip(&selected)
        .filter(|(_, keep)| **keep)
        .map(|(v, _)| rescale(*v))
        .fold(f64::INFINITY, f64::min);

    let out: Vec<f64> = values
        .par_iter()
        .zip(selected.par_iter())
        .map(|(v, keep)| if *keep { rescale(*v) } else { fill })
        .collect();

    Ok(Normalized {
        values: out,
        range,
        fill,
    })
}

/// Iteratively discard values more than `low_sigma` standard deviations
/// below or `high_sigma` above the mean until a round discards nothing.
///
/// A round that would discard every remaining value is not applied.
pub fn sigma_clip(mut subset: Vec<f64>, low_sigma: f64, high_sigma: f64) -> Result<ClipRange> {
    check_threshold("low_sigma", low_sigma)?;
    check_threshold("high_sigma", high_sigma)?;
    if subset.is_empty() {
        return Err(NormalizeError::EmptySelection);
    }

    let mut rounds = 0;
    loop {
        let (mean, std) = mean_std(&subset);
        if std == 0.0 {
            break;
        }
        let lo = mean - low_sigma * std;
        let hi = mean + high_sigma * std;

        let kept: Vec<f64> = subset.iter().copied().filter(|v| *v >= lo && *v <= hi).collect();
        if kept.len() == subset.len() || kept.is_empty() {
            break;
        }
        subset = kept;
        rounds += 1;
    }

    let (min, max) = subset
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

    Ok(ClipRange {
        min,
        max,
        survivors: subset.len(),
        rounds,
    })
}

/// Mean and population standard deviation (two-pass).
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn check_threshold(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(NormalizeError::InvalidThreshold { name, value })
    }
}
