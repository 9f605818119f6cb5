//! Parsing of the `hipsgen` console report.
//!
//! The probe pass prints, among many other lines, a fragment like
//!
//! ```text
//! ... Pixel dynamic range=[3.2..97.4] ... cut=[...]
//! ```
//!
//! The range between the two markers becomes the `pixelCut` of the final
//! pass. There is no fallback: a report without a parseable range is an
//! error.

use std::fmt;

use crate::error::{HipsgenError, Result};

/// Start of the fragment holding the range.
pub const RANGE_START_MARKER: &str = "Pixel dynamic range=";

/// End of the fragment holding the range.
pub const RANGE_END_MARKER: &str = "cut=[";

/// Pixel value range reported by the probe pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRange {
    pub min: f64,
    pub max: f64,
}

impl PixelRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(HipsgenError::report_parse(format!(
                "non-finite pixel range [{}..{}]",
                min, max
            )));
        }
        if min > max {
            return Err(HipsgenError::report_parse(format!(
                "inverted pixel range [{}..{}]",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Value of the `pixelCut=` argument.
    pub fn pixel_cut(&self) -> String {
        format!("{:.5} {:.5}", self.min, self.max)
    }
}

impl fmt::Display for PixelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.min, self.max)
    }
}

/// Extract the pixel range from a probe report.
pub fn parse_pixel_range(report: &str) -> Result<PixelRange> {
    let start = report
        .find(RANGE_START_MARKER)
        .ok_or_else(|| HipsgenError::report_parse(format!("'{}' not found", RANGE_START_MARKER)))?;
    let rest = &report[start + RANGE_START_MARKER.len()..];

    let end = rest.find(RANGE_END_MARKER).ok_or_else(|| {
        HipsgenError::report_parse(format!(
            "'{}' not found after '{}'",
            RANGE_END_MARKER, RANGE_START_MARKER
        ))
    })?;
    let fragment = &rest[..end];

    let open = fragment
        .find('[')
        .ok_or_else(|| HipsgenError::report_parse(format!("no '[' in '{}'", fragment.trim())))?;
    let close = fragment[open..]
        .find(']')
        .map(|i| open + i)
        .ok_or_else(|| HipsgenError::report_parse(format!("no ']' in '{}'", fragment.trim())))?;
    let inner = &fragment[open + 1..close];

    let (lo, hi) = inner
        .split_once("..")
        .ok_or_else(|| HipsgenError::report_parse(format!("no '..' in '[{}]'", inner)))?;

    PixelRange::new(parse_number(lo)?, parse_number(hi)?)
}

fn parse_number(text: &str) -> Result<f64> {
    let text = text.trim();
    text.parse::<f64>()
        .map_err(|_| HipsgenError::report_parse(format!("'{}' is not a number", text)))
}
