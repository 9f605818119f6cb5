//! Single-band tile images (primary HDU, two axes).
//!
//! `hipsgen` writes every tile, and the `Allsky` overview, as a plain 2-D
//! FITS image. Pixels are returned in file order: row 0 is the *bottom* row
//! of the picture.

use std::path::Path;

use crate::error::{FitsError, Result};
use crate::header::{padded_len, Header, Value};

/// A decoded tile: `width * height` physical values, row-major.
///
/// Integer `BLANK` pixels and NaNs are carried as `f32::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl TileImage {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != width * height {
            return Err(FitsError::invalid_header(format!(
                "{} pixels do not fill a {}x{} image",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (header, data_start) = Header::parse(bytes, 0)?;
        if header.get_logical("SIMPLE") != Some(true) {
            return Err(FitsError::invalid_header("not a FITS file (SIMPLE != T)"));
        }

        let naxis = header.require_int("NAXIS")?;
        if naxis != 2 {
            return Err(FitsError::unsupported(format!(
                "tile image with NAXIS = {} (expected 2)",
                naxis
            )));
        }
        let width = header.require_size("NAXIS1")?;
        let height = header.require_size("NAXIS2")?;
        let bitpix = header.require_int("BITPIX")?;

        let bscale = header.get_float("BSCALE").unwrap_or(1.0);
        let bzero = header.get_float("BZERO").unwrap_or(0.0);
        let blank = header.get_int("BLANK");

        let size = match bitpix {
            8 => 1,
            16 => 2,
            32 | -32 => 4,
            64 | -64 => 8,
            other => {
                return Err(FitsError::unsupported(format!("BITPIX = {}", other)));
            }
        };
        let byte_len = width
            .checked_mul(height)
            .and_then(|count| count.checked_mul(size))
            .ok_or_else(|| {
                FitsError::invalid_header(format!("{} x {} image is too large", width, height))
            })?;
        let raw = bytes
            .get(data_start..)
            .and_then(|rest| rest.get(..byte_len))
            .ok_or(FitsError::UnexpectedEof("image data"))?;

        let physical = |stored: f64| (stored * bscale + bzero) as f32;
        let integer = |stored: i64| {
            if blank == Some(stored) {
                f32::NAN
            } else {
                physical(stored as f64)
            }
        };

        let data: Vec<f32> = raw
            .chunks_exact(size)
            .map(|b| match bitpix {
                8 => integer(b[0] as i64),
                16 => integer(i16::from_be_bytes([b[0], b[1]]) as i64),
                32 => integer(i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as i64),
                64 => {
                    let mut a = [0u8; 8];
                    a.copy_from_slice(b);
                    integer(i64::from_be_bytes(a))
                }
                -32 => {
                    let v = f32::from_be_bytes([b[0], b[1], b[2], b[3]]);
                    if v.is_nan() { f32::NAN } else { physical(v as f64) }
                }
                _ => {
                    let mut a = [0u8; 8];
                    a.copy_from_slice(b);
                    let v = f64::from_be_bytes(a);
                    if v.is_nan() { f32::NAN } else { physical(v) }
                }
            })
            .collect();

        Self::new(width, height, data)
    }

    /// Encode as a `BITPIX = -32` image.
    pub fn to_fits_bytes(&self) -> Vec<u8> {
        let mut header = Header::new();
        header
            .push("SIMPLE", Value::Logical(true))
            .push("BITPIX", Value::Integer(-32))
            .push("NAXIS", Value::Integer(2))
            .push("NAXIS1", Value::Integer(self.width as i64))
            .push("NAXIS2", Value::Integer(self.height as i64));

        let mut out = header.encode();
        let data_start = out.len();
        for v in &self.data {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.resize(data_start + padded_len(out.len() - data_start), 0);
        out
    }
}
