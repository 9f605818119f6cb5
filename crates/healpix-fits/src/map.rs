//! HEALPix maps stored as a FITS binary table.
//!
//! Layout (the one `healpy` and `hipsgen` agree on):
//! - an empty primary HDU
//! - a `BINTABLE` extension whose first column holds the pixel values,
//!   either one value per row (`TFORM1 = 'E'`) or packed rows
//!   (`TFORM1 = '1024E'`)
//!
//! Only the first column is read; additional columns (Q/U maps, hit
//! counts) are skipped.

use std::path::Path;

use crate::error::{FitsError, Result};
use crate::header::{checked_padded_len, padded_len, Header, Value};

/// HEALPix `UNSEEN` sentinel marking pixels without data.
pub const UNSEEN: f64 = -1.6375e30;

/// Pixel numbering scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ordering {
    #[default]
    Ring,
    Nested,
}

impl Ordering {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ordering::Ring => "RING",
            Ordering::Nested => "NESTED",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RING" => Ok(Ordering::Ring),
            "NESTED" | "NEST" => Ok(Ordering::Nested),
            other => Err(FitsError::invalid_header(format!("unknown ORDERING '{}'", other))),
        }
    }
}

/// `nside` for a full-sky map of `npix` pixels, if `npix` is a valid size.
pub fn npix_to_nside(npix: usize) -> Option<u32> {
    if npix == 0 || npix % 12 != 0 {
        return None;
    }
    let per_face = npix / 12;
    let nside = (per_face as f64).sqrt().round() as usize;
    (nside * nside == per_face).then_some(nside as u32)
}

/// Returns `true` if `value` carries no data (NaN, infinite or `UNSEEN`).
pub fn is_unseen(value: f64) -> bool {
    !value.is_finite() || (value - UNSEEN).abs() <= UNSEEN.abs() * 1e-5
}

/// A full-sky HEALPix map.
#[derive(Debug, Clone, PartialEq)]
pub struct HealpixMap {
    nside: u32,
    ordering: Ordering,
    coordsys: Option<String>,
    values: Vec<f64>,
}

impl HealpixMap {
    /// Wrap `values`, checking the length is `12 * nside^2`.
    pub fn new(values: Vec<f64>, ordering: Ordering) -> Result<Self> {
        let nside = npix_to_nside(values.len())
            .ok_or(FitsError::InvalidPixelCount { npix: values.len() })?;
        Ok(Self {
            nside,
            ordering,
            coordsys: None,
            values,
        })
    }

    /// Same geometry and metadata as `self`, new pixel values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.values.len() {
            return Err(FitsError::InvalidPixelCount { npix: values.len() });
        }
        Ok(Self {
            nside: self.nside,
            ordering: self.ordering,
            coordsys: self.coordsys.clone(),
            values,
        })
    }

    pub fn with_coordsys(mut self, coordsys: impl Into<String>) -> Self {
        self.coordsys = Some(coordsys.into());
        self
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    pub fn npix(&self) -> usize {
        self.values.len()
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    pub fn coordsys(&self) -> Option<&str> {
        self.coordsys.as_deref()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Read a map file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Decode a map from the raw bytes of a FITS file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (primary, mut offset) = Header::parse(bytes, 0)?;
        if primary.get_logical("SIMPLE") != Some(true) {
            return Err(FitsError::invalid_header("not a FITS file (SIMPLE != T)"));
        }
        offset = advance(offset, data_len(&primary)?)?;

        // First binary table extension holds the map.
        loop {
            if offset >= bytes.len() {
                return Err(FitsError::unsupported("no BINTABLE extension found"));
            }
            let (header, data_start) = Header::parse(bytes, offset)?;
            let len = data_len(&header)?;
            if header.get_text("XTENSION") == Some("BINTABLE") {
                let data = bytes
                    .get(data_start..)
                    .and_then(|rest| rest.get(..len))
                    .ok_or(FitsError::UnexpectedEof("binary table"))?;
                return Self::from_table(&header, data);
            }
            offset = advance(data_start, len)?;
        }
    }

    fn from_table(header: &Header, data: &[u8]) -> Result<Self> {
        if let Some(scheme) = header.get_text("INDXSCHM") {
            if scheme.eq_ignore_ascii_case("EXPLICIT") {
                return Err(FitsError::unsupported("partial-sky (EXPLICIT index) maps"));
            }
        }

        let row_len = header.require_size("NAXIS1")?;
        let rows = header.require_size("NAXIS2")?;
        let tform = header
            .get_text("TFORM1")
            .ok_or_else(|| FitsError::MissingKeyword("TFORM1".to_string()))?;
        let column = ColumnFormat::parse(tform)?;
        if column.width() > row_len {
            return Err(FitsError::invalid_header(format!(
                "TFORM1 '{}' is wider than the {}-byte row",
                tform, row_len
            )));
        }

        let scale = header.get_float("TSCAL1").unwrap_or(1.0);
        let zero = header.get_float("TZERO1").unwrap_or(0.0);

        let mut values = Vec::with_capacity(rows * column.repeat);
        for row in data.chunks_exact(row_len).take(rows) {
            for i in 0..column.repeat {
                let raw = column.kind.decode(&row[i * column.kind.size()..]);
                values.push(if raw.is_finite() { raw * scale + zero } else { raw });
            }
        }
        if values.len() != rows * column.repeat {
            return Err(FitsError::UnexpectedEof("binary table rows"));
        }

        let ordering = match header.get_text("ORDERING") {
            Some(s) => Ordering::parse(s)?,
            None => Ordering::Ring,
        };
        let map = Self::new(values, ordering)?;

        if let Some(nside) = header.get_int("NSIDE") {
            if nside != map.nside as i64 {
                return Err(FitsError::invalid_header(format!(
                    "NSIDE = {} but the table holds {} pixels (nside {})",
                    nside,
                    map.npix(),
                    map.nside
                )));
            }
        }

        Ok(match header.get_text("COORDSYS") {
            Some(c) => map.with_coordsys(c),
            None => map,
        })
    }

    /// Encode as FITS: one single-precision `TEMPERATURE` value per row,
    /// implicit full-sky indexing.
    pub fn to_fits_bytes(&self) -> Vec<u8> {
        let mut primary = Header::new();
        primary
            .push("SIMPLE", Value::Logical(true))
            .push("BITPIX", Value::Integer(8))
            .push("NAXIS", Value::Integer(0))
            .push("EXTEND", Value::Logical(true));

        let npix = self.npix() as i64;
        let mut table = Header::new();
        table
            .push("XTENSION", Value::Text("BINTABLE".into()))
            .push("BITPIX", Value::Integer(8))
            .push("NAXIS", Value::Integer(2))
            .push("NAXIS1", Value::Integer(4))
            .push("NAXIS2", Value::Integer(npix))
            .push("PCOUNT", Value::Integer(0))
            .push("GCOUNT", Value::Integer(1))
            .push("TFIELDS", Value::Integer(1))
            .push("TTYPE1", Value::Text("TEMPERATURE".into()))
            .push("TFORM1", Value::Text("E".into()))
            .push("PIXTYPE", Value::Text("HEALPIX".into()))
            .push("ORDERING", Value::Text(self.ordering.as_str().into()));
        if let Some(coordsys) = &self.coordsys {
            table.push("COORDSYS", Value::Text(coordsys.clone()));
        }
        table
            .push("EXTNAME", Value::Text("xtension".into()))
            .push("NSIDE", Value::Integer(self.nside as i64))
            .push("FIRSTPIX", Value::Integer(0))
            .push("LASTPIX", Value::Integer(npix - 1))
            .push("INDXSCHM", Value::Text("IMPLICIT".into()))
            .push("OBJECT", Value::Text("FULLSKY".into()));

        let mut out = primary.encode();
        out.extend_from_slice(&table.encode());
        let data_start = out.len();
        for v in &self.values {
            out.extend_from_slice(&(*v as f32).to_be_bytes());
        }
        out.resize(data_start + padded_len(out.len() - data_start), 0);
        out
    }
}

/// Byte length of an HDU's data section (unpadded). Fails when the
/// header describes more data than a `usize` can address.
pub(crate) fn data_len(header: &Header) -> Result<usize> {
    let naxis = header.require_size("NAXIS")?;
    if naxis == 0 {
        return Ok(0);
    }
    let value_size = (header.require_int("BITPIX")?.unsigned_abs() / 8) as usize;
    let mut elements: usize = 1;
    for i in 1..=naxis {
        let axis = header.require_size(&format!("NAXIS{}", i))?;
        elements = elements.checked_mul(axis).ok_or_else(|| too_large(header))?;
    }
    let pcount = header.get_size("PCOUNT")?.unwrap_or(0);
    let gcount = header.get_size("GCOUNT")?.unwrap_or(1);
    pcount
        .checked_add(elements)
        .and_then(|n| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(value_size))
        .filter(|n| checked_padded_len(*n).is_some())
        .ok_or_else(|| too_large(header))
}

fn too_large(header: &Header) -> FitsError {
    FitsError::invalid_header(format!(
        "data size of {} overflows",
        header.get_text("XTENSION").unwrap_or("primary HDU")
    ))
}

/// Offset of the next HDU after `len` data bytes starting at `start`.
fn advance(start: usize, len: usize) -> Result<usize> {
    checked_padded_len(len)
        .and_then(|padded| start.checked_add(padded))
        .ok_or(FitsError::UnexpectedEof("HDU data"))
}

/// Element type of a binary table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ColumnKind {
    fn size(&self) -> usize {
        match self {
            ColumnKind::U8 => 1,
            ColumnKind::I16 => 2,
            ColumnKind::I32 | ColumnKind::F32 => 4,
            ColumnKind::I64 | ColumnKind::F64 => 8,
        }
    }

    /// Decode one big-endian element. `bytes` has at least `size()` bytes.
    fn decode(&self, bytes: &[u8]) -> f64 {
        match self {
            ColumnKind::U8 => bytes[0] as f64,
            ColumnKind::I16 => i16::from_be_bytes([bytes[0], bytes[1]]) as f64,
            ColumnKind::I32 => {
                i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ColumnKind::I64 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&bytes[..8]);
                i64::from_be_bytes(b) as f64
            }
            ColumnKind::F32 => {
                f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            }
            ColumnKind::F64 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(&bytes[..8]);
                f64::from_be_bytes(b)
            }
        }
    }
}

/// Parsed `TFORMn` value such as `E` or `1024D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnFormat {
    repeat: usize,
    kind: ColumnKind,
}

impl ColumnFormat {
    fn parse(tform: &str) -> Result<Self> {
        let tform = tform.trim();
        let digits = tform.chars().take_while(|c| c.is_ascii_digit()).count();
        let repeat = if digits == 0 {
            1
        } else {
            tform[..digits]
                .parse::<usize>()
                .map_err(|_| FitsError::invalid_header(format!("bad TFORM '{}'", tform)))?
        };
        let kind = match tform[digits..].chars().next() {
            Some('B') => ColumnKind::U8,
            Some('I') => ColumnKind::I16,
            Some('J') => ColumnKind::I32,
            Some('K') => ColumnKind::I64,
            Some('E') => ColumnKind::F32,
            Some('D') => ColumnKind::F64,
            _ => {
                return Err(FitsError::unsupported(format!(
                    "column format '{}' (expected B, I, J, K, E or D)",
                    tform
                )))
            }
        };
        if repeat == 0 {
            return Err(FitsError::unsupported(format!("empty column '{}'", tform)));
        }
        if repeat.checked_mul(kind.size()).is_none() {
            return Err(FitsError::invalid_header(format!("column '{}' is too wide", tform)));
        }
        Ok(Self { repeat, kind })
    }

    fn width(&self) -> usize {
        self.repeat * self.kind.size()
    }
}
