//! PNG encoding of colorized tiles.
//!
//! A tile colorized from 8-bit ramp samples rarely has more than a few
//! hundred distinct colors, so [`encode_rgba`] first tries an indexed
//! image (color type 3, palette + `tRNS`) and falls back to 8-bit RGBA
//! (color type 6). The palette is sorted, so the output depends only on
//! the pixels and never on how rayon split the work.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::error::{RenderError, Result};
use crate::gradient::RgbaImage;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

const MAX_PALETTE: usize = 256;

/// Below this many pixels the palette is collected on the calling thread.
const PARALLEL_MIN_PIXELS: usize = 4096;

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

/// Encode a colorized image.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    encode_rgba(&image.pixels, image.width, image.height)
}

/// Encode RGBA bytes, choosing indexed or truecolor output.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_len(pixels.len(), width, height, 4)?;
    match Palette::build(pixels) {
        Some(palette) => encode_indexed(width, height, &palette.colors, &palette.indices(pixels)),
        None => encode_truecolor(pixels, width, height),
    }
}

/// Encode palette indices with their `[r, g, b, a]` palette.
pub fn encode_indexed(width: usize, height: usize, palette: &[[u8; 4]], indices: &[u8]) -> Result<Vec<u8>> {
    check_len(indices.len(), width, height, 1)?;
    if palette.is_empty() || palette.len() > MAX_PALETTE {
        return Err(RenderError::Encode(format!(
            "palette must have 1 to {} entries, got {}",
            MAX_PALETTE,
            palette.len()
        )));
    }

    let mut out = start(width, height, COLOR_TYPE_INDEXED);
    let rgb: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut out, b"PLTE", &rgb);
    if palette.iter().any(|c| c[3] != u8::MAX) {
        let alpha: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut out, b"tRNS", &alpha);
    }
    finish(out, indices, width, height, 1)
}

/// Encode RGBA bytes as an 8-bit truecolor-with-alpha image.
pub fn encode_truecolor(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_len(pixels.len(), width, height, 4)?;
    let out = start(width, height, COLOR_TYPE_RGBA);
    finish(out, pixels, width, height, 4)
}

/// Distinct colors of an image, in ascending packed order.
struct Palette {
    colors: Vec<[u8; 4]>,
    lookup: HashMap<u32, u8>,
}

impl Palette {
    /// `None` when the image has more than 256 colors.
    fn build(pixels: &[u8]) -> Option<Self> {
        let mut packed = if pixels.len() / 4 >= PARALLEL_MIN_PIXELS {
            distinct_parallel(pixels)
        } else {
            distinct(pixels)?
        };
        packed.par_sort_unstable();
        packed.dedup();
        if packed.len() > MAX_PALETTE {
            return None;
        }

        let lookup = packed.iter().enumerate().map(|(i, p)| (*p, i as u8)).collect();
        let colors = packed.iter().map(|p| p.to_be_bytes()).collect();
        Some(Self { colors, lookup })
    }

    fn indices(&self, pixels: &[u8]) -> Vec<u8> {
        pixels
            .par_chunks_exact(4)
            .map(|p| self.lookup.get(&pack(p)).copied().unwrap_or(0))
            .collect()
    }
}

fn pack(pixel: &[u8]) -> u32 {
    u32::from_be_bytes([pixel[0], pixel[1], pixel[2], pixel[3]])
}

fn distinct(pixels: &[u8]) -> Option<Vec<u32>> {
    let mut seen = HashSet::with_capacity(MAX_PALETTE);
    for pixel in pixels.chunks_exact(4) {
        if seen.insert(pack(pixel)) && seen.len() > MAX_PALETTE {
            return None;
        }
    }
    Some(seen.into_iter().collect())
}

/// Per-chunk color sets, merged by the caller. Each chunk stops early once
/// it alone exceeds the palette limit.
fn distinct_parallel(pixels: &[u8]) -> Vec<u32> {
    let chunk = (pixels.len() / 4 / rayon::current_num_threads()).max(256) * 4;
    pixels
        .par_chunks(chunk)
        .flat_map_iter(|part| {
            let mut seen = HashSet::with_capacity(MAX_PALETTE);
            for pixel in part.chunks_exact(4) {
                if seen.insert(pack(pixel)) && seen.len() > MAX_PALETTE {
                    break;
                }
            }
            seen.into_iter()
        })
        .collect()
}

fn check_len(len: usize, width: usize, height: usize, bytes_per_pixel: usize) -> Result<()> {
    if len != width * height * bytes_per_pixel {
        return Err(RenderError::DimensionMismatch {
            values: len / bytes_per_pixel,
            width,
            height,
        });
    }
    Ok(())
}

/// Signature plus `IHDR`: 8-bit depth, deflate, no filter method, no interlace.
fn start(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut header = [0u8; 13];
    header[..4].copy_from_slice(&(width as u32).to_be_bytes());
    header[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    header[8] = 8;
    header[9] = color_type;

    let mut out = SIGNATURE.to_vec();
    write_chunk(&mut out, b"IHDR", &header);
    out
}

/// Append `IDAT` and `IEND`.
fn finish(mut out: Vec<u8>, data: &[u8], width: usize, height: usize, bytes_per_pixel: usize) -> Result<Vec<u8>> {
    let idat = deflate_rows(data, width * bytes_per_pixel, height)?;
    write_chunk(&mut out, b"IDAT", &idat);
    write_chunk(&mut out, b"IEND", &[]);
    Ok(out)
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut crc = crc32fast::Hasher::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
}

/// Zlib stream of `height` rows of `stride` bytes, each behind filter byte 0.
fn deflate_rows(data: &[u8], stride: usize, height: usize) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (stride + 1));
    for y in 0..height {
        raw.push(0);
        raw.extend_from_slice(&data[y * stride..(y + 1) * stride]);
    }

    let compress_err = |e: std::io::Error| RenderError::Encode(format!("IDAT compression failed: {}", e));
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&raw).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)
}
