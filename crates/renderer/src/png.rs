//! PNG encoding for colorized heat maps.
//!
//! Two encodings are produced:
//! - **Indexed PNG (color type 3)** when the image has at most 256 distinct
//!   ARGB values. Heat maps rendered with a fixed value range usually do.
//! - **RGBA PNG (color type 6)** otherwise.

use crate::image::ArgbImage;
use heatmap_common::{PlotError, PlotResult};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Images at least this large collect their palette in parallel.
const PARALLEL_THRESHOLD: usize = 4096;

/// Encode `image`, picking indexed or RGBA output automatically.
pub fn encode_png(image: &ArgbImage) -> PlotResult<Vec<u8>> {
    let pixels = image.pixels();
    let palette = if pixels.len() >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette(pixels)
    };

    match palette {
        Some((palette, indices)) => {
            tracing::debug!(colors = palette.len(), "Encoding indexed PNG");
            encode_indexed(image.width(), image.height(), &palette, &indices)
        }
        None => {
            tracing::debug!("More than {} colors, encoding RGBA PNG", MAX_PALETTE_SIZE);
            encode_rgba(image)
        }
    }
}

/// Encode `image` as a full-color RGBA PNG.
pub fn encode_rgba(image: &ArgbImage) -> PlotResult<Vec<u8>> {
    let (width, height) = (image.width(), image.height());
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));

    let rgba = image.to_rgba_bytes();
    let idat = deflate_scanlines(&rgba, width * 4, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode palette indices with their ARGB palette as an indexed PNG.
pub fn encode_indexed(
    width: usize,
    height: usize,
    palette: &[u32],
    indices: &[u8],
) -> PlotResult<Vec<u8>> {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let mut plte = Vec::with_capacity(palette.len() * 3);
    for &argb in palette {
        plte.extend_from_slice(&[(argb >> 16) as u8, (argb >> 8) as u8, argb as u8]);
    }
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|&argb| argb >> 24 != 0xFF) {
        let trns: Vec<u8> = palette.iter().map(|&argb| (argb >> 24) as u8).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

fn extract_palette(pixels: &[u32]) -> Option<(Vec<u32>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len());

    for &argb in pixels {
        let index = match color_to_index.get(&argb) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(argb);
                color_to_index.insert(argb, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Collect distinct colors per chunk in parallel, merge them, then map
/// pixels to palette indices in parallel.
fn extract_palette_parallel(pixels: &[u32]) -> Option<(Vec<u32>, Vec<u8>)> {
    let chunk_size = (pixels.len() / rayon::current_num_threads()).max(256);

    let chunk_colors: Vec<u32> = pixels
        .par_chunks(chunk_size)
        .flat_map(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for &argb in chunk {
                local.insert(argb, ());
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys().collect::<Vec<_>>()
        })
        .collect();

    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for argb in chunk_colors {
        if !color_to_index.contains_key(&argb) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            color_to_index.insert(argb, palette.len() as u8);
            palette.push(argb);
        }
    }

    let indices: Vec<u8> = pixels
        .par_iter()
        .map(|argb| color_to_index.get(argb).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

/// Prefix each scanline with filter byte 0 and zlib-compress the result.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> PlotResult<Vec<u8>> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes.max(1)).take(height) {
        uncompressed.push(0);
        uncompressed.extend_from_slice(row);
    }
    if row_bytes == 0 {
        uncompressed.resize(height, 0);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| PlotError::Render(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PlotError::Render(format!("IDAT compression failed: {}", e)))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_palette_simple() {
        let pixels = [0xFFFF_0000, 0xFF00_FF00, 0xFF00_00FF, 0xFFFF_0000];
        let (palette, indices) = extract_palette(&pixels).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(indices, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_extract_palette_too_many_colors() {
        let pixels: Vec<u32> = (0..300).map(|i| 0xFF00_0000 | i).collect();
        assert!(extract_palette(&pixels).is_none());
        assert!(extract_palette_parallel(&pixels).is_none());
    }

    #[test]
    fn test_parallel_matches_sequential_palette_size() {
        let pixels: Vec<u32> = (0..128 * 128).map(|i| 0xFF00_0000 | (i % 50)).collect();
        let (palette, indices) = extract_palette_parallel(&pixels).unwrap();
        assert_eq!(palette.len(), 50);
        assert_eq!(indices.len(), pixels.len());
        for (argb, idx) in pixels.iter().zip(&indices) {
            assert_eq!(palette[*idx as usize], *argb);
        }
    }
}
