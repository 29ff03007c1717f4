//! Tests for PNG encoding of colorized images.

use flate2::read::ZlibDecoder;
use renderer::png::{encode_png, encode_rgba};
use renderer::ArgbImage;
use std::io::Read;

// ============================================================================
// Helper functions
// ============================================================================

/// Split a PNG into (chunk type, data) pairs, checking each CRC.
fn chunks(png: &[u8]) -> Vec<(String, Vec<u8>)> {
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    let mut out = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind = String::from_utf8(png[pos + 4..pos + 8].to_vec()).unwrap();
        let data = png[pos + 8..pos + 8 + len].to_vec();
        let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
        assert_eq!(crc, crc32fast::hash(&png[pos + 4..pos + 8 + len]));
        out.push((kind, data));
        pos += 12 + len;
    }
    out
}

fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

fn gradient_image(width: usize, height: usize, levels: u32) -> ArgbImage {
    let mut image = ArgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let level = ((x + y) as u32) % levels;
            image.set(x, y, 0xFF00_0000 | (level << 16) | (255 - level.min(255)));
        }
    }
    image
}

// ============================================================================
// Format selection tests
// ============================================================================

#[test]
fn test_few_colors_use_indexed() {
    let png = encode_png(&gradient_image(32, 16, 20)).unwrap();
    let chunks = chunks(&png);
    assert_eq!(chunks[0].0, "IHDR");
    assert_eq!(chunks[0].1[9], 3);
    assert_eq!(chunks[1].0, "PLTE");
    assert_eq!(chunks[1].1.len(), 20 * 3);
    assert!(chunks.iter().all(|(kind, _)| kind != "tRNS"));
}

#[test]
fn test_many_colors_use_rgba() {
    let png = encode_png(&gradient_image(400, 2, 300)).unwrap();
    let chunks = chunks(&png);
    assert_eq!(chunks[0].1[9], 6);
    let idat = &chunks.iter().find(|(kind, _)| kind == "IDAT").unwrap().1;
    assert_eq!(inflate(idat).len(), 2 * (1 + 400 * 4));
}

#[test]
fn test_transparent_pixels_emit_trns() {
    let mut image = ArgbImage::new(4, 4);
    image.set(1, 1, 0xFFFF_0000);
    let chunks = chunks(&encode_png(&image).unwrap());
    let trns = &chunks.iter().find(|(kind, _)| kind == "tRNS").unwrap().1;
    assert_eq!(trns.len(), 2);
    assert!(trns.contains(&0));
    assert!(trns.contains(&255));
}

#[test]
fn test_indexed_scanlines() {
    let image = gradient_image(5, 3, 4);
    let chunks = chunks(&encode_png(&image).unwrap());
    let idat = &chunks.iter().find(|(kind, _)| kind == "IDAT").unwrap().1;
    let raw = inflate(idat);
    assert_eq!(raw.len(), 3 * (1 + 5));
    assert!(raw.chunks(6).all(|row| row[0] == 0));
}

#[test]
fn test_large_image_parallel_palette() {
    let image = gradient_image(128, 128, 50);
    let png = encode_png(&image).unwrap();
    assert_eq!(chunks(&png)[0].1[9], 3);
    assert!(png.len() < encode_rgba(&image).unwrap().len());
}

#[test]
fn test_rgba_pixel_order() {
    let mut image = ArgbImage::new(1, 1);
    image.set(0, 0, 0x8011_2233);
    let chunks = chunks(&encode_rgba(&image).unwrap());
    let idat = &chunks.iter().find(|(kind, _)| kind == "IDAT").unwrap().1;
    assert_eq!(inflate(idat), vec![0, 0x11, 0x22, 0x33, 0x80]);
}
