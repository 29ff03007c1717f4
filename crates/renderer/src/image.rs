//! In-memory ARGB raster produced by colorization.

use heatmap_common::Color;

/// Row-major image of packed `0xAARRGGBB` pixels, initially fully transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgbImage {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl ArgbImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn color(&self, x: usize, y: usize) -> Color {
        Color::from_argb(self.get(x, y))
    }

    pub fn set(&mut self, x: usize, y: usize, argb: u32) {
        self.pixels[y * self.width + x] = argb;
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// True when every pixel has zero alpha.
    pub fn is_transparent(&self) -> bool {
        self.pixels.iter().all(|p| p >> 24 == 0)
    }

    /// Mirror the rows so that increasing data y points up.
    pub fn flip_vertical(&mut self) {
        let w = self.width;
        for y in 0..self.height / 2 {
            let mirror = self.height - 1 - y;
            let (top, bottom) = self.pixels.split_at_mut(mirror * w);
            top[y * w..(y + 1) * w].swap_with_slice(&mut bottom[..w]);
        }
    }

    /// Copy `tile` into this image with its top-left corner at `(x0, y0)`.
    ///
    /// Fully transparent tile pixels leave the destination untouched and
    /// parts of the tile outside this image are clipped.
    pub fn draw(&mut self, tile: &ArgbImage, x0: i64, y0: i64) {
        for ty in 0..tile.height {
            let y = y0 + ty as i64;
            if y < 0 || y >= self.height as i64 {
                continue;
            }
            for tx in 0..tile.width {
                let x = x0 + tx as i64;
                if x < 0 || x >= self.width as i64 {
                    continue;
                }
                let argb = tile.get(tx, ty);
                if argb >> 24 != 0 {
                    self.set(x as usize, y as usize, argb);
                }
            }
        }
    }

    /// Unpack into RGBA bytes, 4 per pixel, as the PNG encoder expects.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for &argb in &self.pixels {
            let c = Color::from_argb(argb);
            bytes.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_vertical() {
        let mut image = ArgbImage::new(2, 3);
        image.set(0, 0, 1);
        image.set(1, 2, 2);
        image.flip_vertical();
        assert_eq!(image.get(0, 2), 1);
        assert_eq!(image.get(1, 0), 2);
        assert_eq!(image.get(0, 1), 0);
    }

    #[test]
    fn test_draw_clips_and_skips_transparent() {
        let mut canvas = ArgbImage::new(4, 4);
        canvas.set(0, 0, 0xFF00_0001);
        let mut tile = ArgbImage::new(2, 2);
        tile.set(1, 1, 0xFF00_0002);
        canvas.draw(&tile, -1, -1);
        assert_eq!(canvas.get(0, 0), 0xFF00_0002);

        canvas.draw(&tile, 3, 3);
        assert_eq!(canvas.get(3, 3), 0);
    }
}
