//! Per-pixel intensity accumulator and its run-length wire format.
//!
//! A [`FrequencyMap`] is a `width x height` grid of `f32` stored column by
//! column (`values[x * height + y]`). Workers stamp projected shape
//! centroids into their own map, maps are merged by element-wise addition
//! and the result is colorized through a [`Gradient`].
//!
//! # Wire format
//!
//! All numbers are big-endian.
//!
//! ```text
//! i32 width
//! i32 height
//! for each column x, top to bottom, one entry per run of equal values:
//!   f32 -v            single cell with v > 0
//!   f32 k, f32 v      k >= 2 cells of v, or any run of zeros
//! ```
//!
//! The decoder reads one float `v`: `v <= 0` is a single cell of `-v`,
//! otherwise `v` is a run length and the next float is the run value.

use crate::gradient::Gradient;
use crate::image::ArgbImage;
use crate::kernel::{DiskMask, GaussianKernel, DEFAULT_SIGMA};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use heatmap_common::{PlotError, PlotResult, ValueRange};
use std::collections::HashMap;
use std::fmt;

/// Longest run written as one entry; larger runs are split so that every
/// run length is exactly representable as an `f32`.
const MAX_RUN: usize = 1 << 24;

/// Largest grid the decoder will allocate.
const MAX_DECODED_CELLS: u64 = 1 << 28;

#[derive(Clone)]
pub struct FrequencyMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
    sigma: f32,
    disks: HashMap<u32, DiskMask>,
    kernels: HashMap<u32, GaussianKernel>,
}

impl FrequencyMap {
    /// Zero-filled map with the default Gaussian sigma.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
            sigma: DEFAULT_SIGMA,
            disks: HashMap::new(),
            kernels: HashMap::new(),
        }
    }

    /// Use `sigma` for subsequent Gaussian stamps.
    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self.kernels.clear();
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[x * self.height + y]
    }

    /// Column `x`, top to bottom.
    pub fn column(&self, x: usize) -> &[f32] {
        &self.values[x * self.height..(x + 1) * self.height]
    }

    /// Sum of all cells.
    pub fn total(&self) -> f64 {
        self.values.iter().map(|&v| v as f64).sum()
    }

    fn cell_index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(x as usize * self.height + y as usize)
    }

    /// Add 1 to every filled pixel of the radius-`r` disk mask centered at
    /// `(cx, cy)`. Pixels outside the grid are skipped; the zero-width mask
    /// of a zero radius stamps nothing.
    pub fn stamp_disk(&mut self, cx: i64, cy: i64, radius: u32) {
        if radius == 0 {
            return;
        }
        let mask = self
            .disks
            .entry(radius)
            .or_insert_with(|| DiskMask::new(radius));
        for (dx, dy) in mask.offsets() {
            let (Some(x), Some(y)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                continue;
            };
            if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                continue;
            }
            self.values[x as usize * self.height + y as usize] += 1.0;
        }
    }

    /// Add the `(2r+1)^2` Gaussian kernel centered at `(cx, cy)`; a zero
    /// radius adds 1 to the center pixel only. Pixels outside the grid are
    /// skipped.
    pub fn stamp_gaussian(&mut self, cx: i64, cy: i64, radius: u32) {
        let sigma = self.sigma;
        let kernel = self
            .kernels
            .entry(radius)
            .or_insert_with(|| GaussianKernel::new(radius, sigma));

        let r = radius as i64;
        let size = kernel.size();
        for i in 0..size {
            let x = match cx.checked_add(i as i64 - r) {
                Some(x) if x >= 0 && x < self.width as i64 => x,
                _ => continue,
            };
            let column = x as usize * self.height;
            for j in 0..size {
                let y = match cy.checked_add(j as i64 - r) {
                    Some(y) if y >= 0 && y < self.height as i64 => y,
                    _ => continue,
                };
                self.values[column + y as usize] += kernel.weight(i, j);
            }
        }
    }

    /// Stamp with the Gaussian kernel when `smooth`, the disk mask otherwise.
    pub fn stamp(&mut self, cx: i64, cy: i64, radius: u32, smooth: bool) {
        if smooth {
            self.stamp_gaussian(cx, cy, radius);
        } else {
            self.stamp_disk(cx, cy, radius);
        }
    }

    /// Add `value` at a single cell. Off-grid coordinates are ignored.
    pub fn add(&mut self, x: i64, y: i64, value: f32) {
        if let Some(idx) = self.cell_index(x, y) {
            self.values[idx] += value;
        }
    }

    /// Element-wise addition of `other` into this map.
    pub fn combine(&mut self, other: &FrequencyMap) -> PlotResult<()> {
        if self.width != other.width || self.height != other.height {
            return Err(PlotError::DimensionMismatch {
                left_width: self.width,
                left_height: self.height,
                right_width: other.width,
                right_height: other.height,
            });
        }
        for (dst, src) in self.values.iter_mut().zip(&other.values) {
            *dst += *src;
        }
        Ok(())
    }

    /// Smallest and largest cell values. An empty map reports `0..0`.
    pub fn value_range(&self) -> ValueRange {
        let mut iter = self.values.iter().copied();
        let Some(first) = iter.next() else {
            return ValueRange::new(0.0, 0.0);
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        ValueRange::new(min, max)
    }

    /// Colorize every cell through `gradient`.
    ///
    /// Without an explicit `range` the map's own [`value_range`] is used.
    /// With `skip_zeros`, cells at or below `range.min` stay transparent.
    ///
    /// [`value_range`]: FrequencyMap::value_range
    pub fn to_image(
        &self,
        range: Option<ValueRange>,
        skip_zeros: bool,
        gradient: &Gradient,
    ) -> ArgbImage {
        let range = range.unwrap_or_else(|| self.value_range());
        tracing::debug!(
            width = self.width,
            height = self.height,
            range = %range,
            skip_zeros,
            "Colorizing frequency map"
        );
        let mut image = ArgbImage::new(self.width, self.height);
        for x in 0..self.width {
            for (y, &value) in self.column(x).iter().enumerate() {
                if skip_zeros && value <= range.min {
                    continue;
                }
                image.set(x, y, gradient.colorize(value, &range).to_argb());
            }
        }
        image
    }

    /// Append the run-length encoded form of this map to `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_i32(self.width as i32);
        buf.put_i32(self.height as i32);
        if self.height == 0 {
            return;
        }

        for column in self.values.chunks_exact(self.height) {
            let mut y = 0;
            while y < column.len() {
                let value = column[y];
                let mut run = 1;
                while y + run < column.len() && column[y + run] == value && run < MAX_RUN {
                    run += 1;
                }
                if run == 1 && value > 0.0 {
                    buf.put_f32(-value);
                } else {
                    buf.put_f32(run as f32);
                    buf.put_f32(value);
                }
                y += run;
            }
        }
    }

    /// Encoded form as an owned buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(8 + 8 * self.width);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode a map from its run-length encoded form.
    pub fn decode<B: Buf>(buf: &mut B) -> PlotResult<Self> {
        let mut map = FrequencyMap::new(0, 0);
        map.decode_into(buf)?;
        Ok(map)
    }

    /// Overwrite this map with the decoded contents of `buf`, reallocating
    /// when the encoded dimensions differ. Kernel caches and sigma are kept.
    ///
    /// On error the map contents are unspecified but its dimensions still
    /// match its value storage.
    pub fn decode_into<B: Buf>(&mut self, buf: &mut B) -> PlotResult<()> {
        if buf.remaining() < 8 {
            return Err(PlotError::malformed("truncated header"));
        }
        let width = buf.get_i32();
        let height = buf.get_i32();
        if width < 0 || height < 0 {
            return Err(PlotError::malformed(format!(
                "negative dimensions {}x{}",
                width, height
            )));
        }
        if width as u64 * height as u64 > MAX_DECODED_CELLS {
            return Err(PlotError::malformed(format!(
                "dimensions {}x{} are too large",
                width, height
            )));
        }

        let (width, height) = (width as usize, height as usize);
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.values = vec![0.0; width * height];
        }

        for x in 0..width {
            let column = &mut self.values[x * height..(x + 1) * height];
            let mut y = 0;
            while y < height {
                let v = read_f32(buf, x, y)?;
                if v <= 0.0 {
                    column[y] = -v;
                    y += 1;
                    continue;
                }

                if v.fract() != 0.0 {
                    return Err(PlotError::malformed(format!(
                        "run length {} in column {} is not an integer",
                        v, x
                    )));
                }
                let run = v as u64;
                if run > (height - y) as u64 {
                    return Err(PlotError::malformed(format!(
                        "run of {} at row {} overflows column {} of height {}",
                        run, y, x, height
                    )));
                }
                let run = run as usize;
                let value = read_f32(buf, x, y)?;
                if value < 0.0 {
                    return Err(PlotError::malformed(format!(
                        "negative run value {} in column {}",
                        value, x
                    )));
                }
                column[y..y + run].fill(value);
                y += run;
            }
        }
        Ok(())
    }
}

fn read_f32<B: Buf>(buf: &mut B, x: usize, y: usize) -> PlotResult<f32> {
    if buf.remaining() < 4 {
        return Err(PlotError::malformed(format!(
            "truncated at column {}, row {}",
            x, y
        )));
    }
    let v = buf.get_f32();
    if !v.is_finite() {
        return Err(PlotError::malformed(format!(
            "non-finite value at column {}, row {}",
            x, y
        )));
    }
    Ok(v)
}

impl PartialEq for FrequencyMap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.values == other.values
    }
}

impl fmt::Debug for FrequencyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sigma", &self.sigma)
            .finish()
    }
}

impl fmt::Display for FrequencyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency Map: {}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_disk_mass() {
        let mut map = FrequencyMap::new(20, 20);
        map.stamp_disk(10, 10, 3);
        assert_eq!(map.total(), 28.0);
        assert_eq!(map.value_range(), ValueRange::new(0.0, 1.0));
    }

    #[test]
    fn test_stamp_disk_clipped_at_corner() {
        let mut map = FrequencyMap::new(4, 4);
        map.stamp_disk(0, 0, 3);
        assert!(map.total() < 28.0);
        assert!(map.total() > 0.0);
    }

    #[test]
    fn test_zero_run_is_pair() {
        let mut map = FrequencyMap::new(1, 3);
        map.add(0, 1, 2.0);
        let bytes = map.to_bytes();
        // header + (1, 0) + -2 + (1, 0)
        assert_eq!(bytes.len(), 8 + 8 + 4 + 8);
        let decoded = FrequencyMap::decode(&mut bytes.clone()).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_decode_into_reallocates() {
        let mut src = FrequencyMap::new(3, 2);
        src.add(2, 1, 5.0);
        let mut dst = FrequencyMap::new(10, 10);
        dst.decode_into(&mut src.to_bytes()).unwrap();
        assert_eq!(dst.width(), 3);
        assert_eq!(dst.height(), 2);
        assert_eq!(dst.get(2, 1), 5.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(FrequencyMap::new(4, 2).to_string(), "Frequency Map: 4x2");
    }
}
