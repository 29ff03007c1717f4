//! Partitioning strategies for parallel accumulation.
//!
//! - **Data**: every worker accumulates a full-size map over its split and
//!   all maps are merged into one image.
//! - **Grid**: the world is cut into a uniform grid; shapes are routed to
//!   every cell their stamp can touch and each cell renders its own tile.
//! - **Skewed**: as grid, but over irregular cells taken from a global
//!   index or packed from a sample of the input.

pub mod data;
pub mod grid;
pub mod skewed;

pub use data::DataPartitioner;
pub use grid::GridInfo;
pub use skewed::SkewedCells;

use heatmap_common::{CellInfo, Point, PlotResult, Rectangle, Shape, ValueRange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use renderer::{ArgbImage, FrequencyMap, Gradient};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of partition selection.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionChoice {
    Data,
    /// Uniform grid over the world.
    Grid,
    /// Cells of an existing global index.
    IndexedSkewed(Vec<CellInfo>),
    /// Cells produced by the rectangle packer.
    PackedSkewed,
}

/// Partition kind, as reported in run summaries and tile manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Data,
    Grid,
    Skewed,
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKind::Data => f.write_str("data"),
            PartitionKind::Grid => f.write_str("grid"),
            PartitionKind::Skewed => f.write_str("skewed"),
        }
    }
}

/// `floor(x + 0.5)`: halves round towards positive infinity.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Pixel rectangle of a cell inside the full image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelTile {
    pub x0: i64,
    pub y0: i64,
    pub width: usize,
    pub height: usize,
}

impl PixelTile {
    /// Pixel tile of `cell` when `extent` is drawn onto a `width x height`
    /// image: the minimum corner is floored and the maximum corner ceiled.
    pub fn of(cell: &Rectangle, extent: &Rectangle, width: usize, height: usize) -> Self {
        let sx = width as f64 / extent.width();
        let sy = height as f64 / extent.height();
        let x1 = ((cell.min_x - extent.min_x) * sx).floor() as i64;
        let y1 = ((cell.min_y - extent.min_y) * sy).floor() as i64;
        let x2 = ((cell.max_x - extent.min_x) * sx).ceil() as i64;
        let y2 = ((cell.max_y - extent.min_y) * sy).ceil() as i64;
        Self {
            x0: x1,
            y0: y1,
            width: (x2 - x1).max(0) as usize,
            height: (y2 - y1).max(0) as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// How each shape is stamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampSettings {
    pub radius: u32,
    pub smooth: bool,
    pub sigma: f32,
}

impl StampSettings {
    pub fn new_map(&self, width: usize, height: usize) -> FrequencyMap {
        FrequencyMap::new(width, height).with_sigma(self.sigma)
    }

    pub fn apply(&self, map: &mut FrequencyMap, cx: i64, cy: i64) {
        map.stamp(cx, cy, self.radius, self.smooth);
    }
}

/// How accumulated maps are turned into images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSettings {
    pub value_range: Option<ValueRange>,
    pub skip_zeros: bool,
    pub gradient: Gradient,
}

impl ColorSettings {
    pub fn render(&self, map: &FrequencyMap) -> ArgbImage {
        map.to_image(self.value_range, self.skip_zeros, &self.gradient)
    }
}

/// Per-worker adaptive sampler.
///
/// A point survives when a uniform draw in `[0, 1)` does not exceed the
/// ratio. Other shapes always survive.
pub struct Sampler {
    ratio: Option<f64>,
    rng: StdRng,
}

impl Sampler {
    /// Sampler for worker `worker`. With a `seed`, worker `i` draws from
    /// `seed + i`; otherwise from entropy.
    pub fn new(ratio: Option<f64>, seed: Option<u64>, worker: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker as u64)),
            None => StdRng::from_entropy(),
        };
        Self { ratio, rng }
    }

    /// Sampler that keeps everything.
    pub fn keep_all() -> Self {
        Self::new(None, Some(0), 0)
    }

    pub fn keep(&mut self, shape: &Shape) -> bool {
        match self.ratio {
            Some(ratio) if shape.is_point() => self.rng.gen::<f64>() <= ratio,
            _ => true,
        }
    }
}

/// Cell geometry shared by the grid and skewed partitioners.
pub trait CellLayout: Send + Sync {
    /// Rectangle the full image is drawn from.
    fn extent(&self) -> Rectangle;

    fn cell_count(&self) -> usize;

    /// Append the ids of every cell `rect` overlaps.
    fn overlapping_cells(&self, rect: &Rectangle, out: &mut Vec<i32>);

    fn cell(&self, cell_id: i32) -> PlotResult<CellInfo>;

    fn cells(&self) -> Vec<CellInfo>;
}

/// Routes shape centroids to the cells their stamps can reach.
pub struct SpatialRouter<'a> {
    layout: &'a dyn CellLayout,
    query_range: Option<Rectangle>,
    radius_x: f64,
    radius_y: f64,
}

impl<'a> SpatialRouter<'a> {
    /// The pixel radius is converted to data units of the layout extent
    /// drawn onto a `width x height` image.
    pub fn new(
        layout: &'a dyn CellLayout,
        query_range: Option<Rectangle>,
        radius: u32,
        width: usize,
        height: usize,
    ) -> Self {
        let extent = layout.extent();
        Self {
            layout,
            query_range,
            radius_x: radius as f64 * extent.width() / width as f64,
            radius_y: radius as f64 * extent.height() / height as f64,
        }
    }

    pub fn radius(&self) -> (f64, f64) {
        (self.radius_x, self.radius_y)
    }

    /// Cells receiving `center`. Nothing is routed when the buffered
    /// centroid misses the query range.
    pub fn route(&self, center: &Point, out: &mut Vec<i32>) {
        out.clear();
        let reach = center.mbr().buffer(self.radius_x, self.radius_y);
        if let Some(query) = &self.query_range {
            if !reach.intersects(query) {
                return;
            }
        }
        self.layout.overlapping_cells(&reach, out);
    }
}

/// Render the tile of one cell from the centroids routed to it.
///
/// The tile is sized by its [`PixelTile`] within the layout extent and each
/// centroid is projected relative to the cell. Returns `None` for cells
/// whose tile has no pixels.
pub fn render_cell(
    layout: &dyn CellLayout,
    cell_id: i32,
    centers: &[Point],
    width: usize,
    height: usize,
    stamp: &StampSettings,
    colors: &ColorSettings,
) -> PlotResult<Option<(CellInfo, PixelTile, ArgbImage)>> {
    let cell = layout.cell(cell_id)?;
    let tile = PixelTile::of(&cell.rect, &layout.extent(), width, height);
    if tile.is_empty() {
        tracing::debug!(cell_id, "Skipping cell with an empty pixel tile");
        return Ok(None);
    }

    let mut map = stamp.new_map(tile.width, tile.height);
    let sx = tile.width as f64 / cell.width();
    let sy = tile.height as f64 / cell.height();
    for p in centers {
        let cx = round_half_up((p.x - cell.rect.min_x) * sx);
        let cy = round_half_up((p.y - cell.rect.min_y) * sy);
        stamp.apply(&mut map, cx, cy);
    }

    Ok(Some((cell, tile, colors.render(&map))))
}
