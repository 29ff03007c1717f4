//! Packing a data sample into skewed partition cells.

use crate::config::PlotConfig;
use crate::partition::{CellLayout, GridInfo};
use crate::source::ShapeSource;
use heatmap_common::{CellInfo, Point, PlotResult, Rectangle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default number of centroids sampled for packing.
pub const DEFAULT_SAMPLE_SIZE: usize = 100_000;

/// Produces the cells of a skewed partitioning.
pub trait RectanglePacker: Send + Sync {
    fn pack(&self, config: &PlotConfig, file_mbr: &Rectangle) -> PlotResult<Vec<CellInfo>>;
}

/// Sort-tile-recursive packer over a sample of shape centroids.
///
/// The sample is sorted by x and cut into vertical slabs holding equal
/// shares of it, then each slab is sorted by y and cut into cells the same
/// way. Cell boundaries lie halfway between neighbouring sample points, so
/// the cells tile `file_mbr` without gaps or overlaps. Dense regions get
/// narrow cells.
pub struct StrPacker<'a> {
    source: &'a dyn ShapeSource,
    sample_size: usize,
}

impl<'a> StrPacker<'a> {
    pub fn new(source: &'a dyn ShapeSource) -> Self {
        Self {
            source,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// Bernoulli sample of centroids, sized to about `sample_size`.
    fn sample(&self, seed: Option<u64>) -> PlotResult<Vec<Point>> {
        let record_count = self.source.summary()?.record_count;
        let ratio = if record_count as usize > self.sample_size {
            self.sample_size as f64 / record_count as f64
        } else {
            1.0
        };
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut sample = Vec::new();
        for split in 0..self.source.split_count() {
            for batch in self.source.read_split(split)? {
                for shape in batch?.shapes {
                    if ratio < 1.0 && rng.gen::<f64>() > ratio {
                        continue;
                    }
                    if let Some(center) = shape.centroid() {
                        sample.push(center);
                    }
                }
            }
        }
        Ok(sample)
    }
}

impl RectanglePacker for StrPacker<'_> {
    fn pack(&self, config: &PlotConfig, file_mbr: &Rectangle) -> PlotResult<Vec<CellInfo>> {
        let cell_count = config.max_reducers.max(1);
        let mut sample = self.sample(config.seed)?;
        let cells = pack_str(&mut sample, file_mbr, cell_count);
        tracing::info!(
            sample = sample.len(),
            cells = cells.len(),
            "Packed sample into skewed cells"
        );
        Ok(cells)
    }
}

/// Sort-tile-recursive packing of `points` into about `cell_count` cells
/// covering `extent`. Cells are numbered from 1.
///
/// Falls back to a uniform grid when there are no points.
pub fn pack_str(points: &mut [Point], extent: &Rectangle, cell_count: usize) -> Vec<CellInfo> {
    if points.is_empty() {
        return GridInfo::with_cell_count(*extent, cell_count).cells();
    }

    let slabs = (cell_count as f64).sqrt().ceil().max(1.0) as usize;
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    let x_bounds = boundaries(points, slabs, extent.min_x, extent.max_x, |p| p.x);

    let mut cells = Vec::with_capacity(cell_count);
    let mut start = 0;
    for slab in 0..slabs {
        let end = (slab + 1) * points.len() / slabs;
        let rows = cell_count / slabs + usize::from(slab < cell_count % slabs);
        let members = &mut points[start..end];
        start = end;

        members.sort_by(|a, b| a.y.total_cmp(&b.y));
        let y_bounds = boundaries(members, rows.max(1), extent.min_y, extent.max_y, |p| p.y);
        for pair in y_bounds.windows(2) {
            let rect = Rectangle::new(x_bounds[slab], pair[0], x_bounds[slab + 1], pair[1]);
            if rect.has_area() {
                cells.push(rect);
            }
        }
    }

    cells
        .into_iter()
        .enumerate()
        .map(|(i, rect)| CellInfo::new(i as i32 + 1, rect))
        .collect()
}

/// `parts + 1` non-decreasing cut positions from `lo` to `hi` splitting the
/// sorted `points` into equal shares.
fn boundaries(
    points: &[Point],
    parts: usize,
    lo: f64,
    hi: f64,
    coord: impl Fn(&Point) -> f64,
) -> Vec<f64> {
    let mut cuts = Vec::with_capacity(parts + 1);
    cuts.push(lo);
    for i in 1..parts {
        let prev = cuts[cuts.len() - 1];
        let k = i * points.len() / parts;
        let cut = if k == 0 || k >= points.len() {
            lo + (hi - lo) * i as f64 / parts as f64
        } else {
            (coord(&points[k - 1]) + coord(&points[k])) / 2.0
        };
        cuts.push(cut.max(prev).min(hi));
    }
    cuts.push(hi);
    cuts
}
