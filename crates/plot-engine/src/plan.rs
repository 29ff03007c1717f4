//! Run planning: plotted world, image size, partitioning and sample ratio.

use crate::config::{PlotConfig, MAX_IMAGE_PIXELS};
use crate::index::GlobalIndex;
use crate::packer::RectanglePacker;
use crate::partition::{CellLayout, GridInfo, PartitionChoice, PartitionKind, SkewedCells};
use crate::source::{InputSummary, ShapeSource};
use heatmap_common::{CellInfo, PlotError, PlotResult, Rectangle};

/// Partitioning resolved for a run.
#[derive(Debug, Clone)]
pub enum PartitionPlan {
    Data,
    Grid(GridInfo),
    Skewed(SkewedCells),
}

impl PartitionPlan {
    pub fn kind(&self) -> PartitionKind {
        match self {
            PartitionPlan::Data => PartitionKind::Data,
            PartitionPlan::Grid(_) => PartitionKind::Grid,
            PartitionPlan::Skewed(_) => PartitionKind::Skewed,
        }
    }

    /// Cell layout of spatial partitionings.
    pub fn layout(&self) -> Option<&dyn CellLayout> {
        match self {
            PartitionPlan::Data => None,
            PartitionPlan::Grid(grid) => Some(grid as &dyn CellLayout),
            PartitionPlan::Skewed(cells) => Some(cells as &dyn CellLayout),
        }
    }
}

/// Everything decided before any worker starts.
#[derive(Debug, Clone)]
pub struct PlotPlan {
    /// Data rectangle drawn onto the image.
    pub world: Rectangle,
    pub width: usize,
    pub height: usize,
    pub partition: PartitionPlan,
    /// Probability of keeping a point, when adaptive sampling is on.
    pub sample_ratio: Option<f64>,
}

/// The plotted world: the query range when given, else the input MBR.
pub fn resolve_world(
    query_range: Option<Rectangle>,
    file_mbr: Option<Rectangle>,
) -> PlotResult<Rectangle> {
    let world = query_range.or(file_mbr).ok_or(PlotError::MissingMbr)?;
    if !world.has_area() {
        return Err(PlotError::DegenerateMbr(world.to_string()));
    }
    Ok(world)
}

/// Shrink one side of a `width x height` image so it has the aspect ratio
/// of `world`.
///
/// A world relatively wider than the image keeps the width and gets
/// `floor(world.h * width / world.w)` rows, rounded down to an even count
/// and at least 2. Otherwise the height is kept and the width becomes
/// `floor(world.w * height / world.h)`, at least 1.
pub fn adjust_aspect_ratio(world: &Rectangle, width: usize, height: usize) -> (usize, usize) {
    let world_ratio = world.width() / world.height();
    let image_ratio = width as f64 / height as f64;

    if world_ratio > image_ratio {
        let h = (world.height() * width as f64 / world.width()) as usize;
        (width, (h & !1).max(2))
    } else if world_ratio < image_ratio {
        let w = (world.width() * height as f64 / world.height()) as usize;
        (w.max(1), height)
    } else {
        (width, height)
    }
}

/// Map the partition parameter and the optional global index to a
/// partitioning.
///
/// An index with more than one cell is reused by both `grid` and `space`.
/// A single-cell index only caches an MBR and is ignored.
pub fn choose_partitioning(
    partition: &str,
    index_cells: Option<&[CellInfo]>,
) -> PlotResult<PartitionChoice> {
    match partition.to_lowercase().as_str() {
        "data" => Ok(PartitionChoice::Data),
        scheme @ ("grid" | "space") => match index_cells {
            Some(cells) if cells.len() > 1 => Ok(PartitionChoice::IndexedSkewed(cells.to_vec())),
            _ if scheme == "grid" => Ok(PartitionChoice::Grid),
            _ => Ok(PartitionChoice::PackedSkewed),
        },
        _ => Err(PlotError::UnknownPartition(partition.to_string())),
    }
}

/// Probability of keeping a point so that about `factor` points land on
/// every pixel. An empty input keeps everything.
pub fn sample_ratio(factor: f64, width: usize, height: usize, record_count: u64) -> f64 {
    if record_count == 0 {
        return 1.0;
    }
    factor * width as f64 * height as f64 / record_count as f64
}

/// Resolve the plan of a run.
pub fn build_plan(
    config: &PlotConfig,
    source: &dyn ShapeSource,
    index: Option<&dyn GlobalIndex>,
    packer: &dyn RectanglePacker,
) -> PlotResult<PlotPlan> {
    config.validate()?;

    let summary: Option<InputSummary> = if config.query_range.is_none() || config.adaptive_sample
    {
        Some(source.summary()?)
    } else {
        None
    };
    let world = resolve_world(config.query_range, summary.and_then(|s| s.mbr))?;
    tracing::info!(world = %world, "Resolved plot world");

    let index_cells = match index {
        Some(index) if config.partition.to_lowercase() != "data" => Some(index.cells()?),
        _ => None,
    };
    let choice = choose_partitioning(&config.partition, index_cells.as_deref())?;

    let (width, height) = if config.keep_aspect_ratio {
        adjust_aspect_ratio(&world, config.width, config.height)
    } else {
        (config.width, config.height)
    };
    if width as u64 * height as u64 > MAX_IMAGE_PIXELS {
        return Err(PlotError::ImageTooLarge {
            width: width as u64,
            height: height as u64,
        });
    }

    let partition = match choice {
        PartitionChoice::Data => {
            tracing::info!("Plot using data partitioning");
            PartitionPlan::Data
        }
        PartitionChoice::Grid => {
            let grid = GridInfo::with_cell_count(world, config.max_reducers);
            tracing::info!(
                columns = grid.columns(),
                rows = grid.rows(),
                "Grid partition then plot"
            );
            PartitionPlan::Grid(grid)
        }
        PartitionChoice::IndexedSkewed(cells) => {
            tracing::info!(cells = cells.len(), "Plot with the cells of the global index");
            PartitionPlan::Skewed(SkewedCells::new(cells)?)
        }
        PartitionChoice::PackedSkewed => {
            tracing::info!("Skewed partition then plot");
            PartitionPlan::Skewed(SkewedCells::new(packer.pack(config, &world)?)?)
        }
    };

    let sample_ratio = if config.adaptive_sample {
        let record_count = summary.map(|s| s.record_count).unwrap_or(0);
        Some(sample_ratio(config.sample_factor, width, height, record_count))
    } else {
        None
    };

    tracing::info!(width, height, ?sample_ratio, "Creating an image of {}x{}", width, height);

    Ok(PlotPlan {
        world,
        width,
        height,
        partition,
        sample_ratio,
    })
}
