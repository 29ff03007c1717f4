//! Heat Map Plot Engine
//!
//! Turns a splittable source of shapes into heat map tiles. A run is
//! planned once (world, image size, partitioning, sample ratio), then
//! executed as a local map/reduce over the input splits:
//!
//! - **Data partitioning**: each split stamps into a full-size map; maps
//!   travel in their run-length wire format and are merged into one image.
//! - **Grid / skewed partitioning**: centroids are routed to every cell
//!   their stamp can reach and each cell renders its own tile.
//!
//! # Architecture
//!
//! ```text
//! PlotConfig + ShapeSource
//!      │
//!      ▼
//! build_plan()
//!      │
//!      ├─► World: query range or input MBR
//!      ├─► Aspect-ratio correction
//!      ├─► PartitionChoice (data | grid | indexed skewed | packed skewed)
//!      └─► Sample ratio
//!               │
//!               ▼
//! Plotter::run()
//!      │
//!      ├─► map:    rayon over splits, sample, stamp or route
//!      ├─► reduce: merge maps / render one tile per cell
//!      │
//!      ▼
//! TileSink (mosaic PNG | tile directory + tiles.json)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use plot_engine::{MemorySource, MosaicSink, PlotConfig, Plotter};
//!
//! let config = PlotConfig { width: 512, height: 512, ..Default::default() };
//! let source = MemorySource::new(shapes, 8, 4096);
//! let mut sink = MosaicSink::create("heat.png", config.overwrite)?;
//! let summary = Plotter::new(&config, &source).run(&mut sink)?;
//! ```

pub mod config;
pub mod executor;
pub mod index;
pub mod output;
pub mod packer;
pub mod partition;
pub mod plan;
pub mod source;

// Re-export commonly used types at crate root
pub use config::{PlotConfig, MAX_IMAGE_PIXELS, MAX_RADIUS};
pub use executor::{run_plot, CancelToken, PlotSummary, Plotter};
pub use index::{CellFileIndex, GlobalIndex};
pub use output::{CollectSink, MosaicSink, Tile, TileDirSink, TileManifest, TileSink};
pub use packer::{RectanglePacker, StrPacker};
pub use partition::{
    CellLayout, DataPartitioner, GridInfo, PartitionChoice, PartitionKind, PixelTile,
    SkewedCells,
};
pub use plan::{
    adjust_aspect_ratio, build_plan, choose_partitioning, resolve_world, sample_ratio,
    PartitionPlan, PlotPlan,
};
pub use source::{InputSummary, MemorySource, ShapeBatch, ShapeSource};
