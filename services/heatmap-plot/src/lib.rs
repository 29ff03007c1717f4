//! Command-line heat map plotter.
//!
//! Reads shapes from a text file, plots them with the plot engine on the
//! local machine and writes either a single PNG or a directory of tiles.

pub mod input;
pub mod params;

use heatmap_common::PlotResult;
use plot_engine::{MosaicSink, PlotConfig, TileDirSink, TileSink};
use std::path::Path;

pub use input::{ShapeFormat, TextShapeSource};
pub use params::{apply_params, RunOptions};

/// Sink for `output`: a stitched PNG when it ends in `.png`, a tile
/// directory otherwise.
pub fn open_sink(output: &Path, config: &PlotConfig) -> PlotResult<Box<dyn TileSink + Send>> {
    let is_png = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if is_png {
        Ok(Box::new(
            MosaicSink::create(output, config.overwrite)?.with_vflip(config.vflip),
        ))
    } else {
        Ok(Box::new(
            TileDirSink::create(output, config.overwrite)?.with_vflip(config.vflip),
        ))
    }
}
