//! Local map/reduce executor.
//!
//! Splits are mapped in parallel with rayon. Data partitioning ships each
//! worker's map through the run-length wire format and merges them on one
//! thread; spatial partitionings group routed centroids by cell id and
//! render the cells in parallel.

use crate::config::PlotConfig;
use crate::index::GlobalIndex;
use crate::output::{Tile, TileSink};
use crate::packer::{RectanglePacker, StrPacker};
use crate::partition::{
    render_cell, CellLayout, ColorSettings, DataPartitioner, PartitionKind, Sampler,
    SpatialRouter, StampSettings,
};
use crate::plan::{build_plan, PartitionPlan, PlotPlan};
use crate::source::ShapeSource;
use bytes::Bytes;
use heatmap_common::{Point, PlotError, PlotResult, Rectangle};
use rayon::prelude::*;
use renderer::FrequencyMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation flag shared between a run and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been tripped.
    pub fn check(&self) -> PlotResult<()> {
        if self.is_cancelled() {
            Err(PlotError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSummary {
    pub width: usize,
    pub height: usize,
    pub world: Rectangle,
    pub partition: PartitionKind,
    pub sample_ratio: Option<f64>,
    pub tiles: usize,
    pub shapes_read: u64,
    /// Shapes stamped (data) or routed to at least one cell (grid, skewed).
    pub shapes_plotted: u64,
}

#[derive(Default)]
struct Counters {
    read: AtomicU64,
    plotted: AtomicU64,
}

/// Runs a plot over a shape source.
pub struct Plotter<'a> {
    config: &'a PlotConfig,
    source: &'a dyn ShapeSource,
    index: Option<&'a dyn GlobalIndex>,
    packer: Option<&'a dyn RectanglePacker>,
    cancel: CancelToken,
}

impl<'a> Plotter<'a> {
    pub fn new(config: &'a PlotConfig, source: &'a dyn ShapeSource) -> Self {
        Self {
            config,
            source,
            index: None,
            packer: None,
            cancel: CancelToken::new(),
        }
    }

    /// Reuse the cells of a global index for `grid` and `space`.
    pub fn with_index(mut self, index: &'a dyn GlobalIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Packer for `space` partitioning without an index. Defaults to a
    /// [`StrPacker`] over the source.
    pub fn with_packer(mut self, packer: &'a dyn RectanglePacker) -> Self {
        self.packer = Some(packer);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn plan(&self) -> PlotResult<PlotPlan> {
        let default_packer = StrPacker::new(self.source);
        let packer: &dyn RectanglePacker = match self.packer {
            Some(packer) => packer,
            None => &default_packer,
        };
        build_plan(self.config, self.source, self.index, packer)
    }

    /// Plan and render the run, returning its tiles without writing them.
    pub fn render(&self) -> PlotResult<(Vec<Tile>, PlotSummary)> {
        let started = Instant::now();
        let plan = self.plan()?;
        self.cancel.check()?;

        let counters = Counters::default();
        let tiles = match &plan.partition {
            PartitionPlan::Data => self.render_data(&plan, &counters)?,
            PartitionPlan::Grid(grid) => self.render_spatial(&plan, grid, &counters)?,
            PartitionPlan::Skewed(cells) => self.render_spatial(&plan, cells, &counters)?,
        };

        let summary = PlotSummary {
            width: plan.width,
            height: plan.height,
            world: plan.world,
            partition: plan.partition.kind(),
            sample_ratio: plan.sample_ratio,
            tiles: tiles.len(),
            shapes_read: counters.read.load(Ordering::Relaxed),
            shapes_plotted: counters.plotted.load(Ordering::Relaxed),
        };
        tracing::info!(
            tiles = summary.tiles,
            shapes_read = summary.shapes_read,
            shapes_plotted = summary.shapes_plotted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rendered heat map"
        );
        Ok((tiles, summary))
    }

    /// Render the run and hand its tiles to `sink`. The sink is committed
    /// only when every tile was written and the run was not cancelled.
    pub fn run(&self, sink: &mut dyn TileSink) -> PlotResult<PlotSummary> {
        let (tiles, summary) = self.render()?;
        for tile in &tiles {
            self.cancel.check()?;
            sink.write_tile(tile)?;
        }
        self.cancel.check()?;
        sink.commit(&summary)?;
        Ok(summary)
    }

    fn stamp_settings(&self) -> StampSettings {
        StampSettings {
            radius: self.config.radius,
            smooth: self.config.smooth,
            sigma: self.config.sigma,
        }
    }

    fn color_settings(&self) -> ColorSettings {
        ColorSettings {
            value_range: self.config.value_range,
            skip_zeros: self.config.skip_zeros,
            gradient: self.config.gradient(),
        }
    }

    fn render_data(&self, plan: &PlotPlan, counters: &Counters) -> PlotResult<Vec<Tile>> {
        let partitioner =
            DataPartitioner::new(plan.world, plan.width, plan.height, self.stamp_settings());

        let encoded: Vec<Bytes> = (0..self.source.split_count())
            .into_par_iter()
            .map(|split| -> PlotResult<Bytes> {
                let mut sampler = Sampler::new(plan.sample_ratio, self.config.seed, split);
                let mut map = partitioner.new_map();
                for batch in self.source.read_split(split)? {
                    self.cancel.check()?;
                    let batch = batch?;
                    counters.read.fetch_add(batch.len() as u64, Ordering::Relaxed);
                    let stamped = partitioner.accumulate(&mut map, &batch.shapes, &mut sampler);
                    counters.plotted.fetch_add(stamped, Ordering::Relaxed);
                }
                tracing::debug!(split, "Map task finished");
                Ok(map.to_bytes())
            })
            .collect::<PlotResult<_>>()?;
        self.cancel.check()?;

        let mut merged = partitioner.new_map();
        for mut bytes in encoded {
            let map = FrequencyMap::decode(&mut bytes)?;
            merged.combine(&map)?;
        }

        let image = self.color_settings().render(&merged);
        Ok(vec![Tile {
            world: plan.world,
            cell_id: None,
            x0: 0,
            y0: 0,
            image,
        }])
    }

    fn render_spatial(
        &self,
        plan: &PlotPlan,
        layout: &dyn CellLayout,
        counters: &Counters,
    ) -> PlotResult<Vec<Tile>> {
        let router = SpatialRouter::new(
            layout,
            self.config.query_range,
            self.config.radius,
            plan.width,
            plan.height,
        );

        let routed: Vec<Vec<(i32, Point)>> = (0..self.source.split_count())
            .into_par_iter()
            .map(|split| -> PlotResult<Vec<(i32, Point)>> {
                let mut sampler = Sampler::new(plan.sample_ratio, self.config.seed, split);
                let mut out = Vec::new();
                let mut cells = Vec::new();
                for batch in self.source.read_split(split)? {
                    self.cancel.check()?;
                    let batch = batch?;
                    counters.read.fetch_add(batch.len() as u64, Ordering::Relaxed);
                    for shape in &batch.shapes {
                        if !sampler.keep(shape) {
                            continue;
                        }
                        let Some(center) = shape.centroid().filter(Point::is_finite) else {
                            continue;
                        };
                        router.route(&center, &mut cells);
                        if !cells.is_empty() {
                            counters.plotted.fetch_add(1, Ordering::Relaxed);
                        }
                        out.extend(cells.iter().map(|&id| (id, center)));
                    }
                }
                tracing::debug!(split, routed = out.len(), "Map task finished");
                Ok(out)
            })
            .collect::<PlotResult<_>>()?;
        self.cancel.check()?;

        let mut groups: BTreeMap<i32, Vec<Point>> = BTreeMap::new();
        for (cell_id, center) in routed.into_iter().flatten() {
            groups.entry(cell_id).or_default().push(center);
        }
        tracing::debug!(cells = groups.len(), "Shuffled centroids to cells");

        let stamp = self.stamp_settings();
        let colors = self.color_settings();
        let rendered: Vec<Option<Tile>> = groups
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(cell_id, centers)| -> PlotResult<Option<Tile>> {
                self.cancel.check()?;
                let tile = render_cell(
                    layout,
                    cell_id,
                    &centers,
                    plan.width,
                    plan.height,
                    &stamp,
                    &colors,
                )?;
                Ok(tile.map(|(cell, pixels, image)| Tile {
                    world: cell.rect,
                    cell_id: Some(cell_id),
                    x0: pixels.x0,
                    y0: pixels.y0,
                    image,
                }))
            })
            .collect::<PlotResult<_>>()?;

        Ok(rendered.into_iter().flatten().collect())
    }
}

/// Plot `source` into `sink` with the default packer and no global index.
pub fn run_plot(
    config: &PlotConfig,
    source: &dyn ShapeSource,
    sink: &mut dyn TileSink,
    cancel: &CancelToken,
) -> PlotResult<PlotSummary> {
    Plotter::new(config, source)
        .with_cancel(cancel.clone())
        .run(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let shared = token.clone();
        assert!(token.check().is_ok());
        shared.cancel();
        assert!(matches!(token.check(), Err(PlotError::Cancelled)));
    }
}
