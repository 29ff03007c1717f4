//! Tile output.
//!
//! Sinks receive the rendered tiles of a run and publish them on
//! [`TileSink::commit`]. Until then everything is staged next to the
//! target, so a failed or cancelled run leaves no partial output behind.

use crate::executor::PlotSummary;
use crate::partition::PartitionKind;
use heatmap_common::{PlotError, PlotResult, Rectangle};
use renderer::png::encode_png;
use renderer::ArgbImage;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A rendered image tagged with the world rectangle it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub world: Rectangle,
    /// Partition cell, `None` for data partitioning.
    pub cell_id: Option<i32>,
    /// Pixel position of the tile within the full image, y growing with
    /// data y.
    pub x0: i64,
    pub y0: i64,
    pub image: ArgbImage,
}

impl Tile {
    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }
}

/// Receives the tiles of a run.
pub trait TileSink {
    fn write_tile(&mut self, tile: &Tile) -> PlotResult<()>;

    /// Publish everything written so far.
    fn commit(&mut self, summary: &PlotSummary) -> PlotResult<()>;
}

fn check_target(path: &Path, overwrite: bool) -> PlotResult<()> {
    if path.exists() && !overwrite {
        return Err(PlotError::OutputExists(path.display().to_string()));
    }
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Stitches all tiles into one PNG image.
pub struct MosaicSink {
    path: PathBuf,
    overwrite: bool,
    vflip: bool,
    tiles: Vec<Tile>,
}

impl MosaicSink {
    /// Fails with `OutputExists` when `path` exists and `overwrite` is off.
    pub fn create(path: impl Into<PathBuf>, overwrite: bool) -> PlotResult<Self> {
        let path = path.into();
        check_target(&path, overwrite)?;
        Ok(Self {
            path,
            overwrite,
            vflip: false,
            tiles: Vec::new(),
        })
    }

    /// Flip the image so that data y grows upwards.
    pub fn with_vflip(mut self, vflip: bool) -> Self {
        self.vflip = vflip;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canvas of `width x height` with every tile drawn at its position.
    pub fn stitch(tiles: &[Tile], width: usize, height: usize, vflip: bool) -> ArgbImage {
        let mut canvas = ArgbImage::new(width, height);
        for tile in tiles {
            canvas.draw(&tile.image, tile.x0, tile.y0);
        }
        if vflip {
            canvas.flip_vertical();
        }
        canvas
    }
}

impl TileSink for MosaicSink {
    fn write_tile(&mut self, tile: &Tile) -> PlotResult<()> {
        self.tiles.push(tile.clone());
        Ok(())
    }

    fn commit(&mut self, summary: &PlotSummary) -> PlotResult<()> {
        check_target(&self.path, self.overwrite)?;
        let canvas = Self::stitch(&self.tiles, summary.width, summary.height, self.vflip);
        let png = encode_png(&canvas)?;

        let mut staged = NamedTempFile::new_in(parent_dir(&self.path))?;
        staged.write_all(&png)?;
        staged
            .persist(&self.path)
            .map_err(|e| PlotError::Io(format!("{}: {}", self.path.display(), e.error)))?;

        tracing::info!(
            path = %self.path.display(),
            tiles = self.tiles.len(),
            bytes = png.len(),
            "Wrote heat map image"
        );
        self.tiles.clear();
        Ok(())
    }
}

/// Manifest entry of one tile file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileEntry {
    pub file: String,
    pub cell_id: Option<i32>,
    pub world: Rectangle,
    pub x0: i64,
    pub y0: i64,
    pub width: usize,
    pub height: usize,
}

/// Contents of `tiles.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileManifest {
    pub width: usize,
    pub height: usize,
    pub world: Rectangle,
    pub partition: PartitionKind,
    pub sample_ratio: Option<f64>,
    pub vflip: bool,
    pub tiles: Vec<TileEntry>,
}

pub const MANIFEST_FILE: &str = "tiles.json";

/// Writes one PNG per tile into a directory, plus a `tiles.json` manifest.
pub struct TileDirSink {
    path: PathBuf,
    overwrite: bool,
    vflip: bool,
    staging: tempfile::TempDir,
    entries: Vec<TileEntry>,
    /// Tiles keep their data-space `y0` until the image height is known.
    pending_flip: Vec<(usize, usize)>,
}

impl TileDirSink {
    pub fn create(path: impl Into<PathBuf>, overwrite: bool) -> PlotResult<Self> {
        let path = path.into();
        check_target(&path, overwrite)?;
        let staging = tempfile::Builder::new()
            .prefix(".heatmap-tiles-")
            .tempdir_in(parent_dir(&path))?;
        Ok(Self {
            path,
            overwrite,
            vflip: false,
            staging,
            entries: Vec::new(),
            pending_flip: Vec::new(),
        })
    }

    pub fn with_vflip(mut self, vflip: bool) -> Self {
        self.vflip = vflip;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(tile: &Tile) -> String {
        match tile.cell_id {
            Some(id) => format!("tile-{:05}.png", id),
            None => "tile-data.png".to_string(),
        }
    }
}

impl TileSink for TileDirSink {
    fn write_tile(&mut self, tile: &Tile) -> PlotResult<()> {
        let png = if self.vflip {
            let mut image = tile.image.clone();
            image.flip_vertical();
            encode_png(&image)?
        } else {
            encode_png(&tile.image)?
        };

        let file = Self::file_name(tile);
        std::fs::write(self.staging.path().join(&file), &png)?;
        tracing::debug!(file = %file, bytes = png.len(), "Staged tile");

        if self.vflip {
            self.pending_flip.push((self.entries.len(), tile.height()));
        }
        self.entries.push(TileEntry {
            file,
            cell_id: tile.cell_id,
            world: tile.world,
            x0: tile.x0,
            y0: tile.y0,
            width: tile.width(),
            height: tile.height(),
        });
        Ok(())
    }

    fn commit(&mut self, summary: &PlotSummary) -> PlotResult<()> {
        check_target(&self.path, self.overwrite)?;
        for (i, tile_height) in self.pending_flip.drain(..) {
            let entry = &mut self.entries[i];
            entry.y0 = summary.height as i64 - entry.y0 - tile_height as i64;
        }

        let manifest = TileManifest {
            width: summary.width,
            height: summary.height,
            world: summary.world,
            partition: summary.partition,
            sample_ratio: summary.sample_ratio,
            vflip: self.vflip,
            tiles: std::mem::take(&mut self.entries),
        };
        let json = serde_json::to_vec_pretty(&manifest)?;
        std::fs::write(self.staging.path().join(MANIFEST_FILE), json)?;

        if self.path.is_dir() {
            std::fs::remove_dir_all(&self.path)?;
        } else if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        std::fs::rename(self.staging.path(), &self.path)?;

        tracing::info!(
            path = %self.path.display(),
            tiles = manifest.tiles.len(),
            "Wrote heat map tiles"
        );
        Ok(())
    }
}

/// Keeps tiles in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub tiles: Vec<Tile>,
    pub summary: Option<PlotSummary>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_committed(&self) -> bool {
        self.summary.is_some()
    }
}

impl TileSink for CollectSink {
    fn write_tile(&mut self, tile: &Tile) -> PlotResult<()> {
        self.tiles.push(tile.clone());
        Ok(())
    }

    fn commit(&mut self, summary: &PlotSummary) -> PlotResult<()> {
        self.summary = Some(summary.clone());
        Ok(())
    }
}
