//! Configuration for a heat map plot run.

use heatmap_common::{Color, PlotError, PlotResult, Rectangle, ValueRange};
use renderer::{Gradient, GradientMode, DEFAULT_SIGMA};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest image, in pixels, a run may produce.
pub const MAX_IMAGE_PIXELS: u64 = 1 << 28;

/// Largest stamp radius, in pixels.
pub const MAX_RADIUS: u32 = 4096;

/// Partition schemes understood by the planner.
pub const PARTITION_SCHEMES: [&str; 3] = ["data", "grid", "space"];

/// Everything a plot run needs to know besides its input and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Requested image width in pixels, before aspect-ratio correction.
    pub width: usize,

    /// Requested image height in pixels, before aspect-ratio correction.
    pub height: usize,

    /// Stamp radius in pixels.
    pub radius: u32,

    /// Shrink one image dimension so pixels stay square in data space.
    pub keep_aspect_ratio: bool,

    /// Only shapes near this rectangle are plotted. It also becomes the
    /// plotted world when set.
    pub query_range: Option<Rectangle>,

    /// Fixed colorization range. Each tile derives its own when unset.
    pub value_range: Option<ValueRange>,

    /// Color of the lowest values.
    pub color1: Color,

    /// Color of the highest values.
    pub color2: Color,

    pub gradient: GradientMode,

    /// One of `data`, `grid` or `space`.
    pub partition: String,

    /// Leave cells at or below the range minimum transparent.
    pub skip_zeros: bool,

    /// Stamp Gaussian kernels instead of hard disks.
    pub smooth: bool,

    /// Gaussian standard deviation in pixels.
    pub sigma: f32,

    /// Randomly drop points so roughly `sample_factor` points land per pixel.
    pub adaptive_sample: bool,

    pub sample_factor: f64,

    /// Seed for the sampling PRNG. Entropy is used when unset.
    pub seed: Option<u64>,

    /// Number of grid cells / packed cells for spatial partitioning.
    pub max_reducers: usize,

    /// Replace an existing output.
    pub overwrite: bool,

    /// Flip output images so that data y grows upwards.
    pub vflip: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            radius: 5,
            keep_aspect_ratio: true,
            query_range: None,
            value_range: None,
            color1: Color::BLUE,
            color2: Color::RED,
            gradient: GradientMode::Hue,
            partition: "data".to_string(),
            skip_zeros: false,
            smooth: false,
            sigma: DEFAULT_SIGMA,
            adaptive_sample: false,
            sample_factor: 1.0,
            seed: None,
            max_reducers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            overwrite: false,
            vflip: false,
        }
    }
}

impl PlotConfig {
    /// Defaults overlaid with `HEATMAP_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a JSON configuration file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> PlotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlotError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Overlay `HEATMAP_*` environment variables onto this configuration.
    ///
    /// Unparsable values are ignored, leaving the current setting in place.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("HEATMAP_WIDTH") {
            self.width = v;
        }
        if let Some(v) = env_parse("HEATMAP_HEIGHT") {
            self.height = v;
        }
        if let Some(v) = env_parse("HEATMAP_RADIUS") {
            self.radius = v;
        }
        if let Some(v) = env_flag("HEATMAP_KEEP_RATIO") {
            self.keep_aspect_ratio = v;
        }
        if let Some(v) = env_parse::<ValueRange>("HEATMAP_VALUE_RANGE") {
            self.value_range = Some(v);
        }
        if let Some(v) = env_parse("HEATMAP_COLOR1") {
            self.color1 = v;
        }
        if let Some(v) = env_parse("HEATMAP_COLOR2") {
            self.color2 = v;
        }
        if let Some(v) = env_parse("HEATMAP_GRADIENT") {
            self.gradient = v;
        }
        if let Ok(v) = std::env::var("HEATMAP_PARTITION") {
            self.partition = v.to_lowercase();
        }
        if let Some(v) = env_flag("HEATMAP_SKIP_ZEROS") {
            self.skip_zeros = v;
        }
        if let Some(v) = env_flag("HEATMAP_SMOOTH") {
            self.smooth = v;
        }
        if let Some(v) = env_parse("HEATMAP_SIGMA") {
            self.sigma = v;
        }
        if let Some(v) = env_flag("HEATMAP_SAMPLE") {
            self.adaptive_sample = v;
        }
        if let Some(v) = env_parse("HEATMAP_SAMPLE_FACTOR") {
            self.sample_factor = v;
        }
        if let Some(v) = env_parse("HEATMAP_SEED") {
            self.seed = Some(v);
        }
        if let Some(v) = env_parse("HEATMAP_REDUCERS") {
            self.max_reducers = v;
        }
    }

    /// Check the configuration before any worker starts.
    pub fn validate(&self) -> PlotResult<()> {
        let pixels = self.width as u64 * self.height as u64;
        if self.width == 0 || self.height == 0 || pixels > MAX_IMAGE_PIXELS {
            return Err(PlotError::ImageTooLarge {
                width: self.width as u64,
                height: self.height as u64,
            });
        }

        if self.radius == 0 || self.radius > MAX_RADIUS {
            return Err(PlotError::invalid_parameter(
                "radius",
                format!("{} is outside 1..={}", self.radius, MAX_RADIUS),
            ));
        }

        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(PlotError::invalid_parameter(
                "sigma",
                format!("{} must be a positive number", self.sigma),
            ));
        }

        if !self.sample_factor.is_finite() || self.sample_factor <= 0.0 {
            return Err(PlotError::invalid_parameter(
                "sample-factor",
                format!("{} must be a positive number", self.sample_factor),
            ));
        }

        if self.max_reducers == 0 {
            return Err(PlotError::invalid_parameter("reducers", "must be at least 1"));
        }

        if let Some(range) = &self.value_range {
            range.validate()?;
        }

        if let Some(rect) = &self.query_range {
            if !rect.has_area() {
                return Err(PlotError::DegenerateMbr(format!("query range {}", rect)));
            }
        }

        let partition = self.partition.to_lowercase();
        if !PARTITION_SCHEMES.contains(&partition.as_str()) {
            return Err(PlotError::UnknownPartition(self.partition.clone()));
        }

        Ok(())
    }

    /// The gradient described by `color1`, `color2` and `gradient`.
    pub fn gradient(&self) -> Gradient {
        Gradient::new(self.color1, self.color2, self.gradient)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}
