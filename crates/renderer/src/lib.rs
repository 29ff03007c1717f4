//! Raster side of heat map plotting.
//!
//! - [`kernel`]: disk mask and Gaussian stamp kernels
//! - [`frequency`]: the per-pixel accumulator and its run-length wire format
//! - [`gradient`]: hue and color gradients
//! - [`image`]: ARGB rasters and tile stitching
//! - [`png`]: PNG encoding (indexed or RGBA)

pub mod frequency;
pub mod gradient;
pub mod image;
pub mod kernel;
pub mod png;

pub use frequency::FrequencyMap;
pub use gradient::{Gradient, GradientMode};
pub use image::ArgbImage;
pub use kernel::{DiskMask, GaussianKernel, DEFAULT_SIGMA};
