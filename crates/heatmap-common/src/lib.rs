//! Common types shared across the heat map plotting crates.

pub mod color;
pub mod error;
pub mod geometry;
pub mod range;
pub mod shape;

pub use color::{Color, ColorParseError};
pub use error::{PlotError, PlotResult};
pub use geometry::{CellInfo, Point, RectParseError, Rectangle};
pub use range::ValueRange;
pub use shape::Shape;
