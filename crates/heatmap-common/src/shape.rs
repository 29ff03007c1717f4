//! Input shapes reduced to what the heat map needs: a centroid.

use crate::geometry::{Point, Rectangle};
use serde::{Deserialize, Serialize};

/// A spatial record as seen by the plotter.
///
/// `Other` stands for any geometry that only exposes its MBR (polygons,
/// line strings, OGC geometries). An `Other` without an MBR is an empty
/// geometry and never contributes to the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Point(Point),
    Rectangle(Rectangle),
    Other { mbr: Option<Rectangle> },
}

impl Shape {
    pub fn point(x: f64, y: f64) -> Self {
        Shape::Point(Point::new(x, y))
    }

    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Shape::Rectangle(Rectangle::new(min_x, min_y, max_x, max_y))
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Shape::Point(_))
    }

    pub fn mbr(&self) -> Option<Rectangle> {
        match self {
            Shape::Point(p) => Some(p.mbr()),
            Shape::Rectangle(r) => Some(*r),
            Shape::Other { mbr } => *mbr,
        }
    }

    /// The point this shape is plotted at, or `None` when it has no extent.
    pub fn centroid(&self) -> Option<Point> {
        match self {
            Shape::Point(p) => Some(*p),
            Shape::Rectangle(r) => Some(r.center()),
            Shape::Other { mbr } => mbr.map(|m| m.center()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroids() {
        assert_eq!(Shape::point(1.0, 2.0).centroid(), Some(Point::new(1.0, 2.0)));
        assert_eq!(
            Shape::rect(0.0, 0.0, 4.0, 2.0).centroid(),
            Some(Point::new(2.0, 1.0))
        );
        let other = Shape::Other {
            mbr: Some(Rectangle::new(-2.0, -2.0, 0.0, 2.0)),
        };
        assert_eq!(other.centroid(), Some(Point::new(-1.0, 0.0)));
        assert_eq!(Shape::Other { mbr: None }.centroid(), None);
    }
}
