//! Geometry primitives in data space.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Degenerate rectangle covering only this point.
    pub fn mbr(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle in data coordinates.
///
/// The same type serves as shape MBR, query range, world rectangle and
/// partition cell extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rectangle {
    /// Create a new rectangle from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// An inverted rectangle that any `expand` call replaces.
    pub fn empty() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            max_x: -f64::MAX,
            max_y: -f64::MAX,
        }
    }

    /// Parse "x1,y1,x2,y2". Corners may be given in any order.
    pub fn from_csv(s: &str) -> Result<Self, RectParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(RectParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| RectParseError::InvalidNumber(part.to_string()))?;
        }

        let [x1, y1, x2, y2] = values;
        Ok(Self::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)))
    }

    /// Width of the rectangle in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when both sides are strictly positive.
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// False for the `empty()` sentinel and any other inverted rectangle.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow by `dx` on the left and right and by `dy` on the top and bottom.
    pub fn buffer(&self, dx: f64, dy: f64) -> Rectangle {
        Rectangle::new(
            self.min_x - dx,
            self.min_y - dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// Interior intersection test. Rectangles that only share an edge do
    /// not intersect.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two rectangles.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        if !self.intersects(other) {
            return None;
        }

        Some(Rectangle {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Grow this rectangle to also cover `other`.
    pub fn expand(&mut self, other: &Rectangle) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Grow this rectangle to also cover a point.
    pub fn expand_point(&mut self, p: &Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// MBR of a set of rectangles, or `None` for an empty set.
    pub fn union_all<'a, I>(rects: I) -> Option<Rectangle>
    where
        I: IntoIterator<Item = &'a Rectangle>,
    {
        let mut mbr = Rectangle::empty();
        for rect in rects {
            mbr.expand(rect);
        }
        mbr.is_valid().then_some(mbr)
    }

    /// Check if a point is contained within this rectangle (edges included).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rectangle: ({}, {})-({}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl FromStr for Rectangle {
    type Err = RectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_csv(s)
    }
}

/// A partition cell: a rectangle with a stable integer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellInfo {
    pub cell_id: i32,
    pub rect: Rectangle,
}

impl CellInfo {
    pub fn new(cell_id: i32, rect: Rectangle) -> Self {
        Self { cell_id, rect }
    }

    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    pub fn height(&self) -> f64 {
        self.rect.height()
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.rect.intersects(other)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RectParseError {
    #[error("Invalid rectangle format: {0}. Expected 'x1,y1,x2,y2'")]
    InvalidFormat(String),

    #[error("Invalid number in rectangle: {0}")]
    InvalidNumber(String),
}
