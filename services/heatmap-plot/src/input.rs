//! Text shape input.
//!
//! One shape per line. Fields after a tab are ignored.
//!
//! | Format  | Line                                  |
//! |---------|---------------------------------------|
//! | `point` | `x,y`                                 |
//! | `rect`  | `x1,y1,x2,y2`                         |
//! | `poly`  | `x1,y1,x2,y2,...`                     |
//! | `ogc`   | WKT, e.g. `POLYGON ((0 0, 4 0, 4 3))` |
//!
//! A line that does not parse becomes an empty shape: it counts as a record
//! but is never plotted.

use heatmap_common::{PlotError, PlotResult, Point, Rectangle, Shape};
use plot_engine::source::{BatchIter, InputSummary, ShapeBatch, ShapeSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Shapes handed to the plotter per batch.
pub const BATCH_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeFormat {
    Point,
    Rect,
    Poly,
    Ogc,
}

impl FromStr for ShapeFormat {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "point" => Ok(ShapeFormat::Point),
            "rect" | "rectangle" => Ok(ShapeFormat::Rect),
            "poly" | "polygon" => Ok(ShapeFormat::Poly),
            "ogc" | "wkt" => Ok(ShapeFormat::Ogc),
            other => Err(PlotError::invalid_parameter(
                "shape",
                format!("'{}', expected point, rect, poly or ogc", other),
            )),
        }
    }
}

impl fmt::Display for ShapeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeFormat::Point => "point",
            ShapeFormat::Rect => "rect",
            ShapeFormat::Poly => "poly",
            ShapeFormat::Ogc => "ogc",
        };
        f.write_str(name)
    }
}

impl ShapeFormat {
    /// Parse one input line.
    pub fn parse_line(&self, line: &str) -> Shape {
        let record = line.split('\t').next().unwrap_or_default();
        let parsed = match self {
            ShapeFormat::Point => parse_point(record),
            ShapeFormat::Rect => Rectangle::from_csv(record).ok().map(Shape::Rectangle),
            ShapeFormat::Poly => Some(shape_of_coords(csv_numbers(record))),
            ShapeFormat::Ogc => Some(shape_of_coords(wkt_numbers(record))),
        };
        parsed.unwrap_or(Shape::Other { mbr: None })
    }
}

fn parse_point(record: &str) -> Option<Shape> {
    let mut fields = record.split(',').map(|f| f.trim().parse::<f64>());
    match (fields.next(), fields.next()) {
        (Some(Ok(x)), Some(Ok(y))) => Some(Shape::point(x, y)),
        _ => None,
    }
}

fn csv_numbers(record: &str) -> Vec<f64> {
    record
        .split(',')
        .filter_map(|f| f.trim().parse::<f64>().ok())
        .collect()
}

/// Coordinates of a WKT geometry; keywords such as `EMPTY` are skipped.
fn wkt_numbers(record: &str) -> Vec<f64> {
    record
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')'))
        .filter_map(|token| token.parse::<f64>().ok())
        .collect()
}

/// `Other` shape whose MBR spans the `x,y` pairs of `coords`.
fn shape_of_coords(coords: Vec<f64>) -> Shape {
    let mut mbr: Option<Rectangle> = None;
    for pair in coords.chunks_exact(2) {
        let p = Point::new(pair[0], pair[1]);
        match mbr.as_mut() {
            Some(m) => m.expand_point(&p),
            None => mbr = Some(p.mbr()),
        }
    }
    Shape::Other { mbr }
}

/// A text file of shapes, read into memory and cut into contiguous line
/// ranges.
pub struct TextShapeSource {
    path: PathBuf,
    format: ShapeFormat,
    text: Arc<str>,
    /// Byte ranges of the splits, each ending on a line boundary.
    splits: Vec<(usize, usize)>,
    summary: OnceLock<InputSummary>,
}

impl TextShapeSource {
    pub fn open(path: impl AsRef<Path>, format: ShapeFormat, split_count: usize) -> PlotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlotError::Io(format!("{}: {}", path.display(), e)))?;
        let source = Self::from_text(text, format, split_count).with_path(path);
        tracing::info!(
            path = %path.display(),
            format = %format,
            splits = source.splits.len(),
            "Opened shape input"
        );
        Ok(source)
    }

    pub fn from_text(text: impl Into<String>, format: ShapeFormat, split_count: usize) -> Self {
        let text: String = text.into();
        let splits = split_ranges(&text, split_count.max(1));
        Self {
            path: PathBuf::new(),
            format,
            text: Arc::from(text),
            splits,
            summary: OnceLock::new(),
        }
    }

    fn with_path(mut self, path: &Path) -> Self {
        self.path = path.to_path_buf();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ShapeFormat {
        self.format
    }

    fn lines(&self, range: (usize, usize)) -> impl Iterator<Item = &str> {
        self.text[range.0..range.1]
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
    }
}

/// Cut `text` into about `parts` byte ranges of similar size, moving each
/// cut forward to the next line start. Empty ranges are dropped.
fn split_ranges(text: &str, parts: usize) -> Vec<(usize, usize)> {
    let len = text.len();
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 1..=parts {
        let mut end = if i == parts { len } else { len * i / parts };
        end = end.max(start);
        if end < len {
            // Byte search: `end` may fall inside a multi-byte character.
            end = match text.as_bytes()[end..].iter().position(|&b| b == b'\n') {
                Some(offset) => end + offset + 1,
                None => len,
            };
        }
        if end > start {
            ranges.push((start, end));
        }
        start = end;
    }
    ranges
}

impl ShapeSource for TextShapeSource {
    fn split_count(&self) -> usize {
        self.splits.len()
    }

    fn read_split(&self, index: usize) -> PlotResult<BatchIter<'_>> {
        let range = *self.splits.get(index).ok_or_else(|| {
            PlotError::invalid_parameter("split", format!("no split {}", index))
        })?;

        let format = self.format;
        let mut lines = self.lines(range).peekable();
        let batches = std::iter::from_fn(move || {
            lines.peek()?;
            let shapes: Vec<Shape> = lines
                .by_ref()
                .take(BATCH_SIZE)
                .map(|line| format.parse_line(line))
                .collect();
            Some(Ok(ShapeBatch::new(shapes)))
        });
        Ok(Box::new(batches))
    }

    fn summary(&self) -> PlotResult<InputSummary> {
        let summary = *self.summary.get_or_init(|| {
            let shapes: Vec<Shape> = self
                .lines((0, self.text.len()))
                .map(|line| self.format.parse_line(line))
                .collect();
            InputSummary::of(&shapes)
        });
        tracing::debug!(records = summary.record_count, mbr = ?summary.mbr, "Input summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        assert_eq!(ShapeFormat::Point.parse_line("1.5,2\textra"), Shape::point(1.5, 2.0));
        assert_eq!(
            ShapeFormat::Rect.parse_line("4,3,0,1"),
            Shape::rect(0.0, 1.0, 4.0, 3.0)
        );
        assert_eq!(
            ShapeFormat::Poly.parse_line("0,0,4,0,4,3"),
            Shape::Other {
                mbr: Some(Rectangle::new(0.0, 0.0, 4.0, 3.0))
            }
        );
        assert_eq!(
            ShapeFormat::Ogc.parse_line("POLYGON ((1 2, 5 2, 5 -1, 1 2))"),
            Shape::Other {
                mbr: Some(Rectangle::new(1.0, -1.0, 5.0, 2.0))
            }
        );
    }

    #[test]
    fn test_bad_lines_are_empty_shapes() {
        assert_eq!(ShapeFormat::Point.parse_line("abc"), Shape::Other { mbr: None });
        assert_eq!(
            ShapeFormat::Ogc.parse_line("POINT EMPTY"),
            Shape::Other { mbr: None }
        );
    }

    #[test]
    fn test_split_ranges_end_on_lines() {
        let text = "1,1\n2,2\n3,3\n4,4\n5,5\n";
        let ranges = split_ranges(text, 3);
        assert_eq!(ranges.first().map(|r| r.0), Some(0));
        assert_eq!(ranges.last().map(|r| r.1), Some(text.len()));
        for (start, end) in &ranges {
            assert!(text[..*end].ends_with('\n'));
            assert!(*start == 0 || text[..*start].ends_with('\n'));
        }
    }

    #[test]
    fn test_split_ranges_with_multibyte_attributes() {
        let text = "1,1\tZürich\n2,2\tSão Paulo\n3,3\tKöln\n4,4\tMünchen\n";
        for parts in 1..=12 {
            let source = TextShapeSource::from_text(text, ShapeFormat::Point, parts);
            let mut points = Vec::new();
            for split in 0..source.split_count() {
                for batch in source.read_split(split).unwrap() {
                    points.extend(batch.unwrap().shapes);
                }
            }
            assert_eq!(
                points,
                vec![
                    Shape::point(1.0, 1.0),
                    Shape::point(2.0, 2.0),
                    Shape::point(3.0, 3.0),
                    Shape::point(4.0, 4.0),
                ],
                "parts = {}",
                parts
            );
        }
    }
}
