//! Uniform grid partitioning.

use super::CellLayout;
use heatmap_common::{CellInfo, PlotError, PlotResult, Rectangle};

/// A `columns x rows` grid over an extent.
///
/// Cells are numbered row by row from 1: cell `(x, y)` has id
/// `y * columns + x + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridInfo {
    extent: Rectangle,
    columns: usize,
    rows: usize,
}

impl GridInfo {
    pub fn new(extent: Rectangle, columns: usize, rows: usize) -> Self {
        Self {
            extent,
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    /// Grid with at least `cell_count` cells, as close to square as the
    /// extent allows.
    ///
    /// Starting from one cell, a column is added while cells are wider than
    /// tall and a row otherwise, until there are enough cells.
    pub fn with_cell_count(extent: Rectangle, cell_count: usize) -> Self {
        let mut columns = 1;
        let mut rows = 1;
        while columns * rows < cell_count {
            if extent.width() / columns as f64 > extent.height() / rows as f64 {
                columns += 1;
            } else {
                rows += 1;
            }
        }
        Self::new(extent, columns, rows)
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_width(&self) -> f64 {
        self.extent.width() / self.columns as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.extent.height() / self.rows as f64
    }

    pub fn cell_id(&self, column: usize, row: usize) -> i32 {
        (row * self.columns + column + 1) as i32
    }

    /// Column and row ranges (end exclusive) of the cells `rect` overlaps.
    ///
    /// Starts are floored and ends ceiled, then clamped to the grid.
    pub fn overlapping_range(&self, rect: &Rectangle) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let clamp = |v: f64, max: usize| v.max(0.0).min(max as f64) as usize;
        let col1 = clamp(((rect.min_x - self.extent.min_x) / self.cell_width()).floor(), self.columns);
        let row1 = clamp(((rect.min_y - self.extent.min_y) / self.cell_height()).floor(), self.rows);
        let col2 = clamp(((rect.max_x - self.extent.min_x) / self.cell_width()).ceil(), self.columns);
        let row2 = clamp(((rect.max_y - self.extent.min_y) / self.cell_height()).ceil(), self.rows);
        (col1..col2, row1..row2)
    }
}

impl CellLayout for GridInfo {
    fn extent(&self) -> Rectangle {
        self.extent
    }

    fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    fn overlapping_cells(&self, rect: &Rectangle, out: &mut Vec<i32>) {
        let (cols, rows) = self.overlapping_range(rect);
        for column in cols {
            for row in rows.clone() {
                out.push(self.cell_id(column, row));
            }
        }
    }

    fn cell(&self, cell_id: i32) -> PlotResult<CellInfo> {
        if cell_id < 1 || cell_id as usize > self.cell_count() {
            return Err(PlotError::UnknownCell(cell_id));
        }
        let index = (cell_id - 1) as usize;
        let column = index % self.columns;
        let row = index / self.columns;

        let x1 = self.extent.min_x + column as f64 * self.cell_width();
        let y1 = self.extent.min_y + row as f64 * self.cell_height();
        let x2 = self.extent.min_x + (column + 1) as f64 * self.cell_width();
        let y2 = self.extent.min_y + (row + 1) as f64 * self.cell_height();
        Ok(CellInfo::new(cell_id, Rectangle::new(x1, y1, x2, y2)))
    }

    fn cells(&self) -> Vec<CellInfo> {
        (1..=self.cell_count() as i32)
            .filter_map(|id| self.cell(id).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_extent_layouts() {
        let extent = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let grid = GridInfo::with_cell_count(extent, 4);
        assert_eq!((grid.columns(), grid.rows()), (2, 2));
        let grid = GridInfo::with_cell_count(extent, 1);
        assert_eq!((grid.columns(), grid.rows()), (1, 1));
        let grid = GridInfo::with_cell_count(extent, 0);
        assert_eq!(grid.cell_count(), 1);
    }

    #[test]
    fn test_wide_extent_adds_columns() {
        let grid = GridInfo::with_cell_count(Rectangle::new(0.0, 0.0, 400.0, 100.0), 4);
        assert_eq!((grid.columns(), grid.rows()), (4, 1));
    }

    #[test]
    fn test_cell_numbering() {
        let grid = GridInfo::new(Rectangle::new(0.0, 0.0, 30.0, 20.0), 3, 2);
        let cell = grid.cell(5).unwrap();
        assert_eq!(cell.rect, Rectangle::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(grid.cell_id(1, 1), 5);
        assert!(matches!(grid.cell(7), Err(PlotError::UnknownCell(7))));
        assert!(matches!(grid.cell(0), Err(PlotError::UnknownCell(0))));
    }

    #[test]
    fn test_overlapping_cells_clamped() {
        let grid = GridInfo::new(Rectangle::new(0.0, 0.0, 30.0, 20.0), 3, 2);
        let mut out = Vec::new();
        grid.overlapping_cells(&Rectangle::new(-5.0, -5.0, 12.0, 3.0), &mut out);
        out.sort();
        assert_eq!(out, vec![1, 2]);

        out.clear();
        grid.overlapping_cells(&Rectangle::new(100.0, 100.0, 110.0, 110.0), &mut out);
        assert!(out.is_empty());
    }
}
