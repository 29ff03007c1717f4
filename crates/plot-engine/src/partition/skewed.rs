//! Skewed partitioning over irregular cells.

use super::CellLayout;
use heatmap_common::{CellInfo, PlotError, PlotResult, Rectangle};
use std::collections::HashMap;

/// Irregular cells with stable ids. The extent is the union of the cells.
#[derive(Debug, Clone)]
pub struct SkewedCells {
    cells: Vec<CellInfo>,
    extent: Rectangle,
    by_id: HashMap<i32, usize>,
}

impl SkewedCells {
    pub fn new(cells: Vec<CellInfo>) -> PlotResult<Self> {
        let extent = Rectangle::union_all(cells.iter().map(|c| &c.rect))
            .ok_or_else(|| PlotError::IndexUnavailable("no partition cells".to_string()))?;
        if !extent.has_area() {
            return Err(PlotError::DegenerateMbr(format!("partition cells cover {}", extent)));
        }

        let mut by_id = HashMap::with_capacity(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            if by_id.insert(cell.cell_id, i).is_some() {
                return Err(PlotError::IndexUnavailable(format!(
                    "duplicate cell id {}",
                    cell.cell_id
                )));
            }
        }

        Ok(Self {
            cells,
            extent,
            by_id,
        })
    }
}

impl CellLayout for SkewedCells {
    fn extent(&self) -> Rectangle {
        self.extent
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn overlapping_cells(&self, rect: &Rectangle, out: &mut Vec<i32>) {
        out.extend(
            self.cells
                .iter()
                .filter(|cell| cell.intersects(rect))
                .map(|cell| cell.cell_id),
        );
    }

    fn cell(&self, cell_id: i32) -> PlotResult<CellInfo> {
        self.by_id
            .get(&cell_id)
            .map(|&i| self.cells[i])
            .ok_or(PlotError::UnknownCell(cell_id))
    }

    fn cells(&self) -> Vec<CellInfo> {
        self.cells.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells() -> Vec<CellInfo> {
        vec![
            CellInfo::new(10, Rectangle::new(0.0, 0.0, 5.0, 10.0)),
            CellInfo::new(20, Rectangle::new(5.0, 0.0, 10.0, 4.0)),
            CellInfo::new(30, Rectangle::new(5.0, 4.0, 10.0, 10.0)),
        ]
    }

    #[test]
    fn test_extent_is_union() {
        let layout = SkewedCells::new(cells()).unwrap();
        assert_eq!(layout.extent(), Rectangle::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(layout.cell(20).unwrap().rect, Rectangle::new(5.0, 0.0, 10.0, 4.0));
        assert!(matches!(layout.cell(40), Err(PlotError::UnknownCell(40))));
    }

    #[test]
    fn test_overlapping_uses_strict_intersection() {
        let layout = SkewedCells::new(cells()).unwrap();
        let mut out = Vec::new();
        layout.overlapping_cells(&Rectangle::new(4.0, 3.0, 6.0, 5.0), &mut out);
        assert_eq!(out, vec![10, 20, 30]);

        out.clear();
        layout.overlapping_cells(&Rectangle::new(5.0, 0.0, 6.0, 4.0), &mut out);
        assert_eq!(out, vec![20]);
    }

    #[test]
    fn test_rejects_empty_and_duplicate_cells() {
        assert!(SkewedCells::new(Vec::new()).is_err());
        let mut dup = cells();
        dup[1].cell_id = 10;
        assert!(SkewedCells::new(dup).is_err());
    }
}
