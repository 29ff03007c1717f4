//! Global index discovery.
//!
//! An input that was spatially partitioned ahead of time ships the cells of
//! that partitioning. Plotting with `grid` or `space` reuses them instead of
//! partitioning again.

use heatmap_common::{CellInfo, PlotError, PlotResult, Rectangle};
use std::path::{Path, PathBuf};

/// Source of precomputed partition cells.
pub trait GlobalIndex: Send + Sync {
    fn cells(&self) -> PlotResult<Vec<CellInfo>>;
}

impl GlobalIndex for Vec<CellInfo> {
    fn cells(&self) -> PlotResult<Vec<CellInfo>> {
        Ok(self.clone())
    }
}

/// Cells stored as text, one `id,x1,y1,x2,y2` line per cell.
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Clone)]
pub struct CellFileIndex {
    path: PathBuf,
}

impl CellFileIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(text: &str) -> PlotResult<Vec<CellInfo>> {
        text.lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(line_no, line)| parse_cell(line_no, line))
            .collect()
    }
}

fn parse_cell(line_no: usize, line: &str) -> PlotResult<CellInfo> {
    let (id, rect) = line.split_once(',').ok_or_else(|| {
        PlotError::IndexUnavailable(format!("line {}: expected id,x1,y1,x2,y2", line_no))
    })?;
    let cell_id = id
        .trim()
        .parse::<i32>()
        .map_err(|e| PlotError::IndexUnavailable(format!("line {}: bad cell id: {}", line_no, e)))?;
    let rect = Rectangle::from_csv(rect)
        .map_err(|e| PlotError::IndexUnavailable(format!("line {}: {}", line_no, e)))?;
    Ok(CellInfo::new(cell_id, rect))
}

impl GlobalIndex for CellFileIndex {
    fn cells(&self) -> PlotResult<Vec<CellInfo>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            PlotError::IndexUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let cells = Self::parse(&text)?;
        tracing::debug!(path = %self.path.display(), cells = cells.len(), "Loaded global index");
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cells() {
        let cells = CellFileIndex::parse("# cells\n1,0,0,5,5\n\n2, 5,0,10,5\n").unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1], CellInfo::new(2, Rectangle::new(5.0, 0.0, 10.0, 5.0)));
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = CellFileIndex::parse("1,0,0,5,5\nx,0,0,1,1").unwrap_err();
        assert!(matches!(err, PlotError::IndexUnavailable(ref m) if m.starts_with("line 2")));
    }

    #[test]
    fn test_missing_file() {
        let index = CellFileIndex::new("/nonexistent/heatmap/cells.txt");
        assert!(matches!(index.cells(), Err(PlotError::IndexUnavailable(_))));
    }
}
