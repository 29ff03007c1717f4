//! Shape input consumed by the plotter.

use heatmap_common::{PlotResult, Rectangle, Shape};

/// A batch of shapes as delivered by an input split.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBatch {
    /// Bounding rectangle of the batch, when the reader knows it. Not used
    /// for plotting.
    pub mbr: Option<Rectangle>,
    pub shapes: Vec<Shape>,
}

impl ShapeBatch {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { mbr: None, shapes }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Result of MBR discovery over the whole input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSummary {
    /// Union of all shape MBRs; `None` for an input without any extent.
    pub mbr: Option<Rectangle>,
    pub record_count: u64,
}

impl InputSummary {
    /// Summarize a sequence of shapes.
    pub fn of<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Self {
        let mut mbr: Option<Rectangle> = None;
        let mut record_count = 0;
        for shape in shapes {
            record_count += 1;
            if let Some(shape_mbr) = shape.mbr() {
                match mbr.as_mut() {
                    Some(m) => m.expand(&shape_mbr),
                    None => mbr = Some(shape_mbr),
                }
            }
        }
        Self { mbr, record_count }
    }
}

/// Iterator over the batches of one split.
pub type BatchIter<'a> = Box<dyn Iterator<Item = PlotResult<ShapeBatch>> + 'a>;

/// A splittable source of shapes.
///
/// Splits are read concurrently, one worker per split.
pub trait ShapeSource: Send + Sync {
    fn split_count(&self) -> usize;

    fn read_split(&self, index: usize) -> PlotResult<BatchIter<'_>>;

    /// MBR and record count of the whole input.
    fn summary(&self) -> PlotResult<InputSummary>;
}

/// Shapes held in memory, dealt into splits of batches.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    splits: Vec<Vec<ShapeBatch>>,
}

impl MemorySource {
    /// Deal `shapes` into `split_count` contiguous splits of batches of at
    /// most `batch_size` shapes.
    pub fn new(shapes: Vec<Shape>, split_count: usize, batch_size: usize) -> Self {
        let split_count = split_count.max(1);
        let batch_size = batch_size.max(1);
        let per_split = shapes.len().div_ceil(split_count).max(1);

        let splits = shapes
            .chunks(per_split)
            .map(|split| {
                split
                    .chunks(batch_size)
                    .map(|batch| ShapeBatch::new(batch.to_vec()))
                    .collect()
            })
            .collect();
        Self { splits }
    }

    /// One split holding one batch.
    pub fn single(shapes: Vec<Shape>) -> Self {
        Self {
            splits: vec![vec![ShapeBatch::new(shapes)]],
        }
    }

    pub fn from_splits(splits: Vec<Vec<ShapeBatch>>) -> Self {
        Self { splits }
    }

    fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.splits
            .iter()
            .flatten()
            .flat_map(|batch| batch.shapes.iter())
    }
}

impl ShapeSource for MemorySource {
    fn split_count(&self) -> usize {
        self.splits.len()
    }

    fn read_split(&self, index: usize) -> PlotResult<BatchIter<'_>> {
        let batches = self.splits.get(index).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Box::new(batches.iter().cloned().map(Ok)))
    }

    fn summary(&self) -> PlotResult<InputSummary> {
        Ok(InputSummary::of(self.shapes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_splits() {
        let shapes: Vec<Shape> = (0..10).map(|i| Shape::point(i as f64, 0.0)).collect();
        let source = MemorySource::new(shapes, 3, 2);
        assert_eq!(source.split_count(), 3);
        let first: Vec<ShapeBatch> = source
            .read_split(0)
            .unwrap()
            .collect::<PlotResult<_>>()
            .unwrap();
        assert_eq!(first.iter().map(ShapeBatch::len).sum::<usize>(), 4);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_empty_source() {
        let source = MemorySource::new(Vec::new(), 4, 10);
        assert_eq!(source.split_count(), 0);
        let summary = source.summary().unwrap();
        assert_eq!(summary.record_count, 0);
        assert!(summary.mbr.is_none());
    }

    #[test]
    fn test_summary_skips_shapes_without_mbr() {
        let source = MemorySource::single(vec![
            Shape::point(1.0, 2.0),
            Shape::Other { mbr: None },
            Shape::rect(-1.0, 0.0, 0.0, 5.0),
        ]);
        let summary = source.summary().unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.mbr, Some(Rectangle::new(-1.0, 0.0, 1.0, 5.0)));
    }
}
