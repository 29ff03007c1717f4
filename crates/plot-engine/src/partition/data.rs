//! Data partitioning: one full-size accumulator per worker.

use super::{round_half_up, Sampler, StampSettings};
use heatmap_common::{Point, PlotResult, Rectangle, Shape};
use renderer::FrequencyMap;

/// Projects shapes onto the full image and stamps them into a worker map.
#[derive(Debug, Clone, Copy)]
pub struct DataPartitioner {
    world: Rectangle,
    width: usize,
    height: usize,
    stamp: StampSettings,
}

impl DataPartitioner {
    pub fn new(world: Rectangle, width: usize, height: usize, stamp: StampSettings) -> Self {
        Self {
            world,
            width,
            height,
            stamp,
        }
    }

    pub fn world(&self) -> Rectangle {
        self.world
    }

    /// Fresh accumulator of the full image size.
    pub fn new_map(&self) -> FrequencyMap {
        self.stamp.new_map(self.width, self.height)
    }

    /// Pixel of `p` in the full image.
    pub fn project(&self, p: &Point) -> (i64, i64) {
        let cx = round_half_up((p.x - self.world.min_x) * self.width as f64 / self.world.width());
        let cy =
            round_half_up((p.y - self.world.min_y) * self.height as f64 / self.world.height());
        (cx, cy)
    }

    /// Stamp every surviving shape of `shapes` into `map`.
    ///
    /// Shapes without an MBR or with a non-finite centroid, and points
    /// dropped by the sampler, are skipped.
    /// Returns the number of shapes stamped.
    pub fn accumulate(
        &self,
        map: &mut FrequencyMap,
        shapes: &[Shape],
        sampler: &mut Sampler,
    ) -> u64 {
        let mut stamped = 0;
        for shape in shapes {
            if !sampler.keep(shape) {
                continue;
            }
            let Some(center) = shape.centroid().filter(Point::is_finite) else {
                continue;
            };
            let (cx, cy) = self.project(&center);
            self.stamp.apply(map, cx, cy);
            stamped += 1;
        }
        stamped
    }

    /// Merge worker maps into one.
    pub fn merge<I>(&self, maps: I) -> PlotResult<FrequencyMap>
    where
        I: IntoIterator<Item = FrequencyMap>,
    {
        let mut merged = self.new_map();
        for map in maps {
            merged.combine(&map)?;
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partitioner() -> DataPartitioner {
        DataPartitioner::new(
            Rectangle::new(0.0, 0.0, 10.0, 10.0),
            100,
            100,
            StampSettings {
                radius: 3,
                smooth: false,
                sigma: 8.0,
            },
        )
    }

    #[test]
    fn test_project_rounds_half_up() {
        let p = partitioner();
        assert_eq!(p.project(&Point::new(5.0, 5.0)), (50, 50));
        assert_eq!(p.project(&Point::new(0.05, 0.04)), (1, 0));
        assert_eq!(p.project(&Point::new(-0.04, 10.0)), (0, 100));
    }

    #[test]
    fn test_accumulate_skips_empty_shapes() {
        let p = partitioner();
        let mut map = p.new_map();
        let shapes = [
            Shape::point(5.0, 5.0),
            Shape::Other { mbr: None },
            Shape::rect(4.0, 4.0, 6.0, 6.0),
        ];
        let stamped = p.accumulate(&mut map, &shapes, &mut Sampler::keep_all());
        assert_eq!(stamped, 2);
        assert_eq!(map.value_range().max, 2.0);
    }

    #[test]
    fn test_accumulate_far_and_non_finite_points() {
        let p = DataPartitioner::new(
            Rectangle::new(0.0, 0.0, 1.0, 1.0),
            100,
            100,
            StampSettings {
                radius: 3,
                smooth: false,
                sigma: 8.0,
            },
        );
        let shapes = [
            Shape::point(0.5, 0.5),
            Shape::point(1e18, 0.5),
            Shape::point(0.5, -1e300),
            Shape::point(f64::NAN, f64::NAN),
            Shape::point(f64::INFINITY, 0.5),
        ];
        for smooth in [false, true] {
            let p = DataPartitioner {
                stamp: StampSettings { smooth, ..p.stamp },
                ..p
            };
            let mut map = p.new_map();
            let stamped = p.accumulate(&mut map, &shapes, &mut Sampler::keep_all());
            assert_eq!(stamped, 3);
            // Only the point inside the image leaves a mark at (50, 50)
            assert!(map.get(50, 50) > 0.0);
            assert_eq!(map.get(0, 0), 0.0);
        }
    }
}
