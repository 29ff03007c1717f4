//! Seeded generators for synthetic shape collections.
//!
//! Every generator takes an explicit seed so that a failing test can be
//! replayed exactly.

use heatmap_common::{Rectangle, Shape};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `n` points drawn uniformly inside `world`.
pub fn uniform_points(n: usize, world: &Rectangle, seed: u64) -> Vec<Shape> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Shape::point(
                rng.gen_range(world.min_x..world.max_x),
                rng.gen_range(world.min_y..world.max_y),
            )
        })
        .collect()
}

/// `n` points scattered around `centers`, each within `spread` of its center.
///
/// Produces the skewed densities the space partitioner is meant for.
pub fn clustered_points(
    n: usize,
    centers: &[(f64, f64)],
    spread: f64,
    seed: u64,
) -> Vec<Shape> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let (cx, cy) = centers[i % centers.len()];
            Shape::point(
                cx + rng.gen_range(-spread..=spread),
                cy + rng.gen_range(-spread..=spread),
            )
        })
        .collect()
}

/// `n` axis-aligned rectangles inside `world`, each side at most `max_side`.
pub fn uniform_rects(n: usize, world: &Rectangle, max_side: f64, seed: u64) -> Vec<Shape> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x = rng.gen_range(world.min_x..world.max_x);
            let y = rng.gen_range(world.min_y..world.max_y);
            let w = rng.gen_range(0.0..=max_side);
            let h = rng.gen_range(0.0..=max_side);
            Shape::rect(x, y, (x + w).min(world.max_x), (y + h).min(world.max_y))
        })
        .collect()
}

/// Points on a regular `cols x rows` lattice with one point at the center of
/// each lattice cell.
pub fn lattice_points(world: &Rectangle, cols: usize, rows: usize) -> Vec<Shape> {
    let dx = world.width() / cols as f64;
    let dy = world.height() / rows as f64;
    let mut shapes = Vec::with_capacity(cols * rows);
    for i in 0..cols {
        for j in 0..rows {
            shapes.push(Shape::point(
                world.min_x + (i as f64 + 0.5) * dx,
                world.min_y + (j as f64 + 0.5) * dy,
            ));
        }
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_points_are_reproducible() {
        let world = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(uniform_points(50, &world, 7), uniform_points(50, &world, 7));
        assert!(uniform_points(50, &world, 7)
            .iter()
            .all(|s| world.contains_point(s.centroid().unwrap().x, s.centroid().unwrap().y)));
    }

    #[test]
    fn test_lattice_points() {
        let world = Rectangle::new(0.0, 0.0, 4.0, 2.0);
        let points = lattice_points(&world, 4, 2);
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], Shape::point(0.5, 0.5));
    }
}
