//! Shared test utilities for the heat map plotting workspace.
//!
//! - Approximate float assertions
//! - Synthetic shape generators (seeded, reproducible)
//! - Common world rectangles and scratch directories
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality of two rectangles, corner by corner.
#[macro_export]
macro_rules! assert_rect_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (l, r) = (&$left, &$right);
        $crate::assert_approx_eq!(l.min_x, r.min_x, $epsilon);
        $crate::assert_approx_eq!(l.min_y, r.min_y, $epsilon);
        $crate::assert_approx_eq!(l.max_x, r.max_x, $epsilon);
        $crate::assert_approx_eq!(l.max_y, r.max_y, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    use heatmap_common::Rectangle;

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_rect_approx_eq_passes() {
        assert_rect_approx_eq!(
            Rectangle::new(0.0, 0.0, 1.0, 1.0),
            Rectangle::new(0.0001, 0.0, 1.0, 0.9999),
            0.001
        );
    }
}
