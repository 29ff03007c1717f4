//! Common fixtures for plotting tests.

use heatmap_common::Rectangle;

/// A 100 x 100 world at the origin.
pub fn unit_world() -> Rectangle {
    Rectangle::new(0.0, 0.0, 100.0, 100.0)
}

/// Longitude/latitude extent of the whole globe.
pub fn global_world() -> Rectangle {
    Rectangle::new(-180.0, -90.0, 180.0, 90.0)
}

/// Creates a temporary directory for test output, removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("heatmap_test")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
