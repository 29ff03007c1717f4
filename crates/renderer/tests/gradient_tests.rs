//! Tests for hue and color gradients.

use heatmap_common::{Color, ValueRange};
use renderer::gradient::{hsb_to_rgb, interpolate_color, rgb_to_hsb};
use renderer::{Gradient, GradientMode};

// ============================================================================
// Hue mode tests
// ============================================================================

#[test]
fn test_hue_endpoints() {
    let gradient = Gradient::default();
    assert_eq!(gradient.mode(), GradientMode::Hue);
    assert_eq!(gradient.color_at(0.0), Color::BLUE);
    assert_eq!(gradient.color_at(1.0), Color::RED);
}

#[test]
fn test_hue_takes_shortest_arc() {
    // Blue (240 deg) to red (0 deg) passes through magenta, not green
    let mid = Gradient::default().color_at(0.5);
    assert_eq!(mid, Color::rgb(255, 0, 255));
}

#[test]
fn test_hue_output_is_opaque() {
    let gradient = Gradient::new(
        Color::new(0, 0, 255, 0),
        Color::new(255, 0, 0, 10),
        GradientMode::Hue,
    );
    assert_eq!(gradient.color_at(0.3).a, 255);
}

#[test]
fn test_hsb_helpers() {
    let [h, s, b] = rgb_to_hsb(Color::rgb(0, 255, 0));
    assert!((h - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!((s, b), (1.0, 1.0));
    assert_eq!(hsb_to_rgb(0.0, 0.0, 0.5), Color::rgb(128, 128, 128));
}

// ============================================================================
// Color mode tests
// ============================================================================

#[test]
fn test_color_mode_midpoint() {
    let gradient = Gradient::new(Color::BLUE, Color::RED, GradientMode::Color);
    assert_eq!(gradient.color_at(0.5), Color::new(127, 0, 127, 255));
}

#[test]
fn test_color_mode_interpolates_alpha() {
    let transparent_blue = Color::new(0, 0, 255, 0);
    let color = interpolate_color(transparent_blue, Color::RED, 0.5);
    assert_eq!(color.a, 127);
}

// ============================================================================
// Value range tests
// ============================================================================

#[test]
fn test_colorize_clamps_to_range() {
    let gradient = Gradient::new(Color::BLUE, Color::RED, GradientMode::Color);
    let range = ValueRange::new(10.0, 20.0);
    assert_eq!(gradient.colorize(-5.0, &range), Color::BLUE);
    assert_eq!(gradient.colorize(100.0, &range), Color::RED);
}

#[test]
fn test_degenerate_range_maps_to_color1() {
    let gradient = Gradient::default();
    let range = ValueRange::new(3.0, 3.0);
    assert_eq!(gradient.colorize(3.0, &range), Color::BLUE);
    assert_eq!(gradient.colorize(7.0, &range), Color::BLUE);
}
