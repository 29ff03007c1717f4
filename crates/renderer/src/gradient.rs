//! Two-color gradients for heat map colorization.

use heatmap_common::{Color, PlotError, ValueRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the gradient travels between its two end colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMode {
    /// Interpolate hue (shortest way around the color wheel), saturation
    /// and brightness. Output is always opaque.
    #[default]
    Hue,
    /// Interpolate the R, G, B and A channels independently.
    Color,
}

impl FromStr for GradientMode {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hue" => Ok(GradientMode::Hue),
            "color" | "colour" | "rgb" => Ok(GradientMode::Color),
            other => Err(PlotError::invalid_parameter(
                "gradient",
                format!("'{}', expected hue or color", other),
            )),
        }
    }
}

impl fmt::Display for GradientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradientMode::Hue => f.write_str("hue"),
            GradientMode::Color => f.write_str("color"),
        }
    }
}

/// A gradient from `color1` (low values) to `color2` (high values).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    color1: Color,
    color2: Color,
    mode: GradientMode,
    hsb1: [f32; 3],
    hsb2: [f32; 3],
}

impl Gradient {
    pub fn new(color1: Color, color2: Color, mode: GradientMode) -> Self {
        Self {
            color1,
            color2,
            mode,
            hsb1: rgb_to_hsb(color1),
            hsb2: rgb_to_hsb(color2),
        }
    }

    pub fn color1(&self) -> Color {
        self.color1
    }

    pub fn color2(&self) -> Color {
        self.color2
    }

    pub fn mode(&self) -> GradientMode {
        self.mode
    }

    /// Color at position `t` in `[0, 1]`; `t` outside is clamped.
    pub fn color_at(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        match self.mode {
            GradientMode::Color => interpolate_color(self.color1, self.color2, t),
            GradientMode::Hue => {
                let [h1, s1, b1] = self.hsb1;
                let [h2, s2, b2] = self.hsb2;

                let mut dh = h2 - h1;
                if dh > 0.5 {
                    dh -= 1.0;
                } else if dh < -0.5 {
                    dh += 1.0;
                }
                let hue = (h1 + dh * t).rem_euclid(1.0);
                let saturation = s1 + (s2 - s1) * t;
                let brightness = b1 + (b2 - b1) * t;
                hsb_to_rgb(hue, saturation, brightness)
            }
        }
    }

    /// Color of `value` within `range`.
    pub fn colorize(&self, value: f32, range: &ValueRange) -> Color {
        self.color_at(range.normalize(value))
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::new(Color::BLUE, Color::RED, GradientMode::Hue)
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)) as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)) as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)) as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)) as u8,
    )
}

/// Hue, saturation and brightness of a color, each in `[0, 1]`. Alpha is ignored.
pub fn rgb_to_hsb(color: Color) -> [f32; 3] {
    let (r, g, b) = (color.r as f32, color.g as f32, color.b as f32);
    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);

    let brightness = cmax / 255.0;
    let saturation = if cmax > 0.0 { (cmax - cmin) / cmax } else { 0.0 };
    if saturation == 0.0 {
        return [0.0, 0.0, brightness];
    }

    let span = cmax - cmin;
    let redc = (cmax - r) / span;
    let greenc = (cmax - g) / span;
    let bluec = (cmax - b) / span;
    let mut hue = if r == cmax {
        bluec - greenc
    } else if g == cmax {
        2.0 + redc - bluec
    } else {
        4.0 + greenc - redc
    } / 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }
    [hue, saturation, brightness]
}

/// Opaque color from hue, saturation and brightness.
pub fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> Color {
    let to_u8 = |v: f32| (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8;
    if saturation <= 0.0 {
        let v = to_u8(brightness);
        return Color::rgb(v, v, v);
    }

    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));
    let (r, g, b) = match h as u32 {
        0 => (brightness, t, p),
        1 => (q, brightness, p),
        2 => (p, brightness, t),
        3 => (p, q, brightness),
        4 => (t, p, brightness),
        _ => (brightness, p, q),
    };
    Color::rgb(to_u8(r), to_u8(g), to_u8(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsb_round_trip_primaries() {
        for color in [
            Color::RED,
            Color::BLUE,
            Color::rgb(0, 255, 0),
            Color::rgb(255, 255, 0),
            Color::rgb(128, 128, 128),
        ] {
            let [h, s, b] = rgb_to_hsb(color);
            assert_eq!(hsb_to_rgb(h, s, b), color);
        }
    }

    #[test]
    fn test_blue_hsb() {
        let [h, s, b] = rgb_to_hsb(Color::BLUE);
        assert!((h - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(s, 1.0);
        assert_eq!(b, 1.0);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("HUE".parse::<GradientMode>().unwrap(), GradientMode::Hue);
        assert_eq!("color".parse::<GradientMode>().unwrap(), GradientMode::Color);
        assert!("rainbow".parse::<GradientMode>().is_err());
    }
}
