//! ARGB colors and their textual forms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An 8-bit per channel color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self::TRANSPARENT
    }

    /// Pack as `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Unpack from `0xAARRGGBB`.
    pub fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Parse `#RRGGBB`, `#AARRGGBB` or one of the named colors.
    ///
    /// The eight digit form is alpha first, matching the packed ARGB layout.
    /// The leading `#` is optional.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let s = s.trim();
        if let Some(color) = named_color(s) {
            return Ok(color);
        }

        let hex = s.trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let value =
            u32::from_str_radix(hex, 16).map_err(|_| ColorParseError(s.to_string()))?;

        match hex.len() {
            6 => Ok(Self::from_argb(0xFF00_0000 | value)),
            8 => Ok(Self::from_argb(value)),
            _ => Err(ColorParseError(s.to_string())),
        }
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_lowercase().as_str() {
        "transparent" => Color::TRANSPARENT,
        "black" => Color::rgb(0, 0, 0),
        "white" => Color::rgb(255, 255, 255),
        "red" => Color::RED,
        "green" => Color::rgb(0, 255, 0),
        "blue" => Color::BLUE,
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" => Color::rgb(0, 255, 255),
        "magenta" => Color::rgb(255, 0, 255),
        "orange" => Color::rgb(255, 200, 0),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        _ => return None,
    };
    Some(color)
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.to_argb())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid color '{0}'. Expected #RRGGBB, #AARRGGBB or a color name")]
pub struct ColorParseError(pub String);
