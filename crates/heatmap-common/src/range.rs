//! Value ranges that drive colorization.

use crate::error::{PlotError, PlotResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed range `[min, max]` of accumulator values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Parse "min..max" or "min,max".
    pub fn parse(s: &str) -> PlotResult<Self> {
        let (lo, hi) = s
            .split_once("..")
            .or_else(|| s.split_once(','))
            .ok_or_else(|| {
                PlotError::InvalidValueRange(format!("'{}': expected min..max or min,max", s))
            })?;

        let parse_bound = |part: &str| -> PlotResult<f32> {
            part.trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| PlotError::InvalidValueRange(format!("'{}' is not a number", part)))
        };

        let range = Self::new(parse_bound(lo)?, parse_bound(hi)?);
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> PlotResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(PlotError::InvalidValueRange(format!(
                "bounds must be finite, got {}",
                self
            )));
        }
        if self.min > self.max {
            return Err(PlotError::InvalidValueRange(format!(
                "min is greater than max in {}",
                self
            )));
        }
        Ok(())
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Clamp `value` into the range and scale it to `[0, 1]`.
    ///
    /// A range with no span maps everything to 0.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.span();
        if span <= 0.0 {
            return 0.0;
        }
        ((value.clamp(self.min, self.max) - self.min) / span).clamp(0.0, 1.0)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

impl FromStr for ValueRange {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_separators() {
        assert_eq!(ValueRange::parse("0..10").unwrap(), ValueRange::new(0.0, 10.0));
        assert_eq!(ValueRange::parse("-1.5,2").unwrap(), ValueRange::new(-1.5, 2.0));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            ValueRange::parse("10"),
            Err(PlotError::InvalidValueRange(_))
        ));
        assert!(matches!(
            ValueRange::parse("5..1"),
            Err(PlotError::InvalidValueRange(_))
        ));
        assert!(matches!(
            ValueRange::parse("a,b"),
            Err(PlotError::InvalidValueRange(_))
        ));
    }

    #[test]
    fn test_normalize() {
        let range = ValueRange::new(2.0, 4.0);
        assert_eq!(range.normalize(1.0), 0.0);
        assert_eq!(range.normalize(3.0), 0.5);
        assert_eq!(range.normalize(9.0), 1.0);
        assert_eq!(ValueRange::new(1.0, 1.0).normalize(1.0), 0.0);
    }
}
