//! `key:value` and `-flag` plot parameters.
//!
//! ```text
//! shape:point width:1000 height:1000 radius:5 valuerange:0..10
//! color1:#FF0000FF color2:#FFFF0000 gradient:hue partition:data
//! -skipzeros -smooth -sample -overwrite -vflip -background
//! ```

use crate::input::ShapeFormat;
use heatmap_common::{Color, PlotError, PlotResult, Rectangle, ValueRange};
use plot_engine::PlotConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of input splits read in parallel.
pub fn default_splits() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Options of a plot run that live outside [`PlotConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub shape: ShapeFormat,
    pub index: Option<PathBuf>,
    pub splits: usize,
    /// Accepted for compatibility; local runs always block.
    pub background: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            shape: ShapeFormat::Point,
            index: None,
            splits: default_splits(),
            background: false,
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> PlotResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| PlotError::invalid_parameter(key, format!("'{}': {}", value, e)))
}

fn parse_bool(key: &str, value: &str) -> PlotResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(PlotError::invalid_parameter(
            key,
            format!("'{}' is not a boolean", value),
        )),
    }
}

/// Apply `params` on top of `config`.
///
/// Keys are case-insensitive. Unknown keys and flags are rejected.
pub fn apply_params(config: &mut PlotConfig, params: &[String]) -> PlotResult<RunOptions> {
    let mut options = RunOptions::default();

    for param in params {
        if let Some(flag) = param.strip_prefix('-') {
            apply_flag(config, &mut options, flag)?;
            continue;
        }

        let (key, value) = param.split_once(':').ok_or_else(|| {
            PlotError::invalid_parameter(param.as_str(), "expected key:value or -flag")
        })?;
        let key = key.trim().to_lowercase();
        match key.as_str() {
            "shape" => options.shape = parse_value(&key, value)?,
            "width" => config.width = parse_value(&key, value)?,
            "height" => config.height = parse_value(&key, value)?,
            "radius" => config.radius = parse_value(&key, value)?,
            "valuerange" => config.value_range = Some(ValueRange::parse(value)?),
            "color1" => config.color1 = Color::parse(value)?,
            "color2" => config.color2 = Color::parse(value)?,
            "gradient" => config.gradient = value.parse()?,
            "partition" => config.partition = value.trim().to_lowercase(),
            "rect" => config.query_range = Some(Rectangle::from_csv(value)?),
            "keep-ratio" | "keepratio" => config.keep_aspect_ratio = parse_bool(&key, value)?,
            "sigma" => config.sigma = parse_value(&key, value)?,
            "sample-factor" => config.sample_factor = parse_value(&key, value)?,
            "seed" => config.seed = Some(parse_value(&key, value)?),
            "reducers" => config.max_reducers = parse_value(&key, value)?,
            "index" => options.index = Some(PathBuf::from(value)),
            "splits" => options.splits = parse_value::<usize>(&key, value)?.max(1),
            _ => {
                return Err(PlotError::invalid_parameter(
                    key.as_str(),
                    "unknown parameter",
                ))
            }
        }
    }

    Ok(options)
}

fn apply_flag(config: &mut PlotConfig, options: &mut RunOptions, flag: &str) -> PlotResult<()> {
    // `-no-<flag>` turns a flag off again
    let (name, on) = match flag.strip_prefix("no-") {
        Some(name) => (name, false),
        None => (flag, true),
    };
    match name.to_lowercase().as_str() {
        "skipzeros" => config.skip_zeros = on,
        "smooth" => config.smooth = on,
        "sample" => config.adaptive_sample = on,
        "overwrite" => config.overwrite = on,
        "vflip" => config.vflip = on,
        "keep-ratio" | "keepratio" => config.keep_aspect_ratio = on,
        "background" => options.background = on,
        _ => return Err(PlotError::invalid_parameter(flag, "unknown flag")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags_and_values() {
        let mut config = PlotConfig::default();
        let options = apply_params(
            &mut config,
            &params(&["shape:rect", "Width:640", "valuerange:0,5", "-smooth", "-vflip"]),
        )
        .unwrap();
        assert_eq!(options.shape, ShapeFormat::Rect);
        assert_eq!(config.width, 640);
        assert_eq!(config.value_range, Some(ValueRange::new(0.0, 5.0)));
        assert!(config.smooth && config.vflip);
        assert!(!config.skip_zeros);
    }

    #[test]
    fn test_rejects_unknown() {
        let mut config = PlotConfig::default();
        assert!(apply_params(&mut config, &params(&["zoom:3"])).is_err());
        assert!(apply_params(&mut config, &params(&["-fast"])).is_err());
        assert!(apply_params(&mut config, &params(&["width"])).is_err());
    }
}
