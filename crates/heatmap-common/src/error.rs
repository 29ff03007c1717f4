//! Error types for heat map plotting.

use thiserror::Error;

/// Result type alias using PlotError.
pub type PlotResult<T> = Result<T, PlotError>;

/// Primary error type for plot operations.
#[derive(Debug, Error)]
pub enum PlotError {
    // === Configuration Errors ===
    #[error("Unknown partition scheme '{0}'. Expected data, grid or space")]
    UnknownPartition(String),

    #[error("No input MBR and no query range to plot")]
    MissingMbr,

    #[error("Plot area has no extent: {0}")]
    DegenerateMbr(String),

    #[error("Image of {width}x{height} pixels is too large or empty")]
    ImageTooLarge { width: u64, height: u64 },

    #[error("Invalid value range: {0}")]
    InvalidValueRange(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Output already exists: {0}. Use -overwrite to replace it")]
    OutputExists(String),

    // === Data Errors ===
    #[error("Frequency maps have different sizes: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },

    #[error("Malformed frequency map stream: {0}")]
    CodecMalformed(String),

    #[error("Global index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("No partition cell with id {0}")]
    UnknownCell(i32),

    // === Infrastructure Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Plot cancelled")]
    Cancelled,
}

impl PlotError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a CodecMalformed error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::CodecMalformed(msg.into())
    }

    /// True for errors raised while validating the run, before any worker starts.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PlotError::UnknownPartition(_)
                | PlotError::MissingMbr
                | PlotError::DegenerateMbr(_)
                | PlotError::ImageTooLarge { .. }
                | PlotError::InvalidValueRange(_)
                | PlotError::InvalidParameter { .. }
                | PlotError::OutputExists(_)
                | PlotError::IndexUnavailable(_)
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PlotError::Cancelled => 130,
            e if e.is_configuration_error() => 2,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for PlotError {
    fn from(err: std::io::Error) -> Self {
        PlotError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PlotError {
    fn from(err: serde_json::Error) -> Self {
        PlotError::Io(format!("JSON error: {}", err))
    }
}

impl From<crate::geometry::RectParseError> for PlotError {
    fn from(err: crate::geometry::RectParseError) -> Self {
        PlotError::invalid_parameter("rect", err.to_string())
    }
}

impl From<crate::color::ColorParseError> for PlotError {
    fn from(err: crate::color::ColorParseError) -> Self {
        PlotError::invalid_parameter("color", err.to_string())
    }
}
