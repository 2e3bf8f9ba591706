//! Error and warning types shared across djihud crates.

use std::fmt;
use std::path::PathBuf;

/// Top-level error type for djihud operations.
#[derive(Debug, thiserror::Error)]
pub enum HudError {
    /// No usable telemetry could be recovered from the input.
    #[error("Telemetry parse error{}: {message}", line_suffix(.line))]
    TelemetryParse {
        message: String,
        line: Option<usize>,
    },

    /// Invalid canvas or contradictory overlay configuration.
    #[error("Render error: {message}")]
    Render { message: String },

    /// Unreadable source or unwritable destination during the frame loop.
    #[error("Pipeline I/O error at {}: {message}", .path.display())]
    PipelineIo { path: PathBuf, message: String },

    /// Unknown explicit or inferred export format.
    #[error("Unknown export format '{requested}' for {}", .path.display())]
    ExportFormat { requested: String, path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using HudError.
pub type HudResult<T> = Result<T, HudError>;

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

impl HudError {
    pub fn telemetry_parse(msg: impl Into<String>, line: Option<usize>) -> Self {
        Self::TelemetryParse {
            message: msg.into(),
            line,
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn pipeline_io(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::PipelineIo {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn export_format(requested: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::ExportFormat {
            requested: requested.into(),
            path: path.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

/// A recoverable data-quality condition found while reading telemetry.
///
/// These never abort processing. The parser collects them and also reports
/// each one through `tracing::warn!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataQualityWarning {
    /// A cue was dropped because its index or timecode line was unusable.
    MalformedBlock {
        block_index: usize,
        line: usize,
        reason: String,
    },

    /// A cue's end timecode precedes its start; the end was clamped to the start.
    TimecodeInverted { block_index: usize, line: usize },

    /// Cues were not in start-time order and have been stable-sorted.
    OutOfOrder { first_offending_index: usize },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedBlock {
                block_index,
                line,
                reason,
            } => write!(f, "skipped block #{block_index} at line {line}: {reason}"),
            Self::TimecodeInverted { block_index, line } => write!(
                f,
                "block #{block_index} at line {line} ends before it starts; end clamped"
            ),
            Self::OutOfOrder {
                first_offending_index,
            } => write!(
                f,
                "cues out of order starting at frame {first_offending_index}; re-sorted by start time"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_line() {
        let err = HudError::telemetry_parse("no frames", Some(12));
        assert_eq!(err.to_string(), "Telemetry parse error (line 12): no frames");

        let err = HudError::telemetry_parse("empty input", None);
        assert_eq!(err.to_string(), "Telemetry parse error: empty input");
    }

    #[test]
    fn test_export_format_error_names_request_and_path() {
        let err = HudError::export_format("kml", "/tmp/out.kml");
        let msg = err.to_string();
        assert!(msg.contains("kml"));
        assert!(msg.contains("/tmp/out.kml"));
    }

    #[test]
    fn test_warning_display() {
        let warning = DataQualityWarning::MalformedBlock {
            block_index: 3,
            line: 9,
            reason: "missing timecode".into(),
        };
        assert_eq!(
            warning.to_string(),
            "skipped block #3 at line 9: missing timecode"
        );
    }
}
