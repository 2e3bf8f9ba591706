//! Export format resolution.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use djihud_common::error::{HudError, HudResult};

/// Interchange formats a track can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Gpx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Gpx];

    /// Match a format name or extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "gpx" => Some(Self::Gpx),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }

    /// An explicit format always wins; otherwise the extension decides.
    pub fn resolve(explicit: Option<&str>, path: &Path) -> HudResult<Self> {
        match explicit {
            Some(name) => Self::from_name(name).ok_or_else(|| HudError::export_format(name, path)),
            None => Self::from_path(path).ok_or_else(|| {
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default();
                HudError::export_format(ext, path)
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Gpx => "gpx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
