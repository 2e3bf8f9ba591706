//! Frame source and sink seams, plus the image-sequence sink.

use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use djihud_common::error::{HudError, HudResult};

/// Supplies decoded source frames by output time.
pub trait FrameSource: Send {
    /// Source frame nearest to `t` seconds. Calls arrive with
    /// non-decreasing `t`.
    fn frame_at(&mut self, t: f64) -> HudResult<RgbaImage>;
}

/// Consumes finished frames in strictly increasing index order.
pub trait FrameSink: Send {
    fn write_frame(&mut self, index: u64, frame: &RgbaImage) -> HudResult<()>;

    /// Flush and publish the output.
    fn finish(&mut self) -> HudResult<()>;

    /// Discard everything written so far. Must not fail.
    fn abort(&mut self);
}

/// Still-image format for frame sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceFormat {
    Png,
    Jpg,
}

impl SequenceFormat {
    pub fn parse(raw: &str) -> HudResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            other => Err(HudError::config(format!(
                "unsupported image format '{other}' (expected png or jpg)"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

/// Writes each frame as a numbered still image.
///
/// JPEG has no alpha channel, so transparent areas come out black.
#[derive(Debug)]
pub struct ImageSequenceWriter {
    dir: PathBuf,
    format: SequenceFormat,
    digits: usize,
    written: Vec<PathBuf>,
    created_dir: bool,
}

impl ImageSequenceWriter {
    pub fn create(dir: &Path, format: SequenceFormat, total_frames: u64) -> HudResult<Self> {
        let created_dir = !dir.exists();
        std::fs::create_dir_all(dir).map_err(|e| HudError::pipeline_io(dir, e.to_string()))?;
        let digits = total_frames.saturating_sub(1).to_string().len().max(6);
        Ok(Self {
            dir: dir.to_path_buf(),
            format,
            digits,
            written: Vec::new(),
            created_dir,
        })
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!(
            "frame_{index:0width$}.{}",
            self.format.extension(),
            width = self.digits
        ))
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for ImageSequenceWriter {
    fn write_frame(&mut self, index: u64, frame: &RgbaImage) -> HudResult<()> {
        let path = self.frame_path(index);
        let result = match self.format {
            SequenceFormat::Png => frame.save(&path),
            SequenceFormat::Jpg => DynamicImage::ImageRgba8(frame.clone()).to_rgb8().save(&path),
        };
        result.map_err(|e| HudError::pipeline_io(&path, e.to_string()))?;
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self) -> HudResult<()> {
        tracing::info!(
            dir = %self.dir.display(),
            frames = self.written.len(),
            "Frame sequence complete"
        );
        Ok(())
    }

    fn abort(&mut self) {
        for path in self.written.drain(..) {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %err, "Failed to remove frame");
            }
        }
        if self.created_dir {
            let _ = std::fs::remove_dir(&self.dir);
        }
        tracing::warn!(dir = %self.dir.display(), "Frame sequence aborted");
    }
}
