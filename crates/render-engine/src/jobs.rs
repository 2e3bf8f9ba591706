//! Async entry points for the three output modes.
//!
//! Each call validates its inputs, then runs the blocking pipeline on
//! tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use djihud_common::error::{HudError, HudResult};
use djihud_telemetry::track::TelemetryTrack;

use crate::config::OverlayConfig;
use crate::ffmpeg::{self, FfmpegDecoder, FfmpegEncoder, VideoInfo};
use crate::font::HudFont;
use crate::frames::{ImageSequenceWriter, SequenceFormat};
use crate::pipeline::{
    frame_count_for, Pipeline, PipelineSettings, PipelineSummary, ProgressCallback,
};
use crate::renderer::OverlayRenderer;

/// Knobs shared by every output mode.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Render threads; 0 picks one per core.
    pub workers: usize,
    /// Font file for HUD text; the system sans-serif face when unset.
    pub font_path: Option<PathBuf>,
    /// Set to stop the run; output is removed and `HudError::Cancelled`
    /// returned.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Overlay geometry for modes without a source video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

fn build_renderer(track: Arc<TelemetryTrack>, options: &RenderOptions) -> OverlayRenderer {
    OverlayRenderer::new(track, HudFont::load(options.font_path.as_deref()))
}

async fn run_blocking<F>(work: F) -> HudResult<PipelineSummary>
where
    F: FnOnce() -> HudResult<PipelineSummary> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| HudError::Other(anyhow::anyhow!("render task panicked: {e}")))?
}

fn attach_cancel<'a>(pipeline: Pipeline<'a>, options: &RenderOptions) -> Pipeline<'a> {
    match &options.cancel {
        Some(flag) => pipeline.with_cancel_flag(Arc::clone(flag)),
        None => pipeline,
    }
}

/// Burn the HUD into every frame of `video`, writing `output`.
///
/// Output matches the source's resolution. `output_fps` defaults to the
/// source frame rate; a different rate resamples source frames by nearest
/// timestamp.
pub async fn process_video(
    video: &Path,
    track: Arc<TelemetryTrack>,
    output: &Path,
    config: OverlayConfig,
    output_fps: Option<f64>,
    options: RenderOptions,
    progress: Option<ProgressCallback>,
) -> HudResult<PipelineSummary> {
    config.validate()?;
    ffmpeg::ensure_ffmpeg()?;
    let info = ffmpeg::read_video_info(video)?;
    let fps = output_fps.unwrap_or(info.fps);
    let total_frames = if (fps - info.fps).abs() < 1e-9 && info.frame_count > 0 {
        info.frame_count
    } else {
        frame_count_for(info.duration_seconds, fps)
    };

    tracing::info!(
        video = %video.display(),
        output = %output.display(),
        width = info.width,
        height = info.height,
        source_fps = info.fps,
        fps,
        total_frames,
        "Compositing HUD over source video"
    );

    let video = video.to_path_buf();
    let output = output.to_path_buf();
    run_blocking(move || {
        let renderer = build_renderer(track, &options);
        let settings = PipelineSettings {
            width: info.width,
            height: info.height,
            fps,
            total_frames,
            workers: options.workers,
        };
        let pipeline = attach_cancel(Pipeline::new(&renderer, config, settings)?, &options);
        let mut source = FfmpegDecoder::open(&video, info)?;
        let mut sink = FfmpegEncoder::spawn(&output, info.width, info.height, fps)?;
        pipeline.run(Some(&mut source), &mut sink, progress.as_ref())
    })
    .await
}

/// Render a standalone overlay video covering the whole track.
///
/// `.mov` and `.webm` outputs keep transparency; other containers do not.
pub async fn generate_overlay_video(
    track: Arc<TelemetryTrack>,
    output: &Path,
    canvas: CanvasSpec,
    config: OverlayConfig,
    options: RenderOptions,
    progress: Option<ProgressCallback>,
) -> HudResult<PipelineSummary> {
    config.validate()?;
    ffmpeg::ensure_ffmpeg()?;
    if !ffmpeg::container_keeps_alpha(output) {
        tracing::warn!(
            output = %output.display(),
            "Container has no alpha channel; use .mov or .webm for a transparent overlay"
        );
    }
    let total_frames = frame_count_for(track.duration_seconds(), canvas.fps);
    tracing::info!(
        output = %output.display(),
        width = canvas.width,
        height = canvas.height,
        fps = canvas.fps,
        total_frames,
        "Rendering overlay video"
    );

    let output = output.to_path_buf();
    run_blocking(move || {
        let renderer = build_renderer(track, &options);
        let pipeline = attach_cancel(
            Pipeline::new(&renderer, config, settings_for(canvas, total_frames, &options))?,
            &options,
        );
        let mut sink = FfmpegEncoder::spawn(&output, canvas.width, canvas.height, canvas.fps)?;
        pipeline.run(None, &mut sink, progress.as_ref())
    })
    .await
}

/// Render the overlay as a numbered still-image sequence in `output_dir`.
pub async fn generate_overlay_frames(
    track: Arc<TelemetryTrack>,
    output_dir: &Path,
    canvas: CanvasSpec,
    config: OverlayConfig,
    format: SequenceFormat,
    options: RenderOptions,
    progress: Option<ProgressCallback>,
) -> HudResult<PipelineSummary> {
    config.validate()?;
    let total_frames = frame_count_for(track.duration_seconds(), canvas.fps);
    tracing::info!(
        dir = %output_dir.display(),
        width = canvas.width,
        height = canvas.height,
        fps = canvas.fps,
        format = format.extension(),
        total_frames,
        "Rendering overlay frames"
    );

    let output_dir = output_dir.to_path_buf();
    run_blocking(move || {
        let renderer = build_renderer(track, &options);
        let pipeline = attach_cancel(
            Pipeline::new(&renderer, config, settings_for(canvas, total_frames, &options))?,
            &options,
        );
        let mut sink = ImageSequenceWriter::create(&output_dir, format, total_frames)?;
        pipeline.run(None, &mut sink, progress.as_ref())
    })
    .await
}

fn settings_for(
    canvas: CanvasSpec,
    total_frames: u64,
    options: &RenderOptions,
) -> PipelineSettings {
    PipelineSettings {
        width: canvas.width,
        height: canvas.height,
        fps: canvas.fps,
        total_frames,
        workers: options.workers,
    }
}

/// Read video metadata off the async runtime.
pub async fn get_video_info(path: &Path) -> HudResult<VideoInfo> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || ffmpeg::read_video_info(&path))
        .await
        .map_err(|e| HudError::Other(anyhow::anyhow!("video info task panicked: {e}")))?
}

/// Copy audio from `audio_source` into `video`, writing `output`.
pub async fn add_audio(video: &Path, audio_source: &Path, output: &Path) -> HudResult<()> {
    let (video, audio_source, output) = (
        video.to_path_buf(),
        audio_source.to_path_buf(),
        output.to_path_buf(),
    );
    tokio::task::spawn_blocking(move || ffmpeg::add_audio(&video, &audio_source, &output))
        .await
        .map_err(|e| HudError::Other(anyhow::anyhow!("remux task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use djihud_telemetry::frame::TelemetryFrame;

    fn track() -> Arc<TelemetryTrack> {
        let frames = (0..3)
            .map(|i| {
                let mut f = TelemetryFrame::new(i + 1, u64::from(i) * 500, u64::from(i + 1) * 500);
                f.altitude_m = Some(50.0);
                f
            })
            .collect();
        Arc::new(TelemetryTrack::new(frames).unwrap())
    }

    #[tokio::test]
    async fn test_generate_overlay_frames_writes_sequence() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frames");
        let canvas = CanvasSpec {
            width: 64,
            height: 36,
            fps: 4.0,
        };
        let summary = generate_overlay_frames(
            track(),
            &dir,
            canvas,
            OverlayConfig::default(),
            SequenceFormat::Png,
            RenderOptions {
                workers: 2,
                ..RenderOptions::default()
            },
            None,
        )
        .await
        .unwrap();

        // 1.5 s of telemetry at 4 fps.
        assert_eq!(summary.frames_written, 6);
        assert!(dir.join("frame_000000.png").exists());
        assert!(dir.join("frame_000005.png").exists());
        assert!(!dir.join("frame_000006.png").exists());
    }

    #[tokio::test]
    async fn test_cancelled_frames_leave_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frames");
        let options = RenderOptions {
            cancel: Some(Arc::new(AtomicBool::new(true))),
            ..RenderOptions::default()
        };
        let canvas = CanvasSpec {
            width: 32,
            height: 18,
            fps: 10.0,
        };
        let err = generate_overlay_frames(
            track(),
            &dir,
            canvas,
            OverlayConfig::default(),
            SequenceFormat::Png,
            options,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, HudError::Cancelled));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_invalid_gauge_is_rejected_before_rendering() {
        let tmp = tempfile::tempdir().unwrap();
        let config = OverlayConfig {
            gauge_max_speed_kmh: 0.0,
            ..OverlayConfig::default()
        };
        let canvas = CanvasSpec {
            width: 32,
            height: 18,
            fps: 10.0,
        };
        let err = generate_overlay_frames(
            track(),
            tmp.path(),
            canvas,
            config,
            SequenceFormat::Png,
            RenderOptions::default(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HudError::Render { .. }));
    }
}
