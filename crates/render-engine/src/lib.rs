//! djihud Render Engine
//!
//! Draws the telemetry HUD and drives the frame-ordered pipeline that
//! turns a telemetry track (and optionally a source video) into output
//! frames.
//!
//! # Pipeline Architecture
//!
//! ```text
//! DJI_0001.SRT ──► TelemetryTrack ──► sample(t) ──┐
//!                                                 ├── OverlayRenderer (rayon pool)
//! OverlayConfig ──────────────────────────────────┘         │
//!                                                           ├── alpha_blend
//! DJI_0001.MP4 ──► FfmpegDecoder (sequential) ──────────────┘   (composite mode)
//!                                                           │
//!                                                           ▼
//!                                                   ReorderBuffer
//!                                                           │
//!                                       ┌───────────────────┴──────────┐
//!                                       ▼                              ▼
//!                               FfmpegEncoder                ImageSequenceWriter
//!                           (.mp4 / .mov / .webm)               (png / jpg)
//! ```

pub mod compositor;
pub mod config;
pub mod ffmpeg;
pub mod font;
pub mod frames;
pub mod jobs;
pub mod layout;
pub mod pipeline;
pub mod renderer;
pub mod widgets;

pub use config::{OverlayConfig, Widget};
pub use ffmpeg::VideoInfo;
pub use frames::{FrameSink, FrameSource, ImageSequenceWriter, SequenceFormat};
pub use jobs::*;
pub use pipeline::{FrameProgress, Pipeline, PipelineSettings, PipelineSummary, ProgressCallback};
pub use renderer::{OverlayRenderer, RenderedOverlayFrame};
