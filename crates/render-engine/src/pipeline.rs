//! Frame-ordered render loop.
//!
//! Frames are rendered in parallel on a rayon pool, one bounded window at a
//! time, and handed to the sink strictly in index order through a
//! [`ReorderBuffer`]. At most one window of frames is held in memory, and
//! the window shrinks for large canvases so it stays under
//! [`MAX_WINDOW_BYTES`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use image::RgbaImage;

use djihud_common::error::{HudError, HudResult};

use crate::compositor::alpha_blend;
use crate::config::{validate_canvas, OverlayConfig};
use crate::frames::{FrameSink, FrameSource};
use crate::renderer::OverlayRenderer;

/// Frames in flight per worker thread.
const FRAMES_PER_WORKER: usize = 4;

/// Upper bound on raster bytes held by one window.
pub const MAX_WINDOW_BYTES: u64 = 512 * 1024 * 1024;

/// Frames per window for `threads` workers on a `width`x`height` canvas.
///
/// A composite job holds a source frame and an overlay, an overlay-only job
/// just the overlay. Always at least one.
pub fn window_size(threads: usize, width: u32, height: u32, composite: bool) -> u64 {
    let wanted = (threads * FRAMES_PER_WORKER).max(1) as u64;
    let rasters = if composite { 2 } else { 1 };
    let job_bytes = (u64::from(width) * u64::from(height) * 4 * rasters).max(1);
    wanted.min((MAX_WINDOW_BYTES / job_bytes).max(1))
}

/// Progress callback invoked once per frame handed to the sink.
pub type ProgressCallback = Box<dyn Fn(FrameProgress) + Send>;

/// Progress report: `current` frames of `total` written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProgress {
    pub current: u64,
    pub total: u64,
}

/// Holds out-of-order results until every earlier index has been emitted.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    pending: BTreeMap<u64, T>,
}

impl<T> ReorderBuffer<T> {
    pub fn new(first_index: u64) -> Self {
        Self {
            next: first_index,
            pending: BTreeMap::new(),
        }
    }

    /// Stash `item`. Indices already emitted or already pending are
    /// rejected.
    pub fn insert(&mut self, index: u64, item: T) -> bool {
        if index < self.next || self.pending.contains_key(&index) {
            return false;
        }
        self.pending.insert(index, item);
        true
    }

    /// Next item in sequence, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<(u64, T)> {
        let item = self.pending.remove(&self.next)?;
        let index = self.next;
        self.next += 1;
        Some((index, item))
    }

    pub fn next_index(&self) -> u64 {
        self.next
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Output geometry and timing for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
    /// Render threads; 0 picks one per core.
    pub workers: usize,
}

/// Totals reported after a successful run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSummary {
    pub frames_written: u64,
    pub elapsed_secs: f64,
}

/// Number of output frames covering `duration_secs` at `fps`, at least one.
pub fn frame_count_for(duration_secs: f64, fps: f64) -> u64 {
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return 1;
    }
    ((duration_secs * fps).ceil() as u64).max(1)
}

/// Renders overlay frames, optionally over source frames, into a sink.
pub struct Pipeline<'a> {
    renderer: &'a OverlayRenderer,
    config: OverlayConfig,
    settings: PipelineSettings,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        renderer: &'a OverlayRenderer,
        config: OverlayConfig,
        settings: PipelineSettings,
    ) -> HudResult<Self> {
        validate_canvas(settings.width, settings.height)?;
        config.validate()?;
        if !(settings.fps.is_finite() && settings.fps > 0.0) {
            return Err(HudError::render(format!(
                "fps must be a positive number, got {}",
                settings.fps
            )));
        }
        Ok(Self {
            renderer,
            config,
            settings,
            cancel: None,
        })
    }

    /// Stop at the next window boundary once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Timestamp of output frame `index`.
    pub fn frame_time(&self, index: u64) -> f64 {
        index as f64 / self.settings.fps
    }

    /// Run every frame through `sink`.
    ///
    /// On any error, or on cancellation, the sink is aborted so no partial
    /// output is left behind.
    pub fn run(
        &self,
        source: Option<&mut dyn FrameSource>,
        sink: &mut dyn FrameSink,
        progress: Option<&ProgressCallback>,
    ) -> HudResult<PipelineSummary> {
        let start = Instant::now();
        let result = self
            .run_frames(source, sink, progress)
            .and_then(|written| sink.finish().map(|()| written));

        match result {
            Ok(frames_written) => {
                let summary = PipelineSummary {
                    frames_written,
                    elapsed_secs: start.elapsed().as_secs_f64(),
                };
                tracing::info!(
                    frames = summary.frames_written,
                    elapsed_secs = summary.elapsed_secs,
                    "Pipeline complete"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Pipeline stopped; aborting output");
                sink.abort();
                Err(err)
            }
        }
    }

    fn run_frames(
        &self,
        mut source: Option<&mut dyn FrameSource>,
        sink: &mut dyn FrameSink,
        progress: Option<&ProgressCallback>,
    ) -> HudResult<u64> {
        let total = self.settings.total_frames;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.workers)
            .thread_name(|i| format!("djihud-render-{i}"))
            .build()
            .map_err(|e| HudError::render(format!("failed to start render pool: {e}")))?;
        let window = window_size(
            pool.current_num_threads(),
            self.settings.width,
            self.settings.height,
            source.is_some(),
        );

        tracing::info!(
            total_frames = total,
            width = self.settings.width,
            height = self.settings.height,
            fps = self.settings.fps,
            workers = pool.current_num_threads(),
            window,
            composite = source.is_some(),
            "Starting render pipeline"
        );

        let mut reorder = ReorderBuffer::new(0);
        let mut written = 0u64;
        let mut window_start = 0u64;

        while window_start < total {
            if self.is_cancelled() {
                return Err(HudError::Cancelled);
            }
            let window_end = (window_start + window).min(total);

            let mut failure: Option<HudError> = None;
            let (tx, rx) = mpsc::channel::<(u64, HudResult<RgbaImage>)>();

            pool.in_place_scope(|scope| {
                let mut accept = |index: u64, frame: HudResult<RgbaImage>| {
                    if failure.is_some() {
                        return;
                    }
                    match frame {
                        Ok(image) => {
                            reorder.insert(index, image);
                        }
                        Err(err) => {
                            failure = Some(err);
                            return;
                        }
                    }
                    while let Some((ready, image)) = reorder.pop_ready() {
                        if let Err(err) = sink.write_frame(ready, &image) {
                            failure = Some(err);
                            return;
                        }
                        written += 1;
                        if let Some(cb) = progress {
                            cb(FrameProgress {
                                current: ready + 1,
                                total,
                            });
                        }
                    }
                };

                // Sources decode sequentially on this thread; finished frames
                // are drained between decodes.
                for index in window_start..window_end {
                    let base = match source.as_deref_mut() {
                        Some(src) => match src.frame_at(self.frame_time(index)) {
                            Ok(frame) => Some(frame),
                            Err(err) => {
                                accept(index, Err(err));
                                break;
                            }
                        },
                        None => None,
                    };
                    let tx = tx.clone();
                    scope.spawn(move |_| {
                        let frame = if self.is_cancelled() {
                            Err(HudError::Cancelled)
                        } else {
                            self.render_frame(index, base)
                        };
                        let _ = tx.send((index, frame));
                    });
                    for (done, frame) in rx.try_iter() {
                        accept(done, frame);
                    }
                }
                drop(tx);

                for (done, frame) in rx.iter() {
                    accept(done, frame);
                }
            });

            if let Some(err) = failure {
                return Err(err);
            }
            window_start = window_end;
        }

        Ok(written)
    }

    fn render_frame(&self, index: u64, base: Option<RgbaImage>) -> HudResult<RgbaImage> {
        let t = self.frame_time(index);
        let overlay = self.renderer.render(
            t,
            &self.config,
            self.settings.width,
            self.settings.height,
        )?;
        match base {
            Some(mut frame) => {
                alpha_blend(&mut frame, &overlay.image)?;
                Ok(frame)
            }
            None => Ok(overlay.image),
        }
    }
}
