//! Render a standalone overlay video from telemetry alone.

use std::path::PathBuf;

use djihud_common::config::AppConfig;
use djihud_render_engine::generate_overlay_video;

use super::{
    canvas_spec, cancel_on_ctrl_c, load_track, overlay_config, progress_bar, render_options,
    sibling_path,
};
use crate::{CanvasArgs, WidgetArgs};

pub async fn run(
    config: &AppConfig,
    srt: PathBuf,
    output: Option<PathBuf>,
    quiet: bool,
    canvas: CanvasArgs,
    widgets: WidgetArgs,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| sibling_path(&srt, "_overlay.mp4"));
    let canvas = canvas_spec(&canvas, &config.render);

    let track = load_track(&srt)?;

    println!();
    println!(
        "Rendering overlay: {}x{} @ {}fps",
        canvas.width, canvas.height, canvas.fps
    );
    let summary = generate_overlay_video(
        track,
        &output,
        canvas,
        overlay_config(&widgets, &config.render),
        render_options(&config.render, cancel_on_ctrl_c()),
        progress_bar(quiet),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Rendering failed: {e}"))?;

    println!(
        "Done: {} ({} frames in {:.1}s)",
        output.display(),
        summary.frames_written,
        summary.elapsed_secs
    );
    Ok(())
}
