//! Render the overlay as an image sequence for external editors.

use std::path::PathBuf;

use djihud_common::config::AppConfig;
use djihud_render_engine::{generate_overlay_frames, SequenceFormat};

use super::{
    canvas_spec, cancel_on_ctrl_c, load_track, overlay_config, progress_bar, render_options,
    sibling_path,
};
use crate::{CanvasArgs, WidgetArgs};

pub async fn run(
    config: &AppConfig,
    srt: PathBuf,
    output: Option<PathBuf>,
    format: Option<String>,
    quiet: bool,
    canvas: CanvasArgs,
    widgets: WidgetArgs,
) -> anyhow::Result<()> {
    let format = SequenceFormat::parse(format.as_deref().unwrap_or(&config.render.image_format))
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let output = output.unwrap_or_else(|| sibling_path(&srt, "_frames"));
    let canvas = canvas_spec(&canvas, &config.render);

    let track = load_track(&srt)?;

    println!();
    println!(
        "Rendering {} frames: {}x{} @ {}fps",
        format.extension(),
        canvas.width,
        canvas.height,
        canvas.fps
    );
    let summary = generate_overlay_frames(
        track,
        &output,
        canvas,
        overlay_config(&widgets, &config.render),
        format,
        render_options(&config.render, cancel_on_ctrl_c()),
        progress_bar(quiet),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Rendering failed: {e}"))?;

    println!(
        "Done: {} frames in {} ({:.1}s)",
        summary.frames_written,
        output.display(),
        summary.elapsed_secs
    );
    Ok(())
}
