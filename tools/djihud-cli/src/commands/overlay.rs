//! Composite the telemetry HUD over source footage.

use std::path::{Path, PathBuf};

use djihud_common::config::AppConfig;
use djihud_render_engine::{add_audio, process_video};

use super::{
    cancel_on_ctrl_c, load_track, overlay_config, progress_bar, render_options, sibling_path,
};
use crate::WidgetArgs;

/// The `.SRT` DJI writes next to `video`, upper- or lower-case.
fn default_srt(video: &Path) -> Option<PathBuf> {
    ["SRT", "srt"]
        .iter()
        .map(|ext| video.with_extension(ext))
        .find(|p| p.exists())
}

/// Video-only render target for `output`, in the same container.
fn scratch_path(output: &Path) -> PathBuf {
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    sibling_path(output, &format!("_noaudio.{ext}"))
}

pub async fn run(
    config: &AppConfig,
    video: PathBuf,
    srt: Option<PathBuf>,
    output: Option<PathBuf>,
    audio: bool,
    quiet: bool,
    widgets: WidgetArgs,
) -> anyhow::Result<()> {
    if !video.exists() {
        anyhow::bail!("Video not found: {}", video.display());
    }
    let srt = match srt {
        Some(srt) => srt,
        None => default_srt(&video).ok_or_else(|| {
            anyhow::anyhow!(
                "No telemetry file next to {}; pass one with --srt",
                video.display()
            )
        })?,
    };
    let output = output.unwrap_or_else(|| sibling_path(&video, "_telemetry.mp4"));
    tracing::debug!(
        srt = %srt.display(),
        output = %output.display(),
        audio,
        "Resolved overlay paths"
    );

    let track = load_track(&srt)?;
    let overlay = overlay_config(&widgets, &config.render);
    let options = render_options(&config.render, cancel_on_ctrl_c());

    // Without audio the render goes straight to `output`; with it, to a
    // scratch file that the remux consumes.
    let render_target = if audio {
        scratch_path(&output)
    } else {
        output.clone()
    };

    println!();
    println!("Processing video: {}", video.display());
    let summary = process_video(
        &video,
        track,
        &render_target,
        overlay,
        None,
        options,
        progress_bar(quiet),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Processing failed: {e}"))?;

    if audio {
        println!("Adding audio track...");
        let remux = add_audio(&render_target, &video, &output).await;
        let _ = std::fs::remove_file(&render_target);
        if let Err(e) = remux {
            let _ = std::fs::remove_file(&output);
            anyhow::bail!("Adding audio failed: {e}");
        }
    }

    println!(
        "Done: {} ({} frames in {:.1}s)",
        output.display(),
        summary.frames_written,
        summary.elapsed_secs
    );
    Ok(())
}
