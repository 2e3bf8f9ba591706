pub mod export;
pub mod frames;
pub mod info;
pub mod overlay;
pub mod overlay_only;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use djihud_common::config::RenderDefaults;
use djihud_render_engine::{
    CanvasSpec, FrameProgress, OverlayConfig, ProgressCallback, RenderOptions,
};
use djihud_telemetry::{parse_srt, TelemetryTrack, MPS_TO_KMH};

use crate::{CanvasArgs, WidgetArgs};

const PROGRESS_BAR_WIDTH: usize = 50;

pub fn overlay_config(widgets: &WidgetArgs, defaults: &RenderDefaults) -> OverlayConfig {
    OverlayConfig {
        show_altitude: !widgets.no_altitude,
        show_speed: !widgets.no_speed,
        show_vertical_speed: !widgets.no_vspeed,
        show_coordinates: !widgets.no_coords,
        show_camera_settings: !widgets.no_camera,
        show_timestamp: !widgets.no_timestamp,
        show_speed_gauge: !widgets.no_gauge,
        gauge_max_speed_kmh: widgets.gauge_max.unwrap_or(defaults.gauge_max_speed_kmh),
    }
}

pub fn canvas_spec(canvas: &CanvasArgs, defaults: &RenderDefaults) -> CanvasSpec {
    CanvasSpec {
        width: canvas.width.unwrap_or(defaults.width),
        height: canvas.height.unwrap_or(defaults.height),
        fps: canvas.fps.unwrap_or(defaults.fps),
    }
}

pub fn render_options(defaults: &RenderDefaults, cancel: Arc<AtomicBool>) -> RenderOptions {
    RenderOptions {
        workers: defaults.workers,
        font_path: defaults.font_path.clone(),
        cancel: Some(cancel),
    }
}

/// `<dir>/<stem><suffix>` next to `input`.
pub fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}{suffix}"))
}

/// Raise the returned flag on Ctrl-C so an in-flight render stops cleanly.
pub fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = Arc::clone(&flag);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted; stopping after the current frames...");
            handle.store(true, Ordering::Relaxed);
        }
    });
    flag
}

pub fn progress_bar(quiet: bool) -> Option<ProgressCallback> {
    if quiet {
        return None;
    }
    Some(Box::new(|p: FrameProgress| {
        let fraction = if p.total == 0 {
            1.0
        } else {
            p.current as f64 / p.total as f64
        };
        let filled = ((PROGRESS_BAR_WIDTH as f64 * fraction) as usize).min(PROGRESS_BAR_WIDTH);
        let bar = format!(
            "{}{}",
            "=".repeat(filled),
            "-".repeat(PROGRESS_BAR_WIDTH - filled)
        );
        let mut stdout = std::io::stdout();
        let _ = write!(
            stdout,
            "\r[{bar}] {:.1}% ({}/{})",
            fraction * 100.0,
            p.current,
            p.total
        );
        if p.current >= p.total {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }))
}

pub fn load_track(srt: &Path) -> anyhow::Result<Arc<TelemetryTrack>> {
    println!("Parsing telemetry: {}", srt.display());
    let track = parse_srt(srt).map_err(|e| anyhow::anyhow!("Failed to parse telemetry: {e}"))?;
    println!("  Loaded {} frames", track.len());
    println!("  Duration: {:.1}s", track.duration_seconds());
    println!("  Max altitude: {:.1}m", track.max_altitude());
    println!("  Max speed: {:.1} km/h", track.max_speed() * MPS_TO_KMH);
    Ok(Arc::new(track))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path() {
        assert_eq!(
            sibling_path(Path::new("/flights/DJI_0001.MP4"), "_telemetry.mp4"),
            PathBuf::from("/flights/DJI_0001_telemetry.mp4")
        );
        assert_eq!(
            sibling_path(Path::new("DJI_0001.SRT"), "_frames"),
            PathBuf::from("DJI_0001_frames")
        );
    }

    #[test]
    fn test_flags_map_to_config() {
        let widgets = WidgetArgs {
            no_coords: true,
            no_gauge: true,
            ..WidgetArgs::default()
        };
        let config = overlay_config(&widgets, &RenderDefaults::default());
        assert!(config.show_altitude);
        assert!(!config.show_coordinates);
        assert!(!config.show_speed_gauge);
        assert_eq!(config.gauge_max_speed_kmh, 50.0);

        let widgets = WidgetArgs {
            gauge_max: Some(120.0),
            ..WidgetArgs::default()
        };
        assert_eq!(
            overlay_config(&widgets, &RenderDefaults::default()).gauge_max_speed_kmh,
            120.0
        );
    }

    #[test]
    fn test_canvas_defaults_come_from_config() {
        let defaults = RenderDefaults {
            width: 3840,
            height: 2160,
            ..RenderDefaults::default()
        };
        let canvas = CanvasArgs {
            fps: Some(60.0),
            ..CanvasArgs::default()
        };
        assert_eq!(
            canvas_spec(&canvas, &defaults),
            CanvasSpec {
                width: 3840,
                height: 2160,
                fps: 60.0
            }
        );
    }
}
