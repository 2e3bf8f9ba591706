//! Show telemetry or video information.

use std::path::PathBuf;

use djihud_render_engine::get_video_info;
use djihud_telemetry::{parse_srt, MPS_TO_KMH};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

pub async fn run(path: PathBuf) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "srt" {
        show_telemetry(path)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        let info = get_video_info(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read video info: {e}"))?;
        println!("Video: {}", path.display());
        println!("  Resolution: {}x{}", info.width, info.height);
        println!("  FPS: {:.2}", info.fps);
        println!("  Frames: {}", info.frame_count);
        println!("  Duration: {:.1}s", info.duration_seconds);
        Ok(())
    } else {
        anyhow::bail!("Unsupported file type: {}", path.display())
    }
}

fn show_telemetry(path: PathBuf) -> anyhow::Result<()> {
    let track = parse_srt(&path).map_err(|e| anyhow::anyhow!("Failed to parse telemetry: {e}"))?;
    let summary = track.summary();

    println!("Telemetry: {}", path.display());
    println!("  Frames: {}", summary.frame_count);
    println!("  Duration: {:.1}s", summary.duration_seconds);
    println!("  Distance: {:.1}m", summary.total_distance_m);
    println!("  Max altitude: {:.1}m", summary.max_altitude_m);
    println!("  Max speed: {:.1} km/h", summary.max_speed_mps * MPS_TO_KMH);
    match summary.start_coordinates {
        Some(p) => println!("  Start: {:.6}, {:.6}", p.latitude, p.longitude),
        None => println!("  Start: no GPS fix"),
    }
    if let Some(p) = summary.end_coordinates {
        println!("  End: {:.6}, {:.6}", p.latitude, p.longitude);
    }
    if let Some(first) = track.frames().first() {
        if let Some(ts) = first.timestamp {
            println!("  Recorded: {}", ts.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    Ok(())
}
