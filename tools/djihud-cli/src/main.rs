//! djihud CLI: burn DJI flight telemetry into footage and export it.
//!
//! Usage:
//!   djihud overlay <VIDEO>          Composite the HUD over a video
//!   djihud overlay-only <SRT>       Render a standalone overlay video
//!   djihud frames <SRT>             Render the overlay as an image sequence
//!   djihud export <SRT> -o <FILE>   Export telemetry to CSV, JSON or GPX
//!   djihud info <PATH>              Show telemetry or video information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use djihud_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "djihud",
    about = "Overlay DJI drone telemetry on flight footage",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Widget toggles shared by every render command.
#[derive(Args, Debug, Clone, Default)]
pub struct WidgetArgs {
    /// Hide altitude
    #[arg(long)]
    pub no_altitude: bool,

    /// Hide horizontal speed
    #[arg(long)]
    pub no_speed: bool,

    /// Hide vertical speed
    #[arg(long)]
    pub no_vspeed: bool,

    /// Hide GPS coordinates
    #[arg(long)]
    pub no_coords: bool,

    /// Hide camera settings
    #[arg(long)]
    pub no_camera: bool,

    /// Hide timestamp
    #[arg(long)]
    pub no_timestamp: bool,

    /// Hide speed gauge
    #[arg(long)]
    pub no_gauge: bool,

    /// Speed gauge full scale in km/h [default: 50]
    #[arg(long)]
    pub gauge_max: Option<f64>,
}

/// Canvas geometry for renders without a source video.
#[derive(Args, Debug, Clone, Default)]
pub struct CanvasArgs {
    /// Canvas width [default: 1920]
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Canvas height [default: 1080]
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Frames per second [default: 30]
    #[arg(long)]
    pub fps: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite the telemetry HUD over a video
    Overlay {
        /// Input video file
        video: PathBuf,

        /// Telemetry file (default: the video's sibling .SRT)
        #[arg(short, long)]
        srt: Option<PathBuf>,

        /// Output video file (default: <video>_telemetry.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Copy audio from the original video
        #[arg(short, long)]
        audio: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        widgets: WidgetArgs,
    },

    /// Render a standalone overlay video (.mov or .webm keep transparency)
    OverlayOnly {
        /// Telemetry file
        srt: PathBuf,

        /// Output video file (default: <srt>_overlay.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        canvas: CanvasArgs,

        #[command(flatten)]
        widgets: WidgetArgs,
    },

    /// Render the overlay as a transparent image sequence
    Frames {
        /// Telemetry file
        srt: PathBuf,

        /// Output directory (default: <srt>_frames)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image format: png or jpg [default: png]
        #[arg(short, long)]
        format: Option<String>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        canvas: CanvasArgs,

        #[command(flatten)]
        widgets: WidgetArgs,
    },

    /// Export telemetry to CSV, JSON or GPX
    Export {
        /// Telemetry file
        srt: PathBuf,

        /// Output file; the extension picks the format
        #[arg(short, long)]
        output: PathBuf,

        /// Output format, overriding the extension: csv, json or gpx
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Show information about a telemetry or video file
    Info {
        /// .SRT telemetry or video file
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    djihud_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Overlay {
            video,
            srt,
            output,
            audio,
            quiet,
            widgets,
        } => commands::overlay::run(&config, video, srt, output, audio, quiet, widgets).await,
        Commands::OverlayOnly {
            srt,
            output,
            quiet,
            canvas,
            widgets,
        } => commands::overlay_only::run(&config, srt, output, quiet, canvas, widgets).await,
        Commands::Frames {
            srt,
            output,
            format,
            quiet,
            canvas,
            widgets,
        } => commands::frames::run(&config, srt, output, format, quiet, canvas, widgets).await,
        Commands::Export {
            srt,
            output,
            format,
        } => commands::export::run(srt, output, format),
        Commands::Info { path } => commands::info::run(path).await,
    }
}
