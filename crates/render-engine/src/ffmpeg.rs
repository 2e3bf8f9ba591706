//! ffmpeg/ffprobe collaborators: probing, raw-frame decode and encode pipes,
//! and audio remuxing.

use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use djihud_common::error::{HudError, HudResult};

use crate::compositor::nearest_source_index;
use crate::frames::{FrameSink, FrameSource};

/// Basic properties of a video file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: u64,
    pub duration_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct MetadataOutput {
    #[serde(default)]
    streams: Vec<MetadataStream>,
    format: Option<MetadataFormat>,
}

#[derive(Debug, Deserialize)]
struct MetadataStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataFormat {
    duration: Option<String>,
}

/// Parse an ffprobe rate such as `"30000/1001"` or `"25"`.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

pub(crate) fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Fail early with a readable message when ffmpeg tooling is missing.
pub fn ensure_ffmpeg() -> HudResult<()> {
    for binary in ["ffmpeg", "ffprobe"] {
        if !command_exists(binary) {
            return Err(HudError::render(format!(
                "{binary} not found in PATH; install ffmpeg to render video"
            )));
        }
    }
    Ok(())
}

/// Read width, height, frame rate, frame count and duration of `path`.
pub fn read_video_info(path: &Path) -> HudResult<VideoInfo> {
    if !path.exists() {
        return Err(HudError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| HudError::pipeline_io(path, format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(HudError::pipeline_io(
            path,
            format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    let info = parse_metadata_json(&output.stdout, path)?;
    tracing::debug!(
        path = %path.display(),
        width = info.width,
        height = info.height,
        fps = info.fps,
        frame_count = info.frame_count,
        "Read video metadata"
    );
    Ok(info)
}

fn parse_metadata_json(raw: &[u8], path: &Path) -> HudResult<VideoInfo> {
    let metadata: MetadataOutput = serde_json::from_slice(raw)?;
    let stream = metadata
        .streams
        .first()
        .ok_or_else(|| HudError::pipeline_io(path, "no video stream found"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(HudError::pipeline_io(path, "video stream has no dimensions")),
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| HudError::pipeline_io(path, "video stream has no frame rate"))?;

    let duration_seconds = stream
        .duration
        .as_deref()
        .or_else(|| metadata.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| (duration_seconds * fps).round() as u64);

    Ok(VideoInfo {
        width,
        height,
        fps,
        frame_count,
        duration_seconds,
    })
}

/// Whether the container chosen by `path`'s extension keeps an alpha channel.
pub fn container_keeps_alpha(path: &Path) -> bool {
    matches!(extension_lower(path).as_deref(), Some("mov") | Some("webm"))
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn codec_args_for_output(path: &Path) -> Vec<String> {
    let args: &[&str] = match extension_lower(path).as_deref() {
        Some("mov") => &["-c:v", "prores_ks", "-profile:v", "4444", "-pix_fmt", "yuva444p10le"],
        Some("webm") => &[
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuva420p",
            "-b:v",
            "0",
            "-crf",
            "30",
        ],
        _ => &[
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-crf",
            "18",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ],
    };
    args.iter().map(|s| s.to_string()).collect()
}

/// Sibling path the encoder writes to until `finish` renames it into place.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{stem}.partial.{}", ext.to_string_lossy()),
        None => format!("{stem}.partial"),
    };
    output.with_file_name(name)
}

fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    }))
}

fn join_stderr(task: Option<JoinHandle<String>>) -> String {
    task.map(|t| {
        t.join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
    })
    .unwrap_or_default()
}

/// Encodes RGBA frames by piping them into an ffmpeg child process.
///
/// Output goes to a `.partial` sibling first; the destination only appears
/// once the encode succeeds.
pub struct FfmpegEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    output: PathBuf,
    partial: PathBuf,
    width: u32,
    height: u32,
}

impl FfmpegEncoder {
    pub fn spawn(output: &Path, width: u32, height: u32, fps: f64) -> HudResult<Self> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| HudError::pipeline_io(parent, e.to_string()))?;
        }
        let partial = partial_path(output);

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgba".into(),
            "-s".into(),
            format!("{width}x{height}"),
            "-r".into(),
            format!("{fps}"),
            "-i".into(),
            "pipe:0".into(),
        ];
        args.extend(codec_args_for_output(output));
        args.push(partial.to_string_lossy().into_owned());

        tracing::debug!(args = ?args, "Starting ffmpeg encoder");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HudError::pipeline_io(output, format!("failed to start ffmpeg: {e}")))?;

        let stdin = child.stdin.take();
        let stderr_task = drain_stderr(&mut child);
        tracing::info!(
            pid = child.id(),
            output = %output.display(),
            width,
            height,
            fps,
            "ffmpeg encoder started"
        );

        Ok(Self {
            child: Some(child),
            stdin,
            stderr_task,
            output: output.to_path_buf(),
            partial,
            width,
            height,
        })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, _index: u64, frame: &RgbaImage) -> HudResult<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(HudError::render(format!(
                "frame {}x{} does not match encoder {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| HudError::pipeline_io(&self.partial, "encoder already closed"))?;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            HudError::pipeline_io(&self.partial, format!("ffmpeg stopped accepting frames: {e}"))
        })
    }

    fn finish(&mut self) -> HudResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Err(HudError::pipeline_io(&self.output, "encoder already finished"));
        };
        let status = child
            .wait()
            .map_err(|e| {
                HudError::pipeline_io(&self.output, format!("failed to wait on ffmpeg: {e}"))
            })?;
        let stderr = join_stderr(self.stderr_task.take());

        if !status.success() {
            let _ = std::fs::remove_file(&self.partial);
            return Err(HudError::pipeline_io(
                &self.output,
                format!("ffmpeg encode failed ({status}): {}", stderr.trim()),
            ));
        }

        std::fs::rename(&self.partial, &self.output)
            .map_err(|e| HudError::pipeline_io(&self.output, e.to_string()))?;
        tracing::info!(output = %self.output.display(), "ffmpeg encoder finished");
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        join_stderr(self.stderr_task.take());
        if self.partial.exists() {
            if let Err(err) = std::fs::remove_file(&self.partial) {
                tracing::warn!(
                    path = %self.partial.display(),
                    error = %err,
                    "Failed to remove partial output"
                );
            }
        }
        tracing::warn!(output = %self.output.display(), "Encode aborted");
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

/// Decodes a video into RGBA frames read sequentially from an ffmpeg pipe.
pub struct FfmpegDecoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: Option<JoinHandle<String>>,
    path: PathBuf,
    info: VideoInfo,
    current: Option<RgbaImage>,
    current_index: Option<u64>,
    exhausted: bool,
}

impl FfmpegDecoder {
    pub fn open(path: &Path, info: VideoInfo) -> HudResult<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HudError::pipeline_io(path, format!("failed to start ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HudError::pipeline_io(path, "failed to capture ffmpeg stdout"))?;
        let stderr_task = drain_stderr(&mut child);

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stderr_task,
            path: path.to_path_buf(),
            info,
            current: None,
            current_index: None,
            exhausted: false,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_next(&mut self) -> HudResult<Option<RgbaImage>> {
        let len = self.info.width as usize * self.info.height as usize * 4;
        let mut buf = vec![0u8; len];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(HudError::pipeline_io(&self.path, e.to_string())),
        }
        RgbaImage::from_raw(self.info.width, self.info.height, buf)
            .map(Some)
            .ok_or_else(|| HudError::pipeline_io(&self.path, "short frame from decoder"))
    }
}

impl FrameSource for FfmpegDecoder {
    fn frame_at(&mut self, t: f64) -> HudResult<RgbaImage> {
        let target = nearest_source_index(t, self.info.fps, self.info.frame_count.max(1));
        while !self.exhausted && self.current_index.map_or(true, |i| i < target) {
            match self.read_next()? {
                Some(frame) => {
                    self.current = Some(frame);
                    self.current_index = Some(self.current_index.map_or(0, |i| i + 1));
                }
                None => {
                    self.exhausted = true;
                    tracing::debug!(
                        path = %self.path.display(),
                        last_index = ?self.current_index,
                        "Source exhausted; holding last frame"
                    );
                }
            }
        }

        match &self.current {
            Some(frame) => Ok(frame.clone()),
            None => {
                let _ = self.child.kill();
                let _ = self.child.wait();
                let stderr = join_stderr(self.stderr_task.take());
                Err(HudError::pipeline_io(
                    &self.path,
                    format!("source produced no frames: {}", stderr.trim()),
                ))
            }
        }
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Remux `video` with the first audio stream of `audio_source` into `output`.
///
/// The video stream is copied untouched; a source without audio yields a
/// silent copy.
pub fn add_audio(video: &Path, audio_source: &Path, output: &Path) -> HudResult<()> {
    for path in [video, audio_source] {
        if !path.exists() {
            return Err(HudError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let audio_codec = match extension_lower(output).as_deref() {
        Some("webm") => "libopus",
        _ => "copy",
    };

    let result = Command::new("ffmpeg")
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(video)
        .arg("-i")
        .arg(audio_source)
        .args([
            "-map", "0:v:0", "-map", "1:a:0?", "-c:v", "copy", "-c:a", audio_codec, "-shortest",
        ])
        .arg(output)
        .output()
        .map_err(|e| HudError::pipeline_io(output, format!("failed to run ffmpeg: {e}")))?;

    if !result.status.success() {
        let _ = std::fs::remove_file(output);
        return Err(HudError::pipeline_io(
            output,
            format!(
                "audio remux failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            ),
        ));
    }
    tracing::info!(output = %output.display(), source = %audio_source.display(), "Added audio");
    Ok(())
}
