//! djihud Exporter
//!
//! Writes a telemetry track to interchange formats at its original
//! per-cue granularity:
//! - **CSV:** one row per frame
//! - **JSON:** per-frame array plus a flight summary
//! - **GPX:** a 1.1 track with one point per frame that has a GPS fix

pub mod format;
pub mod record;
pub mod writers;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use djihud_common::error::{HudError, HudResult};
use djihud_telemetry::track::TelemetryTrack;

pub use format::ExportFormat;
pub use record::{ExportRecord, ExportSummary};

/// Export `track` to `path`.
///
/// `format` overrides the extension when given. The format is resolved
/// before the file is created, and a failed write removes the file.
pub fn export(
    track: &TelemetryTrack,
    path: &Path,
    format: Option<&str>,
) -> HudResult<ExportFormat> {
    let format = ExportFormat::resolve(format, path)?;

    let file = File::create(path).map_err(|e| HudError::pipeline_io(path, e.to_string()))?;
    let result = write_format(track, format, path, BufWriter::new(file));

    if let Err(err) = result {
        let _ = std::fs::remove_file(path);
        return Err(err);
    }

    tracing::info!(
        path = %path.display(),
        format = %format,
        frames = track.len(),
        "Exported telemetry"
    );
    Ok(format)
}

/// Write `track` as `format`; any failure is reported against `path`.
fn write_format<W: Write>(
    track: &TelemetryTrack,
    format: ExportFormat,
    path: &Path,
    mut writer: W,
) -> HudResult<()> {
    let name = path.file_stem().and_then(|s| s.to_str());
    match format {
        ExportFormat::Csv => writers::write_csv(track, &mut writer),
        ExportFormat::Json => writers::write_json(track, &mut writer),
        ExportFormat::Gpx => writers::write_gpx(track, name, &mut writer),
    }
    .and_then(|()| writer.flush().map_err(HudError::from))
    .map_err(|e| match e {
        HudError::PipelineIo { .. } => e,
        other => HudError::pipeline_io(path, other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use djihud_telemetry::frame::TelemetryFrame;

    fn three_frame_track() -> TelemetryTrack {
        let frames = (0..3u32)
            .map(|i| {
                let mut frame =
                    TelemetryFrame::new(i + 1, u64::from(i) * 1000, u64::from(i + 1) * 1000);
                frame.latitude = Some(46.5 + f64::from(i) * 0.001);
                frame.longitude = Some(7.9);
                frame.altitude_m = Some(50.0);
                frame
            })
            .collect();
        TelemetryTrack::new(frames).unwrap()
    }

    #[test]
    fn test_every_format_has_one_record_per_frame() {
        let tmp = tempfile::tempdir().unwrap();
        let track = three_frame_track();

        let csv_path = tmp.path().join("flight.csv");
        assert_eq!(export(&track, &csv_path, None).unwrap(), ExportFormat::Csv);
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 1 + 3);

        let json_path = tmp.path().join("flight.json");
        export(&track, &json_path, None).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["frames"].as_array().unwrap().len(), 3);

        let gpx_path = tmp.path().join("flight.gpx");
        export(&track, &gpx_path, None).unwrap();
        let gpx = std::fs::read_to_string(&gpx_path).unwrap();
        assert_eq!(gpx.matches("<trkpt").count(), 3);
    }

    #[test]
    fn test_explicit_format_overrides_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("flight.csv");
        assert_eq!(
            export(&three_frame_track(), &path, Some("json")).unwrap(),
            ExportFormat::Json
        );
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('{'));
    }

    #[test]
    fn test_unknown_format_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("flight.kml");
        let err = export(&three_frame_track(), &path, None).unwrap_err();
        assert!(matches!(err, HudError::ExportFormat { .. }));
        assert!(!path.exists());

        let path = tmp.path().join("flight.csv");
        assert!(export(&three_frame_track(), &path, Some("xml")).is_err());
        assert!(!path.exists());
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_names_destination() {
        let path = Path::new("/flights/export/flight");
        for format in [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Gpx] {
            let err = write_format(&three_frame_track(), format, path, FullDisk).unwrap_err();
            assert!(matches!(err, HudError::PipelineIo { .. }), "{format}: {err}");
            assert!(err.to_string().contains("/flights/export/flight"), "{err}");
        }
    }

    #[test]
    fn test_unwritable_destination_is_pipeline_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing-dir").join("flight.csv");
        let err = export(&three_frame_track(), &path, None).unwrap_err();
        assert!(matches!(err, HudError::PipelineIo { .. }));
    }
}
