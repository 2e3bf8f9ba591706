use std::io::Write;

use serde::Serialize;

use djihud_common::error::HudResult;
use djihud_telemetry::track::TelemetryTrack;

use crate::record::{records, ExportRecord, ExportSummary};

#[derive(Serialize)]
struct JsonDocument {
    summary: ExportSummary,
    frames: Vec<ExportRecord>,
}

/// A pretty-printed `{ "summary": {..}, "frames": [..] }` document.
pub fn write_json<W: Write>(track: &TelemetryTrack, mut writer: W) -> HudResult<()> {
    let document = JsonDocument {
        summary: ExportSummary::from(track.summary()),
        frames: records(track),
    };
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use djihud_telemetry::frame::TelemetryFrame;

    #[test]
    fn test_document_shape() {
        let mut a = TelemetryFrame::new(1, 0, 1000);
        a.altitude_m = Some(12.0);
        a.horizontal_speed_mps = Some(5.0);
        let track = TelemetryTrack::new(vec![a]).unwrap();

        let mut out = Vec::new();
        write_json(&track, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["frames"].as_array().unwrap().len(), 1);
        assert_eq!(value["frames"][0]["altitude_m"], 12.0);
        assert_eq!(value["frames"][0]["latitude"], serde_json::Value::Null);
        assert_eq!(value["summary"]["frame_count"], 1);
        assert_eq!(value["summary"]["max_speed_kmh"], 18.0);
        assert_eq!(value["summary"]["duration_seconds"], 1.0);
    }
}
