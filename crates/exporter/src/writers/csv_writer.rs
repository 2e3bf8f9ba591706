use std::io::Write;

use djihud_common::error::{HudError, HudResult};
use djihud_telemetry::track::TelemetryTrack;

use crate::record::records;

/// One header row, then one row per frame. Missing values are empty cells.
pub fn write_csv<W: Write>(track: &TelemetryTrack, writer: W) -> HudResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    for record in records(track) {
        out.serialize(&record).map_err(|e| HudError::Other(anyhow::Error::new(e)))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use djihud_telemetry::frame::TelemetryFrame;

    #[test]
    fn test_header_then_one_row_per_frame() {
        let mut a = TelemetryFrame::new(1, 0, 500);
        a.latitude = Some(1.5);
        a.longitude = Some(2.5);
        a.camera.shutter = Some("1/1000".to_string());
        let b = TelemetryFrame::new(2, 500, 1000);
        let track = TelemetryTrack::new(vec![a, b]).unwrap();

        let mut out = Vec::new();
        write_csv(&track, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "time_s,timestamp,latitude,longitude,altitude_m,speed_mps,vertical_speed_mps,\
             iso,shutter,fnum,ev,satellites,frame,end_time_s,speed_kmh"
        );
        assert!(lines[1].starts_with("0.0,,1.5,2.5,"));
        assert!(lines[1].contains("1/1000"));
        assert!(lines[2].starts_with("0.5,,,,"));
    }
}
