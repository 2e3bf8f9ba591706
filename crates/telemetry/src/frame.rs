//! A single parsed telemetry cue.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::timecode::{ms_to_secs, OffsetMs};

/// Camera exposure settings reported alongside a cue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub iso: Option<u32>,
    /// Shutter as printed by the aircraft, e.g. `1/500.0`.
    pub shutter: Option<String>,
    /// Aperture f-number, e.g. `2.8`.
    pub fnum: Option<f64>,
    /// Exposure bias in stops.
    pub ev: Option<f64>,
}

impl CameraSettings {
    pub fn is_empty(&self) -> bool {
        self.iso.is_none() && self.shutter.is_none() && self.fnum.is_none() && self.ev.is_none()
    }
}

/// One cue of the side file in structured form.
///
/// Offsets are milliseconds from the start of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Cue number as written in the file.
    pub index: u32,
    pub start_ms: OffsetMs,
    pub end_ms: OffsetMs,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Altitude in meters (relative altitude when the firmware reports both).
    pub altitude_m: Option<f64>,
    pub horizontal_speed_mps: Option<f64>,
    pub vertical_speed_mps: Option<f64>,

    pub camera: CameraSettings,

    /// Wall-clock capture time printed by the aircraft.
    pub timestamp: Option<NaiveDateTime>,
    pub satellites: Option<u32>,
}

impl TelemetryFrame {
    /// Create a frame with only its timing populated.
    pub fn new(index: u32, start_ms: OffsetMs, end_ms: OffsetMs) -> Self {
        Self {
            index,
            start_ms,
            end_ms: end_ms.max(start_ms),
            latitude: None,
            longitude: None,
            altitude_m: None,
            horizontal_speed_mps: None,
            vertical_speed_mps: None,
            camera: CameraSettings::default(),
            timestamp: None,
            satellites: None,
        }
    }

    pub fn start_time_s(&self) -> f64 {
        ms_to_secs(self.start_ms)
    }

    pub fn end_time_s(&self) -> f64 {
        ms_to_secs(self.end_ms)
    }

    /// The GPS fix, if both axes are present and it is a real lock.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        let point = GeoPoint::new(self.latitude?, self.longitude?);
        point.is_valid().then_some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_inverted_range() {
        let frame = TelemetryFrame::new(1, 2000, 1000);
        assert_eq!(frame.end_ms, 2000);
        assert!(frame.end_time_s() >= frame.start_time_s());
    }

    #[test]
    fn test_coordinates_require_both_axes() {
        let mut frame = TelemetryFrame::new(1, 0, 1000);
        frame.latitude = Some(40.0);
        assert_eq!(frame.coordinates(), None);
        frame.longitude = Some(-74.0);
        assert_eq!(frame.coordinates(), Some(GeoPoint::new(40.0, -74.0)));
    }

    #[test]
    fn test_zero_fix_is_ignored() {
        let mut frame = TelemetryFrame::new(1, 0, 1000);
        frame.latitude = Some(0.0);
        frame.longitude = Some(0.0);
        assert_eq!(frame.coordinates(), None);
    }
}
