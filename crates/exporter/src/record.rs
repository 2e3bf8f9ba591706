//! Flat per-frame rows shared by the CSV and JSON writers.

use serde::Serialize;

use djihud_telemetry::frame::TelemetryFrame;
use djihud_telemetry::geo::GeoPoint;
use djihud_telemetry::track::{TelemetryTrack, TrackSummary, MPS_TO_KMH};

/// One exported row; field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub time_s: f64,
    pub timestamp: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub vertical_speed_mps: Option<f64>,
    pub iso: Option<u32>,
    pub shutter: Option<String>,
    pub fnum: Option<f64>,
    pub ev: Option<f64>,
    pub satellites: Option<u32>,
    pub frame: u32,
    pub end_time_s: f64,
    /// Derived from `speed_mps`.
    pub speed_kmh: Option<f64>,
}

impl From<&TelemetryFrame> for ExportRecord {
    fn from(frame: &TelemetryFrame) -> Self {
        Self {
            time_s: frame.start_time_s(),
            timestamp: frame
                .timestamp
                .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
            latitude: frame.latitude,
            longitude: frame.longitude,
            altitude_m: frame.altitude_m,
            speed_mps: frame.horizontal_speed_mps,
            vertical_speed_mps: frame.vertical_speed_mps,
            iso: frame.camera.iso,
            shutter: frame.camera.shutter.clone(),
            fnum: frame.camera.fnum,
            ev: frame.camera.ev,
            satellites: frame.satellites,
            frame: frame.index,
            end_time_s: frame.end_time_s(),
            speed_kmh: frame.horizontal_speed_mps.map(|v| v * MPS_TO_KMH),
        }
    }
}

pub fn records(track: &TelemetryTrack) -> Vec<ExportRecord> {
    track.frames().iter().map(ExportRecord::from).collect()
}

/// Flight summary block of the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub frame_count: usize,
    pub duration_seconds: f64,
    pub total_distance_m: f64,
    pub max_altitude_m: f64,
    pub max_speed_mps: f64,
    pub max_speed_kmh: f64,
    pub start_coordinates: Option<GeoPoint>,
    pub end_coordinates: Option<GeoPoint>,
}

impl From<&TrackSummary> for ExportSummary {
    fn from(summary: &TrackSummary) -> Self {
        Self {
            frame_count: summary.frame_count,
            duration_seconds: summary.duration_seconds,
            total_distance_m: summary.total_distance_m,
            max_altitude_m: summary.max_altitude_m,
            max_speed_mps: summary.max_speed_mps,
            max_speed_kmh: summary.max_speed_mps * MPS_TO_KMH,
            start_coordinates: summary.start_coordinates,
            end_coordinates: summary.end_coordinates,
        }
    }
}
