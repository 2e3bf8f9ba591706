use std::io::Write;

use chrono::NaiveDateTime;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Time, Track, TrackSegment, Waypoint};

use djihud_common::error::{HudError, HudResult};
use djihud_telemetry::track::TelemetryTrack;

const CREATOR: &str = concat!("djihud ", env!("CARGO_PKG_VERSION"));

/// Capture times carry no zone; they are written as UTC.
fn gpx_time(timestamp: NaiveDateTime) -> Option<Time> {
    let nanos = timestamp.and_utc().timestamp_nanos_opt()?;
    time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .ok()
        .map(Time::from)
}

/// Build the GPX 1.1 document: one track, one segment, one point per frame
/// with a valid fix.
pub fn build_gpx(track: &TelemetryTrack, name: Option<&str>) -> Gpx {
    let mut segment = TrackSegment::new();
    for frame in track.frames() {
        let Some(fix) = frame.coordinates() else {
            continue;
        };
        let mut point = Waypoint::new(Point::new(fix.longitude, fix.latitude));
        point.elevation = frame.altitude_m;
        point.time = frame.timestamp.and_then(gpx_time);
        point.sat = frame.satellites.map(u64::from);
        segment.points.push(point);
    }

    let skipped = track.len() - segment.points.len();
    if skipped > 0 {
        tracing::warn!(
            skipped,
            points = segment.points.len(),
            "Frames without a GPS fix left out of GPX track"
        );
    }

    let mut gpx_track = Track::new();
    gpx_track.name = name.map(str::to_string);
    gpx_track.segments.push(segment);

    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.to_string()),
        tracks: vec![gpx_track],
        ..Gpx::default()
    }
}

pub fn write_gpx<W: Write>(
    track: &TelemetryTrack,
    name: Option<&str>,
    writer: W,
) -> HudResult<()> {
    gpx::write(&build_gpx(track, name), writer)
        .map_err(|e| HudError::Other(anyhow::Error::new(e)))
}
