//! The immutable telemetry timeline.
//!
//! A [`TelemetryTrack`] owns the parsed frames in start-time order and
//! answers "what did the aircraft report at time `t`?" via [`TelemetryTrack::sample`].
//! Flight summary metrics are computed once at construction.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use djihud_common::error::{HudError, HudResult};

use crate::frame::{CameraSettings, TelemetryFrame};
use crate::geo::GeoPoint;
use crate::timecode::ms_to_secs;

/// Conversion factor from meters/second to kilometers/hour.
pub const MPS_TO_KMH: f64 = 3.6;

/// Aggregate metrics over a whole track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub frame_count: usize,
    pub duration_seconds: f64,
    /// Sum of great-circle distances between adjacent frames that both carry a fix.
    pub total_distance_m: f64,
    pub max_altitude_m: f64,
    pub max_speed_mps: f64,
    pub start_coordinates: Option<GeoPoint>,
    pub end_coordinates: Option<GeoPoint>,
}

/// Telemetry values at an arbitrary instant.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    /// The instant that was sampled, in seconds from recording start.
    pub time_s: f64,
    /// Position of the preceding frame in the track.
    pub frame_position: usize,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude_m: Option<f64>,
    pub horizontal_speed_mps: Option<f64>,
    pub vertical_speed_mps: Option<f64>,

    pub camera: CameraSettings,
    pub timestamp: Option<NaiveDateTime>,
    pub satellites: Option<u32>,
}

impl TelemetrySample {
    fn from_frame(frame: &TelemetryFrame, position: usize, time_s: f64) -> Self {
        Self {
            time_s,
            frame_position: position,
            latitude: frame.latitude,
            longitude: frame.longitude,
            altitude_m: frame.altitude_m,
            horizontal_speed_mps: frame.horizontal_speed_mps,
            vertical_speed_mps: frame.vertical_speed_mps,
            camera: frame.camera.clone(),
            timestamp: frame.timestamp,
            satellites: frame.satellites,
        }
    }

    pub fn horizontal_speed_kmh(&self) -> Option<f64> {
        self.horizontal_speed_mps.map(|v| v * MPS_TO_KMH)
    }

    pub fn coordinates(&self) -> Option<GeoPoint> {
        let point = GeoPoint::new(self.latitude?, self.longitude?);
        point.is_valid().then_some(point)
    }
}

/// Ordered, immutable sequence of telemetry frames.
#[derive(Debug, Clone)]
pub struct TelemetryTrack {
    frames: Vec<TelemetryFrame>,
    summary: TrackSummary,
}

impl TelemetryTrack {
    /// Build a track, stable-sorting frames by start time if needed.
    pub fn new(mut frames: Vec<TelemetryFrame>) -> HudResult<Self> {
        if frames.is_empty() {
            return Err(HudError::telemetry_parse(
                "a telemetry track needs at least one frame",
                None,
            ));
        }
        if frames.windows(2).any(|w| w[1].start_ms < w[0].start_ms) {
            frames.sort_by_key(|frame| frame.start_ms);
        }

        let summary = summarize(&frames);
        Ok(Self { frames, summary })
    }

    pub fn frames(&self) -> &[TelemetryFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn summary(&self) -> &TrackSummary {
        &self.summary
    }

    pub fn duration_seconds(&self) -> f64 {
        self.summary.duration_seconds
    }

    pub fn total_distance(&self) -> f64 {
        self.summary.total_distance_m
    }

    pub fn max_altitude(&self) -> f64 {
        self.summary.max_altitude_m
    }

    pub fn max_speed(&self) -> f64 {
        self.summary.max_speed_mps
    }

    pub fn start_coordinates(&self) -> Option<GeoPoint> {
        self.summary.start_coordinates
    }

    pub fn end_coordinates(&self) -> Option<GeoPoint> {
        self.summary.end_coordinates
    }

    /// Telemetry at `t` seconds from the start of the recording.
    ///
    /// Outside the track the nearest end frame is returned unchanged. Between
    /// two frames the continuous quantities (position, altitude, speeds) are
    /// linearly interpolated by start time; camera settings, capture time and
    /// satellite count are held from the earlier frame.
    pub fn sample(&self, t: f64) -> TelemetrySample {
        let first = &self.frames[0];
        if t.is_nan() || t <= first.start_time_s() {
            return TelemetrySample::from_frame(first, 0, t);
        }

        let next = self.frames.partition_point(|frame| frame.start_time_s() <= t);
        if next >= self.frames.len() {
            let last = self.frames.len() - 1;
            return TelemetrySample::from_frame(&self.frames[last], last, t);
        }

        let a = &self.frames[next - 1];
        let b = &self.frames[next];
        let span = b.start_time_s() - a.start_time_s();
        let frac = (t - a.start_time_s()) / span;

        let mut sample = TelemetrySample::from_frame(a, next - 1, t);
        sample.latitude = lerp(a.latitude, b.latitude, frac);
        sample.longitude = lerp_longitude(a.longitude, b.longitude, frac);
        sample.altitude_m = lerp(a.altitude_m, b.altitude_m, frac);
        sample.horizontal_speed_mps = lerp(a.horizontal_speed_mps, b.horizontal_speed_mps, frac);
        sample.vertical_speed_mps = lerp(a.vertical_speed_mps, b.vertical_speed_mps, frac);
        sample
    }
}

/// Interpolate when both ends are known, otherwise hold the earlier value.
fn lerp(a: Option<f64>, b: Option<f64>, frac: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a + (b - a) * frac),
        (a, _) => a,
    }
}

/// Longitude interpolation that takes the short way across the antimeridian.
fn lerp_longitude(a: Option<f64>, b: Option<f64>, frac: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) if (b - a).abs() > 180.0 => {
            let b = if b > a { b - 360.0 } else { b + 360.0 };
            let mut lon = a + (b - a) * frac;
            if lon > 180.0 {
                lon -= 360.0;
            } else if lon < -180.0 {
                lon += 360.0;
            }
            Some(lon)
        }
        _ => lerp(a, b, frac),
    }
}

fn summarize(frames: &[TelemetryFrame]) -> TrackSummary {
    let first = &frames[0];
    let last = &frames[frames.len() - 1];

    let total_distance_m = frames
        .windows(2)
        .filter_map(|pair| Some(pair[0].coordinates()?.distance_to(&pair[1].coordinates()?)))
        .sum();

    TrackSummary {
        frame_count: frames.len(),
        duration_seconds: ms_to_secs(last.end_ms.saturating_sub(first.start_ms)),
        total_distance_m,
        max_altitude_m: max_value(frames.iter().filter_map(|f| f.altitude_m)).unwrap_or(0.0),
        max_speed_mps: max_value(frames.iter().filter_map(|f| f.horizontal_speed_mps))
            .unwrap_or(0.0),
        start_coordinates: frames.iter().find_map(TelemetryFrame::coordinates),
        end_coordinates: frames.iter().rev().find_map(TelemetryFrame::coordinates),
    }
}

fn max_value(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(index: u32, start_ms: u64, end_ms: u64, altitude: f64) -> TelemetryFrame {
        let mut frame = TelemetryFrame::new(index, start_ms, end_ms);
        frame.altitude_m = Some(altitude);
        frame
    }

    fn three_cue_track() -> TelemetryTrack {
        let mut frames = vec![
            frame(1, 0, 1000, 10.0),
            frame(2, 1000, 2000, 20.0),
            frame(3, 2000, 3000, 30.0),
        ];
        for (i, f) in frames.iter_mut().enumerate() {
            f.horizontal_speed_mps = Some(i as f64 * 2.0);
            f.camera.iso = Some(100 * (i as u32 + 1));
            f.satellites = Some(10 + i as u32);
        }
        TelemetryTrack::new(frames).unwrap()
    }

    #[test]
    fn test_midpoint_altitude_interpolates() {
        let track = three_cue_track();
        assert_eq!(track.sample(1.5).altitude_m, Some(25.0));
    }

    #[test]
    fn test_exact_boundary_returns_frame_values() {
        let track = three_cue_track();
        let sample = track.sample(1.0);
        assert_eq!(sample.altitude_m, Some(20.0));
        assert_eq!(sample.horizontal_speed_mps, Some(2.0));
        assert_eq!(sample.camera.iso, Some(200));
        assert_eq!(sample.frame_position, 1);
    }

    #[test]
    fn test_held_fields_snap_to_preceding_frame() {
        let track = three_cue_track();
        let sample = track.sample(1.9);
        assert_eq!(sample.camera.iso, Some(200));
        assert_eq!(sample.satellites, Some(11));
        assert!((sample.horizontal_speed_mps.unwrap() - 3.8).abs() < 1e-9);
    }

    #[test]
    fn test_sample_clamps_outside_track() {
        let track = three_cue_track();
        assert_eq!(track.sample(-5.0).altitude_m, Some(10.0));
        assert_eq!(track.sample(2.5).altitude_m, Some(30.0));
        assert_eq!(track.sample(99.0).altitude_m, Some(30.0));
        assert_eq!(track.sample(f64::NAN).altitude_m, Some(10.0));
    }

    #[test]
    fn test_missing_end_value_is_held() {
        let frames = vec![frame(1, 0, 1000, 10.0), TelemetryFrame::new(2, 1000, 2000)];
        let track = TelemetryTrack::new(frames).unwrap();
        assert_eq!(track.sample(0.5).altitude_m, Some(10.0));
    }

    #[test]
    fn test_duration_and_maxima() {
        let track = three_cue_track();
        assert!((track.duration_seconds() - 3.0).abs() < 1e-12);
        assert_eq!(track.max_altitude(), 30.0);
        assert_eq!(track.max_speed(), 4.0);
        assert_eq!(track.total_distance(), 0.0);
        assert_eq!(track.start_coordinates(), None);
    }

    #[test]
    fn test_single_frame_has_zero_distance() {
        let mut f = frame(1, 0, 1000, 5.0);
        f.latitude = Some(40.0);
        f.longitude = Some(-74.0);
        let track = TelemetryTrack::new(vec![f]).unwrap();
        assert_eq!(track.total_distance(), 0.0);
        assert_eq!(track.start_coordinates(), track.end_coordinates());
    }

    #[test]
    fn test_gap_in_fixes_contributes_nothing() {
        let mut frames: Vec<TelemetryFrame> = (0..4)
            .map(|i| TelemetryFrame::new(i + 1, i as u64 * 1000, (i as u64 + 1) * 1000))
            .collect();
        let fixes = [Some((0.0, 10.0)), Some((0.001, 10.0)), None, Some((0.002, 10.0))];
        for (frame, fix) in frames.iter_mut().zip(fixes) {
            if let Some((lat, lon)) = fix {
                frame.latitude = Some(lat);
                frame.longitude = Some(lon);
            }
        }
        let track = TelemetryTrack::new(frames).unwrap();
        let one_step = GeoPoint::new(0.0, 10.0).distance_to(&GeoPoint::new(0.001, 10.0));
        assert!((track.total_distance() - one_step).abs() < 1e-9);
        assert_eq!(track.end_coordinates(), Some(GeoPoint::new(0.002, 10.0)));
    }

    #[test]
    fn test_unsorted_frames_are_ordered() {
        let frames = vec![frame(2, 1000, 2000, 2.0), frame(1, 0, 1000, 1.0)];
        let track = TelemetryTrack::new(frames).unwrap();
        assert_eq!(track.frames()[0].index, 1);
    }

    #[test]
    fn test_empty_track_is_rejected() {
        assert!(TelemetryTrack::new(Vec::new()).is_err());
    }

    #[test]
    fn test_longitude_interpolation_crosses_antimeridian() {
        assert_eq!(lerp_longitude(Some(179.0), Some(-179.0), 0.5), Some(180.0));
        assert_eq!(lerp_longitude(Some(-179.5), Some(179.5), 0.25), Some(-179.75));
    }

    proptest! {
        #[test]
        fn prop_distance_never_decreases_as_frames_are_added(
            fixes in proptest::collection::vec(
                (-60.0f64..60.0, -170.0f64..170.0, any::<bool>()),
                1..40,
            )
        ) {
            let frames: Vec<TelemetryFrame> = fixes
                .iter()
                .enumerate()
                .map(|(i, (lat, lon, has_fix))| {
                    let mut f =
                        TelemetryFrame::new(i as u32 + 1, i as u64 * 100, (i as u64 + 1) * 100);
                    if *has_fix {
                        f.latitude = Some(*lat);
                        f.longitude = Some(*lon);
                    }
                    f
                })
                .collect();

            let mut previous = 0.0;
            for n in 1..=frames.len() {
                let track = TelemetryTrack::new(frames[..n].to_vec()).unwrap();
                prop_assert!(track.total_distance() >= previous);
                previous = track.total_distance();
            }
        }

        #[test]
        fn prop_interpolated_altitude_stays_within_bracket(
            a in -100.0f64..1000.0,
            b in -100.0f64..1000.0,
            t in 0.0f64..1.0,
        ) {
            let track =
                TelemetryTrack::new(vec![frame(1, 0, 1000, a), frame(2, 1000, 2000, b)]).unwrap();
            let alt = track.sample(t).altitude_m.unwrap();
            prop_assert!(alt >= a.min(b) - 1e-9 && alt <= a.max(b) + 1e-9);
        }
    }
}
