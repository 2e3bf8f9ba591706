use std::path::PathBuf;

use djihud_common::error::DataQualityWarning;
use djihud_telemetry::{parse_srt, TelemetryParser};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-flight")
        .join(name)
}

#[test]
fn modern_fixture_builds_a_complete_track() {
    let track = parse_srt(fixture("DJI_0001.SRT")).expect("fixture should parse");

    assert_eq!(track.len(), 10);
    assert!((track.duration_seconds() - 10.0).abs() < 1e-9);
    assert!((track.max_altitude() - 55.0).abs() < 1e-9);
    // Nine 0.00009 degree steps due north.
    assert!((track.total_distance() - 90.07).abs() < 0.5, "{}", track.total_distance());

    let start = track.start_coordinates().unwrap();
    assert!((start.latitude - 46.557812).abs() < 1e-9);
    assert!((start.longitude - 7.981234).abs() < 1e-9);
}

#[test]
fn modern_fixture_derives_missing_speeds() {
    let track = parse_srt(fixture("DJI_0001.SRT")).unwrap();
    for frame in track.frames() {
        let hs = frame.horizontal_speed_mps.unwrap();
        let vs = frame.vertical_speed_mps.unwrap();
        assert!((hs - 10.0).abs() < 0.1, "horizontal {hs}");
        assert!((vs - 5.0).abs() < 1e-6, "vertical {vs}");
    }
}

#[test]
fn modern_fixture_sampling_interpolates_and_holds() {
    let track = parse_srt(fixture("DJI_0001.SRT")).unwrap();

    let mid = track.sample(4.5);
    assert!((mid.altitude_m.unwrap() - 32.5).abs() < 1e-9);
    assert_eq!(mid.camera.iso, Some(100));
    assert_eq!(track.sample(5.5).camera.iso, Some(200));

    let ts = track.sample(2.5).timestamp.unwrap();
    assert_eq!(ts.format("%H:%M:%S").to_string(), "14:32:17");

    let past_end = track.sample(60.0);
    assert_eq!(past_end.frame_position, 9);
    assert!((past_end.altitude_m.unwrap() - 55.0).abs() < 1e-9);
}

#[test]
fn legacy_fixture_skips_corrupt_cue() {
    let outcome = TelemetryParser::new()
        .parse_file(fixture("DJI_0002.SRT"))
        .expect("fixture should parse");

    assert_eq!(outcome.frames.len(), 4);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(
        outcome.warnings[0],
        DataQualityWarning::MalformedBlock {
            block_index: 3,
            line: 13,
            ..
        }
    ));

    let first = &outcome.frames[0];
    assert_eq!(first.latitude, Some(46.557812));
    assert_eq!(first.longitude, Some(7.981234));
    assert_eq!(first.satellites, Some(18));
    assert_eq!(first.altitude_m, Some(20.0));
    assert_eq!(first.horizontal_speed_mps, Some(4.0));
    assert_eq!(first.vertical_speed_mps, Some(0.5));
    assert_eq!(first.camera.iso, Some(100));
    assert!((first.camera.ev.unwrap() + 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(first.camera.shutter.as_deref(), Some("500"));
    assert_eq!(first.camera.fnum, Some(2.8));
    assert_eq!(
        first.timestamp.unwrap().format("%Y-%m-%d %H:%M:%S").to_string(),
        "2019-08-14 09:12:10"
    );
}

#[test]
fn missing_file_is_reported() {
    let err = parse_srt(fixture("does-not-exist.SRT")).unwrap_err();
    assert!(err.to_string().contains("does-not-exist.SRT"));
}

#[test]
fn unreadable_path_is_reported_with_its_name() {
    let dir = fixture("");
    let err = parse_srt(&dir).unwrap_err();
    assert!(err.to_string().contains("sample-flight"), "{err}");
}
