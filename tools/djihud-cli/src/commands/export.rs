//! Export telemetry to CSV, JSON or GPX.

use std::path::PathBuf;

use djihud_exporter::export;
use djihud_telemetry::parse_srt;

pub fn run(srt: PathBuf, output: PathBuf, format: Option<String>) -> anyhow::Result<()> {
    println!("Parsing telemetry: {}", srt.display());
    let track = parse_srt(&srt).map_err(|e| anyhow::anyhow!("Failed to parse telemetry: {e}"))?;

    let written = export(&track, &output, format.as_deref())
        .map_err(|e| anyhow::anyhow!("Export failed: {e}"))?;

    println!(
        "Exported {} frames as {} to {}",
        track.len(),
        written,
        output.display()
    );
    println!("  Duration: {:.1}s", track.duration_seconds());
    println!("  Distance: {:.1}m", track.total_distance());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../fixtures/sample-flight/DJI_0001.SRT")
    }

    #[test]
    fn test_export_fixture_to_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("flight.csv");
        run(fixture(), output.clone(), None).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), 11);
    }

    #[test]
    fn test_export_rejects_unknown_format() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("flight.kml");
        assert!(run(fixture(), output.clone(), None).is_err());
        assert!(!output.exists());
    }
}
