//! Subtitle timecode conversion.
//!
//! Timecodes are `HH:MM:SS,mmm`. They are converted to whole milliseconds so
//! that summing or comparing offsets across hour-long tracks stays exact;
//! fractional seconds are only produced at the edges via [`ms_to_secs`].

/// Milliseconds since the start of the recording.
pub type OffsetMs = u64;

/// Parse a single `HH:MM:SS,mmm` timecode into milliseconds.
///
/// A `.` is accepted in place of the `,` separator, and the fractional part
/// may have one to three digits (`,5` is 500 ms).
pub fn parse_timecode(raw: &str) -> Option<OffsetMs> {
    let raw = raw.trim();
    let (hms, frac) = match raw.rsplit_once([',', '.']) {
        Some((hms, frac)) => (hms, frac),
        None => (raw, "0"),
    };

    let mut parts = hms.split(':');
    let hours: u64 = parse_digits(parts.next()?)?;
    let minutes: u64 = parse_digits(parts.next()?)?;
    let seconds: u64 = parse_digits(parts.next()?)?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }

    if frac.is_empty() || frac.len() > 3 {
        return None;
    }
    let mut millis: u64 = parse_digits(frac)?;
    for _ in frac.len()..3 {
        millis *= 10;
    }

    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1000 + millis)
}

/// Parse a `start --> end` range line.
pub fn parse_range(line: &str) -> Option<(OffsetMs, OffsetMs)> {
    let (start, end) = line.split_once("-->")?;
    Some((parse_timecode(start)?, parse_timecode(end)?))
}

/// Format milliseconds as `HH:MM:SS,mmm`.
pub fn format_timecode(ms: OffsetMs) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Convert a millisecond offset to seconds.
pub fn ms_to_secs(ms: OffsetMs) -> f64 {
    ms as f64 / 1000.0
}

fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timecode() {
        assert_eq!(parse_timecode("00:00:00,000"), Some(0));
        assert_eq!(parse_timecode("00:00:01,500"), Some(1500));
        assert_eq!(parse_timecode("01:01:01,001"), Some(3_661_001));
        assert_eq!(parse_timecode("00:00:02.033"), Some(2033));
        assert_eq!(parse_timecode("00:00:02,5"), Some(2500));
    }

    #[test]
    fn test_parse_timecode_rejects_garbage() {
        assert_eq!(parse_timecode(""), None);
        assert_eq!(parse_timecode("00:00"), None);
        assert_eq!(parse_timecode("00:61:00,000"), None);
        assert_eq!(parse_timecode("aa:00:00,000"), None);
        assert_eq!(parse_timecode("00:00:00,0000"), None);
        assert_eq!(parse_timecode("-1:00:00,000"), None);
        assert_eq!(parse_timecode("99999999999999:00:00,000"), None);
        assert_eq!(parse_timecode("99999999999999999999:00:00,000"), None);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_range("00:00:01,000 --> 00:00:02,000"),
            Some((1000, 2000))
        );
        assert_eq!(parse_range("00:00:01,000 -> 00:00:02,000"), None);
    }

    #[test]
    fn test_long_track_has_no_drift() {
        // 10 hours of 33 ms cues stays exact in integer milliseconds.
        let last = parse_timecode("09:59:59,967").unwrap();
        assert_eq!(last, 35_999_967);
        assert_eq!(format_timecode(last), "09:59:59,967");
    }
}
