//! Parser for DJI subtitle-style telemetry side files.
//!
//! A file is a sequence of numbered cues separated by blank lines:
//!
//! ```text
//! 1
//! 00:00:00,000 --> 00:00:00,033
//! <font size="28">FrameCnt: 1, DiffTime: 33ms
//! 2023-06-05 14:32:15.123
//! [iso: 100] [shutter: 1/500.0] [fnum: 280] [ev: 0] [latitude: 22.543100]
//! [longitude: 114.057900] [rel_alt: 1.200 abs_alt: 102.300] </font>
//! ```
//!
//! Metadata is recognised token by token. Label sets differ between firmware
//! generations (bracketed `[key: value]` pairs on newer aircraft, `GPS(...)`
//! and `H.S`/`V.S` fields on older ones); anything unrecognised is skipped.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use djihud_common::error::{DataQualityWarning, HudError, HudResult};

use crate::frame::TelemetryFrame;
use crate::timecode::parse_range;
use crate::track::TelemetryTrack;

/// Frames recovered from a side file plus the data-quality conditions met on the way.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub frames: Vec<TelemetryFrame>,
    pub warnings: Vec<DataQualityWarning>,
}

/// Token-based telemetry parser.
pub struct TelemetryParser {
    markup_pattern: Regex,
    bracket_pattern: Regex,
    pair_pattern: Regex,
    number_pattern: Regex,
    timestamp_pattern: Regex,
    legacy_gps_pattern: Regex,
    legacy_barometer_pattern: Regex,
    legacy_height_pattern: Regex,
    legacy_hspeed_pattern: Regex,
    legacy_vspeed_pattern: Regex,
    legacy_fnum_pattern: Regex,
    legacy_shutter_pattern: Regex,
    legacy_iso_pattern: Regex,
    legacy_ev_pattern: Regex,
}

/// A run of non-blank lines with its position in the source.
struct RawBlock<'a> {
    ordinal: usize,
    first_line: usize,
    lines: Vec<&'a str>,
}

impl TelemetryParser {
    pub fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("static telemetry pattern");
        Self {
            markup_pattern: compile(r"</?[A-Za-z][^>]*>"),
            bracket_pattern: compile(r"\[([^\[\]]*)\]"),
            pair_pattern: compile(r"([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([^\s\]]+)"),
            number_pattern: compile(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)"),
            timestamp_pattern: compile(
                r"(\d{4}[-.]\d{2}[-.]\d{2})[ T](\d{2}:\d{2}:\d{2})(?:[.,](\d{1,9}))?",
            ),
            legacy_gps_pattern: compile(
                r"GPS\s*\(\s*([+-]?\d+(?:\.\d+)?)\s*,\s*([+-]?\d+(?:\.\d+)?)\s*(?:,\s*([^)]*))?\)",
            ),
            legacy_barometer_pattern: compile(r"BAROMETER\s*:?\s*([+-]?\d+(?:\.\d+)?)"),
            legacy_height_pattern: compile(
                r"(?:^|\s)H\s*[:=]?\s*([+-]?\d+(?:\.\d+)?)\s*m(?:\s|,|$)",
            ),
            legacy_hspeed_pattern: compile(r"H\.S\s*[:=]?\s*([+-]?\d+(?:\.\d+)?)"),
            legacy_vspeed_pattern: compile(r"V\.S\s*[:=]?\s*([+-]?\d+(?:\.\d+)?)"),
            legacy_fnum_pattern: compile(r"\b(?:F-?Num\s*:?\s*|F/?)(\d+(?:\.\d+)?)\b"),
            legacy_shutter_pattern: compile(
                r"\b(?:SS|Shutter)\s*:?\s*(\d+(?:\.\d+)?(?:/\d+(?:\.\d+)?)?)",
            ),
            legacy_iso_pattern: compile(r"\bISO\s*:?\s*(\d+)"),
            legacy_ev_pattern: compile(r"\bEV\s*:?\s*([+-]?\d+(?:\.\d+)?(?:/\d+)?)"),
        }
    }

    /// Parse a side file from disk.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> HudResult<ParseOutcome> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HudError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes =
            std::fs::read(path).map_err(|e| HudError::pipeline_io(path, e.to_string()))?;
        let content = String::from_utf8_lossy(&bytes);
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read telemetry file");
        self.parse_str(&content)
    }

    /// Parse side-file content.
    ///
    /// Fails when no cue could be recovered, including for empty input.
    pub fn parse_str(&self, content: &str) -> HudResult<ParseOutcome> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let blocks = split_blocks(content);

        let mut frames = Vec::with_capacity(blocks.len());
        let mut warnings = Vec::new();

        for block in &blocks {
            match self.parse_block(block) {
                Ok((frame, inverted)) => {
                    if inverted {
                        warnings.push(DataQualityWarning::TimecodeInverted {
                            block_index: block.ordinal,
                            line: block.first_line + 1,
                        });
                    }
                    frames.push(frame);
                }
                Err(reason) => warnings.push(DataQualityWarning::MalformedBlock {
                    block_index: block.ordinal,
                    line: block.first_line,
                    reason,
                }),
            }
        }

        if frames.is_empty() {
            return Err(match blocks.first() {
                None => HudError::telemetry_parse("input contains no telemetry cues", None),
                Some(first) => HudError::telemetry_parse(
                    format!("none of {} cue(s) could be parsed", blocks.len()),
                    Some(first.first_line),
                ),
            });
        }

        if let Some(first_offending_index) = frames
            .windows(2)
            .position(|pair| pair[1].start_ms < pair[0].start_ms)
            .map(|i| i + 1)
        {
            frames.sort_by_key(|frame| frame.start_ms);
            warnings.push(DataQualityWarning::OutOfOrder {
                first_offending_index,
            });
        }

        fill_derived_speeds(&mut frames);

        for warning in &warnings {
            tracing::warn!(%warning, "Telemetry data quality");
        }
        tracing::info!(
            frames = frames.len(),
            cues = blocks.len(),
            warnings = warnings.len(),
            "Telemetry parsed"
        );

        Ok(ParseOutcome { frames, warnings })
    }

    fn parse_block(&self, block: &RawBlock<'_>) -> Result<(TelemetryFrame, bool), String> {
        // The cue number normally precedes the range line, but some tools drop it.
        let (index, range_at) = match block.lines.first().map(|l| l.trim().parse::<u32>()) {
            Some(Ok(index)) => (index, 1),
            _ if block.lines.first().is_some_and(|l| l.contains("-->")) => {
                (block.ordinal as u32, 0)
            }
            _ => return Err("missing cue number".to_string()),
        };

        let range_line = block
            .lines
            .get(range_at)
            .ok_or_else(|| "missing timecode line".to_string())?;
        let (start_ms, end_ms) = parse_range(range_line)
            .ok_or_else(|| format!("unparsable timecode '{}'", range_line.trim()))?;

        let mut frame = TelemetryFrame::new(index, start_ms, end_ms);
        let metadata = block.lines[range_at + 1..].join("\n");
        self.apply_tokens(&mut frame, &metadata);

        Ok((frame, end_ms < start_ms))
    }

    fn apply_tokens(&self, frame: &mut TelemetryFrame, metadata: &str) {
        let text = self.markup_pattern.replace_all(metadata, " ");
        let mut absolute_altitude = None;

        for bracket in self.bracket_pattern.captures_iter(&text) {
            for pair in self.pair_pattern.captures_iter(&bracket[1]) {
                let key = pair[1].to_ascii_lowercase();
                let value = pair[2].trim_end_matches(',');
                match key.as_str() {
                    "latitude" | "lat" => frame.latitude = self.number(value),
                    "longitude" | "longtitude" | "lon" | "lng" => {
                        frame.longitude = self.number(value)
                    }
                    "rel_alt" | "altitude" | "alt" | "height" => {
                        frame.altitude_m = self.number(value)
                    }
                    "abs_alt" => absolute_altitude = self.number(value),
                    "h_speed" | "hs" | "speed_h" | "horizontal_speed" => {
                        frame.horizontal_speed_mps = self.number(value)
                    }
                    "v_speed" | "vs" | "speed_v" | "vertical_speed" => {
                        frame.vertical_speed_mps = self.number(value)
                    }
                    "iso" => frame.camera.iso = self.number(value).map(|v| v.round() as u32),
                    "shutter" => frame.camera.shutter = Some(value.to_string()),
                    "fnum" => frame.camera.fnum = self.number(value).map(normalize_fnum),
                    "ev" => frame.camera.ev = parse_fraction(value),
                    "satellite" | "satellites" | "gps_sats" | "sats" => {
                        frame.satellites = self.number(value).map(|v| v.round() as u32)
                    }
                    _ => {}
                }
            }
        }

        // Older firmware writes free-form fields outside brackets.
        let legacy = self.bracket_pattern.replace_all(&text, " ");

        if let Some(caps) = self.legacy_gps_pattern.captures(&legacy) {
            frame.longitude = frame.longitude.or_else(|| caps[1].parse().ok());
            frame.latitude = frame.latitude.or_else(|| caps[2].parse().ok());
            if let Some(third) = caps.get(3).map(|m| m.as_str().trim()) {
                if !third.ends_with(['m', 'M']) {
                    frame.satellites = frame.satellites.or_else(|| third.parse().ok());
                }
            }
        }
        if frame.altitude_m.is_none() {
            frame.altitude_m = self
                .first_number(&self.legacy_height_pattern, &legacy)
                .or_else(|| self.first_number(&self.legacy_barometer_pattern, &legacy))
                .or(absolute_altitude);
        }
        if frame.horizontal_speed_mps.is_none() {
            frame.horizontal_speed_mps = self.first_number(&self.legacy_hspeed_pattern, &legacy);
        }
        if frame.vertical_speed_mps.is_none() {
            frame.vertical_speed_mps = self.first_number(&self.legacy_vspeed_pattern, &legacy);
        }
        if frame.camera.fnum.is_none() {
            frame.camera.fnum = self
                .first_number(&self.legacy_fnum_pattern, &legacy)
                .map(normalize_fnum);
        }
        if frame.camera.shutter.is_none() {
            frame.camera.shutter = self
                .legacy_shutter_pattern
                .captures(&legacy)
                .map(|caps| caps[1].to_string());
        }
        if frame.camera.iso.is_none() {
            frame.camera.iso = self
                .first_number(&self.legacy_iso_pattern, &legacy)
                .map(|v| v.round() as u32);
        }
        if frame.camera.ev.is_none() {
            frame.camera.ev = self
                .legacy_ev_pattern
                .captures(&legacy)
                .and_then(|caps| parse_fraction(&caps[1]));
        }

        frame.timestamp = self
            .timestamp_pattern
            .captures(&text)
            .and_then(|caps| {
                parse_timestamp(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()))
            });
    }

    /// Leading numeric part of a token, ignoring unit suffixes such as `m/s`.
    fn number(&self, value: &str) -> Option<f64> {
        let matched = self.number_pattern.find(value)?;
        matched.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn first_number(&self, pattern: &Regex, text: &str) -> Option<f64> {
        pattern
            .captures(text)
            .and_then(|caps| self.number(&caps[1]))
    }
}

impl Default for TelemetryParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a side file into a track.
pub fn parse_srt<P: AsRef<Path>>(path: P) -> HudResult<TelemetryTrack> {
    let outcome = TelemetryParser::new().parse_file(path)?;
    TelemetryTrack::new(outcome.frames)
}

fn split_blocks(content: &str) -> Vec<RawBlock<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock<'_>> = None;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        current
            .get_or_insert_with(|| RawBlock {
                ordinal: blocks.len() + 1,
                first_line: i + 1,
                lines: Vec::new(),
            })
            .lines
            .push(line);
    }
    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}

/// Aperture is sometimes written in hundredths (`280` for f/2.8).
fn normalize_fnum(value: f64) -> f64 {
    if value >= 50.0 {
        value / 100.0
    } else {
        value
    }
}

/// Parse `0.7`, `-1/3`, or `+2/3` style exposure values.
fn parse_fraction(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => raw.parse().ok(),
    }
    .filter(|v: &f64| v.is_finite())
}

fn parse_timestamp(date: &str, time: &str, fraction: Option<&str>) -> Option<NaiveDateTime> {
    // Older firmware separates the date with dots.
    let date = NaiveDate::parse_from_str(&date.replace('.', "-"), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    let mut millis = 0u32;
    if let Some(fraction) = fraction {
        let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
        millis = digits.parse().ok()?;
    }
    date.and_time(time)
        .checked_add_signed(chrono::Duration::milliseconds(millis as i64))
}

/// Fill speeds the firmware did not report from consecutive fixes.
fn fill_derived_speeds(frames: &mut [TelemetryFrame]) {
    if frames.len() < 2 {
        return;
    }
    for i in 0..frames.len() {
        let (a, b) = if i == 0 { (0, 1) } else { (i - 1, i) };
        let dt_ms = frames[b].start_ms.saturating_sub(frames[a].start_ms);
        if dt_ms == 0 {
            continue;
        }
        let dt = dt_ms as f64 / 1000.0;

        if frames[i].horizontal_speed_mps.is_none() {
            if let (Some(p), Some(q)) = (frames[a].coordinates(), frames[b].coordinates()) {
                frames[i].horizontal_speed_mps = Some(p.distance_to(&q) / dt);
            }
        }
        if frames[i].vertical_speed_mps.is_none() {
            if let (Some(h0), Some(h1)) = (frames[a].altitude_m, frames[b].altitude_m) {
                frames[i].vertical_speed_mps = Some((h1 - h0) / dt);
            }
        }
    }
}
