//! HUD overlay renderer: telemetry sample in, transparent RGBA raster out.

use std::sync::Arc;

use image::RgbaImage;

use djihud_common::error::HudResult;
use djihud_telemetry::frame::CameraSettings;
use djihud_telemetry::geo::GeoPoint;
use djihud_telemetry::track::{TelemetrySample, TelemetryTrack, MPS_TO_KMH};

use crate::config::{validate_canvas, OverlayConfig, Widget};
use crate::font::HudFont;
use crate::layout::HudLayout;
use crate::widgets::{draw_label, draw_speed_gauge};

/// One rendered overlay image and the track time it shows.
#[derive(Debug, Clone)]
pub struct RenderedOverlayFrame {
    pub timestamp_s: f64,
    pub image: RgbaImage,
}

/// Draws HUD widgets for a telemetry track.
///
/// Holds no per-call state; every render starts from a fresh transparent
/// canvas, so renders may run concurrently from many threads.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    track: Arc<TelemetryTrack>,
    font: Option<HudFont>,
}

impl OverlayRenderer {
    pub fn new(track: Arc<TelemetryTrack>, font: Option<HudFont>) -> Self {
        Self { track, font }
    }

    pub fn track(&self) -> &TelemetryTrack {
        &self.track
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render the HUD for track time `timestamp_s`.
    pub fn render(
        &self,
        timestamp_s: f64,
        config: &OverlayConfig,
        width: u32,
        height: u32,
    ) -> HudResult<RenderedOverlayFrame> {
        let sample = self.track.sample(timestamp_s);
        let mut frame = self.render_sample(&sample, config, width, height)?;
        frame.timestamp_s = timestamp_s;
        Ok(frame)
    }

    /// Render the HUD for an already-sampled telemetry state.
    pub fn render_sample(
        &self,
        sample: &TelemetrySample,
        config: &OverlayConfig,
        width: u32,
        height: u32,
    ) -> HudResult<RenderedOverlayFrame> {
        validate_canvas(width, height)?;
        config.validate()?;

        let mut image = RgbaImage::new(width, height);
        let layout = HudLayout::for_canvas(width, height);
        let font = self.font.as_ref().map(HudFont::font);

        for widget in config.enabled_widgets() {
            let anchor = layout.anchor(widget);
            match widget {
                Widget::SpeedGauge => draw_speed_gauge(
                    &mut image,
                    font,
                    &layout,
                    anchor,
                    sample.horizontal_speed_kmh(),
                    config.gauge_max_speed_kmh,
                ),
                _ => {
                    let text = widget_text(widget, sample);
                    draw_label(&mut image, font, &layout, anchor, &text);
                }
            }
        }

        Ok(RenderedOverlayFrame {
            timestamp_s: sample.time_s,
            image,
        })
    }
}

/// Label text for a text widget.
pub fn widget_text(widget: Widget, sample: &TelemetrySample) -> String {
    match widget {
        Widget::Altitude => format_altitude(sample.altitude_m),
        Widget::Speed => format_speed(sample.horizontal_speed_mps),
        Widget::VerticalSpeed => format_vertical_speed(sample.vertical_speed_mps),
        Widget::Coordinates => format_coordinates(sample.coordinates()),
        Widget::CameraSettings => format_camera(&sample.camera),
        Widget::Timestamp => format_timestamp(sample),
        Widget::SpeedGauge => String::new(),
    }
}

fn format_altitude(altitude_m: Option<f64>) -> String {
    match altitude_m {
        Some(alt) => format!("ALT {:.1} m", tidy(alt)),
        None => "ALT -- m".to_string(),
    }
}

fn format_speed(speed_mps: Option<f64>) -> String {
    match speed_mps {
        Some(speed) => format!("SPD {:.1} km/h", tidy(speed * MPS_TO_KMH)),
        None => "SPD -- km/h".to_string(),
    }
}

fn format_vertical_speed(speed_mps: Option<f64>) -> String {
    match speed_mps {
        Some(speed) => format!("V/S {:+.1} m/s", tidy(speed)),
        None => "V/S -- m/s".to_string(),
    }
}

fn format_coordinates(point: Option<GeoPoint>) -> String {
    match point {
        Some(p) => format!("{:.6}, {:.6}", p.latitude, p.longitude),
        None => "NO GPS".to_string(),
    }
}

fn format_camera(camera: &CameraSettings) -> String {
    if camera.is_empty() {
        return "CAM --".to_string();
    }
    let mut parts = Vec::with_capacity(4);
    if let Some(iso) = camera.iso {
        parts.push(format!("ISO {iso}"));
    }
    if let Some(shutter) = &camera.shutter {
        parts.push(shutter.clone());
    }
    if let Some(fnum) = camera.fnum {
        parts.push(format!("f/{fnum:.1}"));
    }
    if let Some(ev) = camera.ev {
        parts.push(format!("EV {:+.1}", tidy(ev)));
    }
    parts.join("  ")
}

fn format_timestamp(sample: &TelemetrySample) -> String {
    match sample.timestamp {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => {
            let total = sample.time_s.max(0.0);
            let minutes = (total / 60.0).floor();
            format!("T+{:02}:{:04.1}", minutes as u64, total - minutes * 60.0)
        }
    }
}

/// Collapse values that would print as "-0.0".
fn tidy(value: f64) -> f64 {
    if value.abs() < 0.05 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use djihud_telemetry::frame::TelemetryFrame;

    fn frame(index: u32, start_ms: u64, speed: f64) -> TelemetryFrame {
        let mut f = TelemetryFrame::new(index, start_ms, start_ms + 33);
        f.latitude = Some(46.5);
        f.longitude = Some(7.9);
        f.altitude_m = Some(120.0);
        f.horizontal_speed_mps = Some(speed);
        f.vertical_speed_mps = Some(-0.01);
        f
    }

    fn renderer() -> OverlayRenderer {
        let track = TelemetryTrack::new(vec![frame(1, 0, 5.0), frame(2, 1000, 15.0)]).unwrap();
        OverlayRenderer::new(Arc::new(track), None)
    }

    #[test]
    fn test_all_widgets_disabled_is_transparent() {
        let out = renderer()
            .render(0.5, &OverlayConfig::none(), 320, 180)
            .unwrap();
        assert_eq!(out.image.dimensions(), (320, 180));
        assert!(out.image.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = renderer();
        let config = OverlayConfig::default();
        let a = r.render(0.75, &config, 640, 360).unwrap();
        let b = r.render(0.75, &config, 640, 360).unwrap();
        assert_eq!(a.image.as_raw(), b.image.as_raw());
        assert!(a.image.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_disabling_widget_does_not_move_others() {
        let r = renderer();
        let only_alt = OverlayConfig {
            show_altitude: true,
            ..OverlayConfig::none()
        };
        let alt_and_gauge = OverlayConfig {
            show_speed_gauge: true,
            ..only_alt
        };
        let a = r.render(0.0, &only_alt, 640, 360).unwrap();
        let b = r.render(0.0, &alt_and_gauge, 640, 360).unwrap();
        // The altitude plate sits in the top-right corner in both renders.
        for y in 0..60 {
            for x in 400..640 {
                assert_eq!(a.image.get_pixel(x, y), b.image.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_invalid_canvas_and_config_rejected() {
        let r = renderer();
        assert!(r.render(0.0, &OverlayConfig::default(), 0, 100).is_err());
        let bad = OverlayConfig {
            gauge_max_speed_kmh: -1.0,
            ..OverlayConfig::default()
        };
        assert!(r.render(0.0, &bad, 100, 100).is_err());
    }

    #[test]
    fn test_render_reports_requested_timestamp() {
        let out = renderer()
            .render(2.5, &OverlayConfig::none(), 8, 8)
            .unwrap();
        assert_eq!(out.timestamp_s, 2.5);
    }

    #[test]
    fn test_widget_text() {
        let r = renderer();
        let sample = r.track().sample(0.5);
        assert_eq!(widget_text(Widget::Altitude, &sample), "ALT 120.0 m");
        assert_eq!(widget_text(Widget::Speed, &sample), "SPD 36.0 km/h");
        assert_eq!(widget_text(Widget::VerticalSpeed, &sample), "V/S +0.0 m/s");
        assert_eq!(widget_text(Widget::Coordinates, &sample), "46.500000, 7.900000");
        assert_eq!(widget_text(Widget::CameraSettings, &sample), "CAM --");
        assert_eq!(widget_text(Widget::Timestamp, &sample), "T+00:00.5");
    }

    #[test]
    fn test_camera_text_skips_missing_fields() {
        let camera = CameraSettings {
            iso: Some(100),
            shutter: Some("1/500.0".to_string()),
            fnum: None,
            ev: Some(-0.7),
        };
        assert_eq!(format_camera(&camera), "ISO 100  1/500.0  EV -0.7");
    }
}
