//! Overlay widget selection and gauge scaling.

use serde::{Deserialize, Serialize};

use djihud_common::error::{HudError, HudResult};

/// Largest accepted canvas edge in pixels.
pub const MAX_CANVAS_DIM: u32 = 16_384;

/// HUD widgets the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Altitude,
    Speed,
    VerticalSpeed,
    Coordinates,
    CameraSettings,
    Timestamp,
    SpeedGauge,
}

impl Widget {
    pub const ALL: [Widget; 7] = [
        Widget::Altitude,
        Widget::Speed,
        Widget::VerticalSpeed,
        Widget::Coordinates,
        Widget::CameraSettings,
        Widget::Timestamp,
        Widget::SpeedGauge,
    ];
}

/// Which widgets to draw and how the speed gauge is scaled.
///
/// Built once from caller intent and passed by value; nothing mutates it
/// while a render is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub show_altitude: bool,
    pub show_speed: bool,
    pub show_vertical_speed: bool,
    pub show_coordinates: bool,
    pub show_camera_settings: bool,
    pub show_timestamp: bool,
    pub show_speed_gauge: bool,
    /// Full-scale value of the speed gauge in km/h.
    pub gauge_max_speed_kmh: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            show_altitude: true,
            show_speed: true,
            show_vertical_speed: true,
            show_coordinates: true,
            show_camera_settings: true,
            show_timestamp: true,
            show_speed_gauge: true,
            gauge_max_speed_kmh: 50.0,
        }
    }
}

impl OverlayConfig {
    /// A configuration with every widget turned off.
    pub fn none() -> Self {
        Self {
            show_altitude: false,
            show_speed: false,
            show_vertical_speed: false,
            show_coordinates: false,
            show_camera_settings: false,
            show_timestamp: false,
            show_speed_gauge: false,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self, widget: Widget) -> bool {
        match widget {
            Widget::Altitude => self.show_altitude,
            Widget::Speed => self.show_speed,
            Widget::VerticalSpeed => self.show_vertical_speed,
            Widget::Coordinates => self.show_coordinates,
            Widget::CameraSettings => self.show_camera_settings,
            Widget::Timestamp => self.show_timestamp,
            Widget::SpeedGauge => self.show_speed_gauge,
        }
    }

    pub fn any_enabled(&self) -> bool {
        Widget::ALL.iter().any(|w| self.is_enabled(*w))
    }

    pub fn enabled_widgets(&self) -> impl Iterator<Item = Widget> + '_ {
        Widget::ALL.into_iter().filter(|w| self.is_enabled(*w))
    }

    /// Reject settings that cannot be drawn.
    pub fn validate(&self) -> HudResult<()> {
        if self.show_speed_gauge
            && !(self.gauge_max_speed_kmh.is_finite() && self.gauge_max_speed_kmh > 0.0)
        {
            return Err(HudError::render(format!(
                "gauge_max_speed_kmh must be a positive number, got {}",
                self.gauge_max_speed_kmh
            )));
        }
        Ok(())
    }
}

/// Reject canvas sizes the renderer cannot allocate.
pub fn validate_canvas(width: u32, height: u32) -> HudResult<()> {
    if width == 0 || height == 0 {
        return Err(HudError::render(format!(
            "canvas must be at least 1x1, got {width}x{height}"
        )));
    }
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(HudError::render(format!(
            "canvas {width}x{height} exceeds the {MAX_CANVAS_DIM}px limit"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_everything() {
        let config = OverlayConfig::default();
        assert_eq!(config.enabled_widgets().count(), Widget::ALL.len());
        assert!((config.gauge_max_speed_kmh - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_none_disables_everything() {
        assert!(!OverlayConfig::none().any_enabled());
    }

    #[test]
    fn test_gauge_max_must_be_positive_when_shown() {
        let mut config = OverlayConfig {
            gauge_max_speed_kmh: 0.0,
            ..OverlayConfig::default()
        };
        assert!(config.validate().is_err());

        config.show_speed_gauge = false;
        assert!(config.validate().is_ok());

        config.show_speed_gauge = true;
        config.gauge_max_speed_kmh = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_canvas_limits() {
        assert!(validate_canvas(0, 1080).is_err());
        assert!(validate_canvas(1920, 0).is_err());
        assert!(validate_canvas(MAX_CANVAS_DIM + 1, 10).is_err());
        assert!(validate_canvas(1, 1).is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{"show_coordinates":false}"#).unwrap();
        assert!(!config.show_coordinates);
        assert!(config.show_altitude);
    }
}
