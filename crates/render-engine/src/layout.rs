//! Canvas-relative HUD geometry.
//!
//! Every widget owns a fixed anchor derived only from the canvas size, so
//! toggling one widget never moves another.

use crate::config::Widget;

/// Reference height the proportions below were tuned against.
const REFERENCE_HEIGHT: f32 = 1080.0;

/// Font size at the reference height.
const REFERENCE_FONT_PX: f32 = 40.0;

/// Where a text widget's plate is pinned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// `(x, y)` is the plate's top-left corner.
    TopLeft { x: f32, y: f32 },
    /// `(x, y)` is the plate's top-right corner.
    TopRight { x: f32, y: f32 },
    /// `x` is the plate's horizontal center, `y` its top edge.
    TopCenter { x: f32, y: f32 },
    /// `(x, y)` is the plate's bottom-left corner.
    BottomLeft { x: f32, y: f32 },
    /// Center of a round widget.
    Center { x: f32, y: f32 },
}

impl Anchor {
    /// Top-left corner of a `w` x `h` box pinned at this anchor.
    pub fn place(self, w: f32, h: f32) -> (f32, f32) {
        match self {
            Anchor::TopLeft { x, y } => (x, y),
            Anchor::TopRight { x, y } => (x - w, y),
            Anchor::TopCenter { x, y } => (x - w / 2.0, y),
            Anchor::BottomLeft { x, y } => (x, y - h),
            Anchor::Center { x, y } => (x - w / 2.0, y - h / 2.0),
        }
    }
}

/// Pixel metrics for one canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudLayout {
    pub width: f32,
    pub height: f32,
    pub font_px: f32,
    pub margin: f32,
    pub padding: f32,
    pub line_height: f32,
    pub outline_px: i32,
    pub gauge_radius: f32,
}

impl HudLayout {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        let font_px = (REFERENCE_FONT_PX * h / REFERENCE_HEIGHT).max(6.0);
        let padding = (font_px * 0.25).round().max(1.0);
        Self {
            width: w,
            height: h,
            font_px,
            margin: (h * 0.03).round(),
            padding,
            line_height: font_px + 2.0 * padding + (font_px * 0.2).round(),
            outline_px: (font_px / 20.0).round().max(1.0) as i32,
            gauge_radius: (w.min(h) * 0.11).round(),
        }
    }

    pub fn anchor(&self, widget: Widget) -> Anchor {
        let right = self.width - self.margin;
        let top = self.margin;
        match widget {
            Widget::Timestamp => Anchor::TopLeft {
                x: self.margin,
                y: top,
            },
            Widget::CameraSettings => Anchor::TopCenter {
                x: self.width / 2.0,
                y: top,
            },
            Widget::Altitude => Anchor::TopRight { x: right, y: top },
            Widget::Speed => Anchor::TopRight {
                x: right,
                y: top + self.line_height,
            },
            Widget::VerticalSpeed => Anchor::TopRight {
                x: right,
                y: top + 2.0 * self.line_height,
            },
            Widget::Coordinates => Anchor::BottomLeft {
                x: self.margin,
                y: self.height - self.margin,
            },
            Widget::SpeedGauge => Anchor::Center {
                x: right - self.gauge_radius,
                y: self.height - self.margin - self.gauge_radius,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_scale_with_height() {
        let hd = HudLayout::for_canvas(1920, 1080);
        let uhd = HudLayout::for_canvas(3840, 2160);
        assert!((uhd.font_px / hd.font_px - 2.0).abs() < 1e-3);
        assert!(uhd.margin > hd.margin);
    }

    #[test]
    fn test_anchors_are_distinct() {
        let layout = HudLayout::for_canvas(1920, 1080);
        let anchors: Vec<_> = Widget::ALL.iter().map(|w| layout.anchor(*w)).collect();
        for (i, a) in anchors.iter().enumerate() {
            for b in &anchors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_gauge_stays_on_canvas() {
        for (w, h) in [(1920, 1080), (1080, 1920), (64, 36)] {
            let layout = HudLayout::for_canvas(w, h);
            let Anchor::Center { x, y } = layout.anchor(Widget::SpeedGauge) else {
                panic!("gauge must be center-anchored");
            };
            assert!(x - layout.gauge_radius >= 0.0);
            assert!(y - layout.gauge_radius >= 0.0);
            assert!(x + layout.gauge_radius <= w as f32);
            assert!(y + layout.gauge_radius <= h as f32);
        }
    }

    #[test]
    fn test_place_right_anchor() {
        let anchor = Anchor::TopRight { x: 100.0, y: 10.0 };
        assert_eq!(anchor.place(40.0, 20.0), (60.0, 10.0));
    }
}
