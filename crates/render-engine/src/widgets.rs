//! Raster primitives for HUD widgets: outlined text on backing plates and
//! the analog speed gauge.

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut,
    draw_text_mut, text_size,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::layout::{Anchor, HudLayout};

/// Screen angle of the gauge's zero mark, clockwise from +x with y down.
pub const GAUGE_START_DEG: f64 = 135.0;

/// Arc between the zero mark and the max mark.
pub const GAUGE_SWEEP_DEG: f64 = 270.0;

const GAUGE_TICKS: u32 = 10;

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const PLATE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 120]);
const DIAL_COLOR: Rgba<u8> = Rgba([0, 0, 0, 140]);
const BEZEL_COLOR: Rgba<u8> = Rgba([255, 255, 255, 230]);
const MAX_MARK_COLOR: Rgba<u8> = Rgba([235, 64, 52, 255]);
const NEEDLE_COLOR: Rgba<u8> = Rgba([255, 140, 0, 255]);

/// Needle offset from the zero mark, in degrees along the dial.
///
/// Speeds at or past `max_kmh` pin to the max mark; negative and NaN
/// speeds rest on the zero mark.
pub fn needle_angle_degrees(speed_kmh: f64, max_kmh: f64) -> f64 {
    if !(max_kmh.is_finite() && max_kmh > 0.0) || speed_kmh.is_nan() {
        return 0.0;
    }
    speed_kmh.clamp(0.0, max_kmh) / max_kmh * GAUGE_SWEEP_DEG
}

/// Point at `radius` from `center`, `offset_deg` along the dial.
pub fn dial_point(center: (f32, f32), radius: f32, offset_deg: f64) -> (f32, f32) {
    let angle = (GAUGE_START_DEG + offset_deg).to_radians();
    (
        center.0 + radius * angle.cos() as f32,
        center.1 + radius * angle.sin() as f32,
    )
}

/// Draw `text` on a translucent plate pinned at `anchor`.
///
/// Without a font only the plate is drawn, sized from a glyph-width estimate
/// so the layout stays the same.
pub fn draw_label(
    canvas: &mut RgbaImage,
    font: Option<&FontArc>,
    layout: &HudLayout,
    anchor: Anchor,
    text: &str,
) {
    let scale = PxScale::from(layout.font_px);
    let text_w = match font {
        Some(font) => text_size(scale, font, text).0 as f32,
        None => text.chars().count() as f32 * layout.font_px * 0.55,
    };

    let plate_w = text_w + 2.0 * layout.padding;
    let plate_h = layout.font_px + 2.0 * layout.padding;
    let (x, y) = anchor.place(plate_w, plate_h);
    let (x, y) = (x.round() as i32, y.round() as i32);

    fill_rect(canvas, x, y, plate_w.round() as u32, plate_h.round() as u32, PLATE_COLOR);

    let Some(font) = font else {
        return;
    };
    let tx = x + layout.padding as i32;
    let ty = y + layout.padding as i32;
    draw_outlined_text(canvas, font, scale, tx, ty, layout.outline_px, text);
}

fn draw_outlined_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    scale: PxScale,
    x: i32,
    y: i32,
    outline: i32,
    text: &str,
) {
    for dy in [-outline, 0, outline] {
        for dx in [-outline, 0, outline] {
            if dx != 0 || dy != 0 {
                draw_text_mut(canvas, OUTLINE_COLOR, x + dx, y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(canvas, TEXT_COLOR, x, y, scale, font, text);
}

fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) {
    if w == 0 || h == 0 {
        return;
    }
    draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(w, h), color);
}

/// Draw a line as a filled quad of the given thickness.
fn thick_line(canvas: &mut RgbaImage, a: (f32, f32), b: (f32, f32), width: f32, color: Rgba<u8>) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if width <= 1.5 || len < 0.5 {
        draw_line_segment_mut(canvas, a, b, color);
        return;
    }
    let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
    let quad = [
        Point::new((a.0 + nx).round() as i32, (a.1 + ny).round() as i32),
        Point::new((b.0 + nx).round() as i32, (b.1 + ny).round() as i32),
        Point::new((b.0 - nx).round() as i32, (b.1 - ny).round() as i32),
        Point::new((a.0 - nx).round() as i32, (a.1 - ny).round() as i32),
    ];
    fill_polygon(canvas, &quad, color);
}

/// `draw_polygon_mut` rejects closed outlines; degenerate shapes fall back
/// to a segment.
fn fill_polygon(canvas: &mut RgbaImage, points: &[Point<i32>], color: Rgba<u8>) {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 3 && first != last => {
            draw_polygon_mut(canvas, points, color);
        }
        (Some(first), Some(last)) => {
            draw_line_segment_mut(
                canvas,
                (first.x as f32, first.y as f32),
                (last.x as f32, last.y as f32),
                color,
            );
        }
        _ => {}
    }
}

/// Draw the analog speed gauge centered at `anchor`.
pub fn draw_speed_gauge(
    canvas: &mut RgbaImage,
    font: Option<&FontArc>,
    layout: &HudLayout,
    anchor: Anchor,
    speed_kmh: Option<f64>,
    max_kmh: f64,
) {
    let radius = layout.gauge_radius;
    if radius < 4.0 {
        return;
    }
    let (cx, cy) = anchor.place(0.0, 0.0);
    let center = (cx, cy);

    draw_filled_circle_mut(
        canvas,
        (cx.round() as i32, cy.round() as i32),
        radius.round() as i32,
        DIAL_COLOR,
    );

    let ring = radius * 0.88;
    let stroke = (radius * 0.035).max(1.0);
    let mut offset = 0.0;
    while offset < GAUGE_SWEEP_DEG {
        let next = (offset + 5.0).min(GAUGE_SWEEP_DEG);
        thick_line(
            canvas,
            dial_point(center, ring, offset),
            dial_point(center, ring, next),
            stroke,
            BEZEL_COLOR,
        );
        offset = next;
    }

    for tick in 0..=GAUGE_TICKS {
        let offset = GAUGE_SWEEP_DEG * f64::from(tick) / f64::from(GAUGE_TICKS);
        let major = tick % 2 == 0;
        let inner = ring - if major { radius * 0.16 } else { radius * 0.08 };
        let color = if tick == GAUGE_TICKS {
            MAX_MARK_COLOR
        } else {
            BEZEL_COLOR
        };
        thick_line(
            canvas,
            dial_point(center, inner, offset),
            dial_point(center, ring, offset),
            if major { stroke * 1.5 } else { stroke },
            color,
        );
    }

    let angle = needle_angle_degrees(speed_kmh.unwrap_or(0.0), max_kmh);
    let tip = dial_point(center, radius * 0.78, angle);
    let tail = dial_point(center, radius * 0.15, angle + 180.0);
    let left = dial_point(center, radius * 0.05, angle - 90.0);
    let right = dial_point(center, radius * 0.05, angle + 90.0);
    let needle =
        [left, tip, right, tail].map(|(x, y)| Point::new(x.round() as i32, y.round() as i32));
    fill_polygon(canvas, &needle, NEEDLE_COLOR);

    draw_filled_circle_mut(
        canvas,
        (cx.round() as i32, cy.round() as i32),
        (radius * 0.07).round().max(1.0) as i32,
        BEZEL_COLOR,
    );

    let Some(font) = font else {
        return;
    };
    let readout = match speed_kmh {
        Some(speed) if speed.is_finite() => format!("{:.0}", speed.max(0.0)),
        _ => "--".to_string(),
    };
    let scale = PxScale::from((radius * 0.32).max(6.0));
    let (w, h) = text_size(scale, font, &readout);
    let x = (cx - w as f32 / 2.0).round() as i32;
    let y = (cy + radius * 0.38).round() as i32;
    draw_outlined_text(canvas, font, scale, x, y, layout.outline_px, &readout);

    let unit_scale = PxScale::from((radius * 0.16).max(6.0));
    let (uw, _) = text_size(unit_scale, font, "km/h");
    let ux = (cx - uw as f32 / 2.0).round() as i32;
    let uy = y + h as i32 + 2;
    draw_text_mut(canvas, TEXT_COLOR, ux, uy, unit_scale, font, "km/h");
}
