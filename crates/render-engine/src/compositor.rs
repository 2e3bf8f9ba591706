//! Frame compositor: lays a rendered HUD over a decoded source frame.

use image::RgbaImage;

use djihud_common::error::{HudError, HudResult};

/// Alpha-blend `overlay` onto `base` in place ("over" operator, straight
/// alpha).
///
/// Both images must share dimensions. Integer arithmetic keeps the result
/// identical across platforms.
pub fn alpha_blend(base: &mut RgbaImage, overlay: &RgbaImage) -> HudResult<()> {
    if base.dimensions() != overlay.dimensions() {
        let (bw, bh) = base.dimensions();
        let (ow, oh) = overlay.dimensions();
        return Err(HudError::render(format!(
            "overlay {ow}x{oh} does not match source frame {bw}x{bh}"
        )));
    }

    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        let a = u32::from(src[3]);
        if a == 0 {
            continue;
        }
        if a == 255 {
            *dst = *src;
            continue;
        }
        let inv = 255 - a;
        let dst_a = u32::from(dst[3]) * inv / 255;
        let out_a = a + dst_a;
        for c in 0..3 {
            let value = (u32::from(src[c]) * a + u32::from(dst[c]) * dst_a + out_a / 2) / out_a;
            dst[c] = value.min(255) as u8;
        }
        dst[3] = out_a.min(255) as u8;
    }
    Ok(())
}

/// Index of the source frame nearest to output time `t`.
///
/// Clamped to the last frame so a slightly longer output holds the final
/// picture instead of reading past the end.
pub fn nearest_source_index(t: f64, source_fps: f64, frame_count: u64) -> u64 {
    if frame_count == 0 || !(source_fps.is_finite() && source_fps > 0.0) || !(t > 0.0) {
        return 0;
    }
    let index = (t * source_fps).round();
    if index >= (frame_count - 1) as f64 {
        frame_count - 1
    } else {
        index as u64
    }
}
