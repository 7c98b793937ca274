//! Selection-to-pixel mapping — functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes a logical rectangle in, returns a pixel rectangle out.

use super::{PixelCropRegion, RawCapture, SelectionBounds, ViewportMetrics};

/// Maps a logical-space selection onto raw-capture pixel coordinates.
///
/// Scale factors are derived per axis from the capture/viewport size ratio,
/// which absorbs device pixel ratio and zoom. The result is clamped to lie
/// inside the capture; a selection hanging off the right or bottom edge is
/// shrunk rather than shifted, so the 16:9 shape is not guaranteed there.
///
/// Never fails. A degenerate selection maps to a 1×1 region as long as the
/// capture itself is non-empty.
pub fn map_selection_to_pixels(
    selection: &SelectionBounds,
    viewport: &ViewportMetrics,
    raw: &RawCapture,
) -> PixelCropRegion {
    let pixel_width = raw.pixel_width as i64;
    let pixel_height = raw.pixel_height as i64;

    if pixel_width == 0 || pixel_height == 0 {
        return PixelCropRegion {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }

    let scale_x = axis_scale(raw.pixel_width, viewport.logical_width, viewport.device_pixel_ratio);
    let scale_y = axis_scale(raw.pixel_height, viewport.logical_height, viewport.device_pixel_ratio);

    let x = round_px(selection.x * scale_x).clamp(0, pixel_width - 1);
    let y = round_px(selection.y * scale_y).clamp(0, pixel_height - 1);
    let width = round_px(selection.width * scale_x).max(1).min(pixel_width - x);
    let height = round_px(selection.height * scale_y).max(1).min(pixel_height - y);

    PixelCropRegion {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    }
}

/// Pixels per logical unit on one axis.
///
/// Falls back to the device pixel ratio when the logical extent is unusable,
/// and to 1.0 when that is unusable too.
fn axis_scale(pixels: u32, logical: f64, device_pixel_ratio: f64) -> f64 {
    if logical.is_finite() && logical > 0.0 {
        pixels as f64 / logical
    } else if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    }
}

fn round_px(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(w: f64, h: f64, dpr: f64) -> ViewportMetrics {
        ViewportMetrics {
            logical_width: w,
            logical_height: h,
            device_pixel_ratio: dpr,
        }
    }

    fn raw(w: u32, h: u32) -> RawCapture {
        RawCapture {
            pixel_width: w,
            pixel_height: h,
            pixels: Vec::new(),
        }
    }

    fn region(x: u32, y: u32, width: u32, height: u32) -> PixelCropRegion {
        PixelCropRegion { x, y, width, height }
    }

    #[test]
    fn identity_scale_keeps_selection() {
        let sel = SelectionBounds::new(100.0, 100.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.0), &raw(1280, 720));
        assert_eq!(mapped, region(100, 100, 320, 180));
    }

    #[test]
    fn retina_capture_doubles_selection() {
        let sel = SelectionBounds::new(100.0, 100.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 2.0), &raw(2560, 1440));
        assert_eq!(mapped, region(200, 200, 640, 360));
    }

    #[test]
    fn selection_past_right_edge_is_shrunk() {
        let sel = SelectionBounds::new(1200.0, 100.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.0), &raw(1280, 720));
        assert_eq!(mapped, region(1200, 100, 80, 180));
    }

    #[test]
    fn origin_past_edge_clamps_to_last_pixel() {
        let sel = SelectionBounds::new(5000.0, 5000.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.0), &raw(1280, 720));
        assert_eq!(mapped, region(1279, 719, 1, 1));
    }

    #[test]
    fn negative_origin_clamps_to_zero() {
        let sel = SelectionBounds::new(-50.0, -10.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.0), &raw(1280, 720));
        assert_eq!(mapped, region(0, 0, 320, 180));
    }

    #[test]
    fn zero_area_selection_yields_single_pixel() {
        let sel = SelectionBounds::new(10.0, 10.0, 0.0, 0.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.0), &raw(1280, 720));
        assert_eq!(mapped, region(10, 10, 1, 1));
    }

    #[test]
    fn fractional_scale_rounds_to_nearest_pixel() {
        // 1.5x display: 101 * 1.5 = 151.5 rounds away from zero
        let sel = SelectionBounds::new(101.0, 33.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.5), &raw(1920, 1080));
        assert_eq!(mapped, region(152, 50, 480, 270));
    }

    #[test]
    fn independent_axis_scales() {
        let sel = SelectionBounds::new(100.0, 100.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.0), &raw(2560, 720));
        assert_eq!(mapped, region(200, 100, 640, 180));
    }

    #[test]
    fn unusable_viewport_falls_back_to_device_pixel_ratio() {
        let sel = SelectionBounds::new(100.0, 100.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(0.0, f64::NAN, 2.0), &raw(2560, 1440));
        assert_eq!(mapped, region(200, 200, 640, 360));
    }

    #[test]
    fn empty_capture_yields_empty_region() {
        let sel = SelectionBounds::new(100.0, 100.0, 320.0, 180.0);
        let mapped = map_selection_to_pixels(&sel, &viewport(1280.0, 720.0, 1.0), &raw(0, 0));
        assert_eq!(mapped, region(0, 0, 0, 0));
    }

    #[test]
    fn mapped_region_always_inside_capture() {
        let vp = viewport(1280.0, 720.0, 1.5);
        let capture = raw(1920, 1080);
        for x in (0..1280).step_by(97) {
            for y in (0..720).step_by(61) {
                for width in [1.0, 16.0, 320.0, 1280.0] {
                    let sel = SelectionBounds::aspect_locked(x as f64, y as f64, width);
                    let r = map_selection_to_pixels(&sel, &vp, &capture);
                    assert!(r.width >= 1 && r.height >= 1, "{:?} from {:?}", r, sel);
                    assert!(r.x + r.width <= capture.pixel_width, "{:?} from {:?}", r, sel);
                    assert!(r.y + r.height <= capture.pixel_height, "{:?} from {:?}", r, sel);
                }
            }
        }
    }

    #[test]
    fn mapping_is_idempotent() {
        let sel = SelectionBounds::new(333.3, 77.7, 451.0, 253.7);
        let vp = viewport(1440.0, 900.0, 2.0);
        let capture = raw(2880, 1800);
        assert_eq!(
            map_selection_to_pixels(&sel, &vp, &capture),
            map_selection_to_pixels(&sel, &vp, &capture)
        );
    }
}
