use crate::foundation::math::clamp01;
use crate::raster::buffer::RasterBuffer;

/// Axis-aligned bounding box of a `w x h` rectangle rotated by
/// `angle_degrees`, in pixels.
pub fn rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let theta = angle_degrees.to_radians();
    let (sin_t, cos_t) = (theta.sin().abs(), theta.cos().abs());
    let w = f64::from(width);
    let h = f64::from(height);
    let new_w = (w * cos_t + h * sin_t).round() as u32;
    let new_h = (w * sin_t + h * cos_t).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Entrance spin schedule: perpendicular to upright over the animation
/// window, clamped at both ends.
///
/// `spin_angle_deg(0) == 90`, `spin_angle_deg(d) == 0` for all `t >= d`,
/// monotonic non-increasing in between. A non-positive duration degenerates
/// to the upright pose.
pub fn spin_angle_deg(local_t: f64, animation_duration: f64) -> f64 {
    if animation_duration <= 0.0 {
        return 0.0;
    }
    let start = 90.0;
    let end = 0.0;
    start + (end - start) * clamp01(local_t / animation_duration)
}

/// Rotate a buffer by `angle_degrees` (counter-clockwise), expanding the
/// output to the rotated bounding box.
///
/// Every output pixel outside the rotated silhouette is fully transparent:
/// the source is inverse-mapped and bilinearly sampled against a zero-alpha
/// exterior, so no background fill is ever introduced at the exposed
/// corners.
pub fn rotate_with_expand(src: &RasterBuffer, angle_degrees: f64) -> RasterBuffer {
    if angle_degrees.abs() < 1e-6 {
        return src.clone();
    }

    let (out_w, out_h) = rotated_bounds(src.width(), src.height(), angle_degrees);
    let theta = angle_degrees.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();

    let src_cx = f64::from(src.width()) / 2.0;
    let src_cy = f64::from(src.height()) / 2.0;
    let dst_cx = f64::from(out_w) / 2.0;
    let dst_cy = f64::from(out_h) / 2.0;

    let mut data = vec![0u8; out_w as usize * out_h as usize * 4];
    for dy in 0..out_h {
        for dx in 0..out_w {
            let ox = f64::from(dx) + 0.5 - dst_cx;
            let oy = f64::from(dy) + 0.5 - dst_cy;
            // Inverse rotation from output space back into source space.
            let sx = cos_t * ox - sin_t * oy + src_cx;
            let sy = sin_t * ox + cos_t * oy + src_cy;

            let px = sample_bilinear(src, sx, sy);
            if px[3] == 0 {
                continue;
            }
            let idx = (dy as usize * out_w as usize + dx as usize) * 4;
            data[idx..idx + 4].copy_from_slice(&px);
        }
    }

    // Dimensions are non-zero by construction, so this cannot fail.
    RasterBuffer::from_premul_parts(out_w, out_h, data)
        .unwrap_or_else(|_| RasterBuffer::new_transparent(out_w, out_h))
}

fn pixel_or_transparent(src: &RasterBuffer, x: i64, y: i64) -> [u8; 4] {
    if x < 0 || y < 0 || x >= i64::from(src.width()) || y >= i64::from(src.height()) {
        return [0, 0, 0, 0];
    }
    src.pixel(x as u32, y as u32)
}

/// Bilinear sample at continuous coordinates (pixel centers at `i + 0.5`),
/// treating everything outside the buffer as transparent. Operates on
/// premultiplied channels, so edge pixels fade out instead of fringing.
fn sample_bilinear(src: &RasterBuffer, x: f64, y: f64) -> [u8; 4] {
    let fx = x - 0.5;
    let fy = y - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let x0 = x0 as i64;
    let y0 = y0 as i64;

    let p00 = pixel_or_transparent(src, x0, y0);
    let p10 = pixel_or_transparent(src, x0 + 1, y0);
    let p01 = pixel_or_transparent(src, x0, y0 + 1);
    let p11 = pixel_or_transparent(src, x0 + 1, y0 + 1);

    let w00 = (1.0 - tx) * (1.0 - ty);
    let w10 = tx * (1.0 - ty);
    let w01 = (1.0 - tx) * ty;
    let w11 = tx * ty;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let v = f64::from(p00[i]) * w00
            + f64::from(p10[i]) * w10
            + f64::from(p01[i]) * w01
            + f64::from(p11[i]) * w11;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_at_zero_are_identity() {
        assert_eq!(rotated_bounds(640, 480, 0.0), (640, 480));
    }

    #[test]
    fn bounds_at_ninety_swap_dimensions() {
        assert_eq!(rotated_bounds(640, 480, 90.0), (480, 640));
        assert_eq!(rotated_bounds(640, 480, -90.0), (480, 640));
    }

    #[test]
    fn bounds_at_forty_five_expand() {
        let (w, h) = rotated_bounds(100, 100, 45.0);
        // 100 * sqrt(2) ~ 141.42
        assert_eq!(w, 141);
        assert_eq!(h, 141);
    }

    #[test]
    fn spin_schedule_boundaries_and_monotonicity() {
        let d = 0.3;
        assert_eq!(spin_angle_deg(0.0, d), 90.0);
        assert_eq!(spin_angle_deg(d, d), 0.0);
        assert_eq!(spin_angle_deg(d * 4.0, d), 0.0);
        assert_eq!(spin_angle_deg(-1.0, d), 90.0);

        let mut prev = 90.0;
        for i in 0..=30 {
            let t = d * f64::from(i) / 30.0;
            let a = spin_angle_deg(t, d);
            assert!(a <= prev && (0.0..=90.0).contains(&a));
            prev = a;
        }
    }

    #[test]
    fn spin_schedule_degenerate_duration_is_upright() {
        assert_eq!(spin_angle_deg(0.0, 0.0), 0.0);
        assert_eq!(spin_angle_deg(1.0, -0.5), 0.0);
    }

    #[test]
    fn rotate_zero_returns_equal_buffer() {
        let src = RasterBuffer::solid(7, 3, [9, 8, 7, 255]).unwrap();
        let out = rotate_with_expand(&src, 0.0);
        assert_eq!(out, src);
    }

    #[test]
    fn rotate_ninety_swaps_dimensions_and_stays_opaque_in_center() {
        let src = RasterBuffer::solid(8, 4, [50, 100, 150, 255]).unwrap();
        let out = rotate_with_expand(&src, 90.0);
        assert_eq!((out.width(), out.height()), (4, 8));
        assert_eq!(out.pixel(2, 4), [50, 100, 150, 255]);
    }

    #[test]
    fn rotate_forty_five_leaves_corners_transparent() {
        let src = RasterBuffer::solid(20, 20, [255, 255, 255, 255]).unwrap();
        let out = rotate_with_expand(&src, 45.0);
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(out.width() - 1, 0)[3], 0);
        assert_eq!(out.pixel(0, out.height() - 1)[3], 0);
        let center = out.pixel(out.width() / 2, out.height() / 2);
        assert_eq!(center[3], 255);
    }
}
