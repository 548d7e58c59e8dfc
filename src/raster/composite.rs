use crate::foundation::error::{VersusError, VersusResult};
use crate::foundation::math::mul_div255;
use crate::raster::buffer::RasterBuffer;

pub type PremulRgba8 = [u8; 4];

/// Source-over blend of premultiplied pixels with an extra opacity factor.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite `src` over a canvas scratch buffer with its top-left corner at
/// `(x, y)` canvas coordinates, clipping to the canvas bounds.
///
/// `dst` is `canvas_width * canvas_height * 4` premultiplied RGBA8 bytes.
pub fn blit_over(
    dst: &mut [u8],
    canvas_width: u32,
    canvas_height: u32,
    src: &RasterBuffer,
    x: i64,
    y: i64,
    opacity: f32,
) {
    if opacity <= 0.0 {
        return;
    }

    let src_bytes = src.as_bytes();
    let sw = src.width() as i64;
    let sh = src.height() as i64;
    let cw = i64::from(canvas_width);
    let ch = i64::from(canvas_height);

    // Visible sub-rectangle of the source after clipping.
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + sw).min(cw);
    let y1 = (y + sh).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for cy in y0..y1 {
        let sy = (cy - y) as usize;
        let src_row = sy * sw as usize * 4;
        let dst_row = cy as usize * canvas_width as usize * 4;
        for cx in x0..x1 {
            let sx = (cx - x) as usize;
            let si = src_row + sx * 4;
            let di = dst_row + cx as usize * 4;
            let blended = over(
                [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                [
                    src_bytes[si],
                    src_bytes[si + 1],
                    src_bytes[si + 2],
                    src_bytes[si + 3],
                ],
                opacity,
            );
            dst[di..di + 4].copy_from_slice(&blended);
        }
    }
}

/// Flatten premultiplied RGBA over an opaque background color, producing
/// straight opaque RGBA bytes (the form encoders and PNG export expect).
pub fn flatten_premul_to_opaque(
    dst: &mut [u8],
    src: &[u8],
    bg_rgba: [u8; 4],
) -> VersusResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(VersusError::encoding(
            "flatten_premul_to_opaque expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            d[3] = 255;
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + u16::from(mul_div255(bg_r, inv))).min(255) as u8;
        d[1] = (u16::from(s[1]) + u16::from(mul_div255(bg_g, inv))).min(255) as u8;
        d[2] = (u16::from(s[2]) + u16::from(mul_div255(bg_b, inv))).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src, 1.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_dst_transparent_returns_scaled_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn blit_clips_against_canvas_edges() {
        let src = RasterBuffer::solid(2, 2, [255, 0, 0, 255]).unwrap();
        let mut dst = vec![0u8; 3 * 3 * 4];

        // Top-left corner hangs one pixel off both edges; only (0,0) lands.
        blit_over(&mut dst, 3, 3, &src, -1, -1, 1.0);
        assert_eq!(&dst[0..4], &[255, 0, 0, 255]);
        assert_eq!(&dst[4..8], &[0, 0, 0, 0]);
        assert_eq!(&dst[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn blit_fully_offscreen_is_noop() {
        let src = RasterBuffer::solid(2, 2, [255, 0, 0, 255]).unwrap();
        let mut dst = vec![0u8; 3 * 3 * 4];
        blit_over(&mut dst, 3, 3, &src, 10, 0, 1.0);
        blit_over(&mut dst, 3, 3, &src, 0, -5, 1.0);
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn blit_applies_opacity() {
        let src = RasterBuffer::solid(1, 1, [255, 255, 255, 255]).unwrap();
        let mut dst = vec![0u8; 4];
        blit_over(&mut dst, 1, 1, &src, 0, 0, 0.5);
        // 50% opacity over transparent black leaves half-intensity premul.
        assert_eq!(dst[3], 128);
        assert_eq!(dst[0], 128);
    }

    #[test]
    fn flatten_premul_over_black_produces_expected_rgb() {
        // Premultiplied red @ 50% alpha => rgb stays 128,0,0 over black.
        let src = vec![128u8, 0u8, 0u8, 128u8];
        let mut dst = vec![0u8; 4];
        flatten_premul_to_opaque(&mut dst, &src, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
    }

    #[test]
    fn flatten_premul_over_white_fills_transparency() {
        let src = vec![0u8, 0u8, 0u8, 0u8];
        let mut dst = vec![0u8; 4];
        flatten_premul_to_opaque(&mut dst, &src, [255, 255, 255, 255]).unwrap();
        assert_eq!(dst, vec![255u8, 255u8, 255u8, 255u8]);
    }

    #[test]
    fn flatten_rejects_mismatched_lengths() {
        let src = vec![0u8; 8];
        let mut dst = vec![0u8; 4];
        assert!(flatten_premul_to_opaque(&mut dst, &src, [0, 0, 0, 255]).is_err());
    }
}
