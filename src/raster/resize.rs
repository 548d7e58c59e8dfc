use crate::foundation::error::{VersusError, VersusResult};
use crate::raster::buffer::RasterBuffer;

/// Uniform scale factor that fits an image inside `max_dimension` on its
/// larger side.
pub fn resize_multiplier(width: u32, height: u32, max_dimension: u32) -> VersusResult<f64> {
    if width == 0 || height == 0 {
        return Err(VersusError::invalid_image(
            "cannot resize an image with zero area",
        ));
    }
    if max_dimension == 0 {
        return Err(VersusError::invalid_image("max dimension must be > 0"));
    }
    Ok(f64::from(max_dimension) / f64::from(width.max(height)))
}

/// Resize so the larger dimension equals `max_dimension` exactly, preserving
/// aspect ratio. Returns the resized buffer and the applied multiplier.
pub fn resize_to_fit(
    src: &RasterBuffer,
    max_dimension: u32,
) -> VersusResult<(RasterBuffer, f64)> {
    let (w, h) = (src.width(), src.height());
    let mult = resize_multiplier(w, h, max_dimension)?;

    // Pin the larger side to max_dimension exactly; derive the other side.
    let (new_w, new_h) = if w >= h {
        (
            max_dimension,
            ((f64::from(h) * mult).round() as u32).max(1),
        )
    } else {
        (
            ((f64::from(w) * mult).round() as u32).max(1),
            max_dimension,
        )
    };

    if (new_w, new_h) == (w, h) {
        return Ok((src.clone(), mult));
    }

    let img = image::RgbaImage::from_raw(w, h, src.as_bytes().to_vec()).ok_or_else(|| {
        VersusError::invalid_image("raster byte length mismatch during resize")
    })?;
    // Premultiplied channels interpolate linearly without fringing, so the
    // filter runs directly on the premultiplied bytes.
    let resized = image::imageops::resize(&img, new_w, new_h, image::imageops::FilterType::Triangle);
    let buffer = RasterBuffer::from_premul_parts(new_w, new_h, resized.into_raw())?;
    Ok((buffer, mult))
}

/// Resample to exact output dimensions, ignoring aspect ratio. Used for
/// backgrounds that must cover the canvas.
pub(crate) fn resize_exact(
    src: &RasterBuffer,
    width: u32,
    height: u32,
) -> VersusResult<RasterBuffer> {
    if width == 0 || height == 0 {
        return Err(VersusError::invalid_image("target area must be non-zero"));
    }
    if (src.width(), src.height()) == (width, height) {
        return Ok(src.clone());
    }
    let img = image::RgbaImage::from_raw(src.width(), src.height(), src.as_bytes().to_vec())
        .ok_or_else(|| VersusError::invalid_image("raster byte length mismatch during resize"))?;
    let resized = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
    RasterBuffer::from_premul_parts(width, height, resized.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_uses_larger_dimension() {
        assert_eq!(resize_multiplier(1000, 500, 500).unwrap(), 0.5);
        assert_eq!(resize_multiplier(250, 500, 500).unwrap(), 1.0);
        assert_eq!(resize_multiplier(100, 200, 500).unwrap(), 2.5);
    }

    #[test]
    fn zero_area_signals_invalid_image() {
        let err = resize_multiplier(0, 100, 500).unwrap_err();
        assert!(matches!(err, VersusError::InvalidImage(_)));
    }

    #[test]
    fn larger_side_lands_exactly_on_max_dimension() {
        let src = RasterBuffer::solid(800, 600, [10, 20, 30, 255]).unwrap();
        let (resized, mult) = resize_to_fit(&src, 500).unwrap();
        assert_eq!(resized.width(), 500);
        assert_eq!(resized.height(), 375);
        assert_eq!(mult, 0.625);
    }

    #[test]
    fn portrait_pins_height() {
        let src = RasterBuffer::solid(300, 900, [10, 20, 30, 255]).unwrap();
        let (resized, _) = resize_to_fit(&src, 450).unwrap();
        assert_eq!(resized.height(), 450);
        assert_eq!(resized.width(), 150);
    }

    #[test]
    fn aspect_ratio_survives_within_rounding() {
        let src = RasterBuffer::solid(1013, 677, [0, 0, 0, 255]).unwrap();
        let (resized, _) = resize_to_fit(&src, 500).unwrap();
        let src_ratio = 1013.0 / 677.0;
        let dst_ratio = f64::from(resized.width()) / f64::from(resized.height());
        assert!((src_ratio - dst_ratio).abs() < 0.01);
    }

    #[test]
    fn noop_resize_preserves_pixels() {
        let src = RasterBuffer::solid(500, 250, [7, 8, 9, 255]).unwrap();
        let (resized, mult) = resize_to_fit(&src, 500).unwrap();
        assert_eq!(mult, 1.0);
        assert_eq!(resized, src);
    }

    #[test]
    fn upscales_small_images() {
        let src = RasterBuffer::solid(50, 25, [1, 2, 3, 255]).unwrap();
        let (resized, mult) = resize_to_fit(&src, 100).unwrap();
        assert_eq!(mult, 2.0);
        assert_eq!(resized.width(), 100);
        assert_eq!(resized.height(), 50);
    }
}
