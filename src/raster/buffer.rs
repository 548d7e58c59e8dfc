use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{VersusError, VersusResult};

/// An immutable rectangular grid of premultiplied RGBA8 pixels.
///
/// `RasterBuffer` is a value type: transforms produce new buffers rather
/// than mutating their input, so they compose freely and frames can be
/// evaluated out of order. Pixels live behind an `Arc`, making clones cheap
/// enough to hand around per frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    data: Arc<Vec<u8>>, // row-major premultiplied RGBA8
}

impl RasterBuffer {
    /// Fully transparent buffer of the given dimensions.
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: Arc::new(vec![0u8; width as usize * height as usize * 4]),
        }
    }

    /// Wrap raw premultiplied RGBA8 bytes.
    pub fn from_premul_parts(width: u32, height: u32, data: Vec<u8>) -> VersusResult<Self> {
        if width == 0 || height == 0 {
            return Err(VersusError::invalid_image("raster must have non-zero area"));
        }
        if data.len() != width as usize * height as usize * 4 {
            return Err(VersusError::invalid_image(
                "raster byte length must equal width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data: Arc::new(data),
        })
    }

    /// Build from straight-alpha RGBA8 bytes, premultiplying in place.
    pub fn from_straight_rgba(width: u32, height: u32, mut data: Vec<u8>) -> VersusResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul_parts(width, height, data)
    }

    /// Opaque single-color buffer (straight RGBA input). Handy for tests and
    /// synthetic backgrounds.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> VersusResult<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self::from_straight_rgba(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Premultiplied RGBA of the pixel at `(x, y)`. Out-of-range coordinates
    /// read as fully transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

/// Decode an encoded image (PNG, JPEG, ...) into a premultiplied buffer.
pub fn decode_image(bytes: &[u8]) -> VersusResult<RasterBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| VersusError::invalid_image(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterBuffer::from_straight_rgba(width, height, rgba.into_raw())
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn from_straight_premultiplies() {
        let buf = RasterBuffer::from_straight_rgba(1, 1, vec![100, 50, 200, 128]).unwrap();
        assert_eq!(
            buf.pixel(0, 0),
            [
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128
            ]
        );
    }

    #[test]
    fn zero_area_is_rejected() {
        assert!(RasterBuffer::from_premul_parts(0, 4, vec![]).is_err());
        assert!(RasterBuffer::from_premul_parts(4, 0, vec![]).is_err());
    }

    #[test]
    fn byte_length_mismatch_is_rejected() {
        assert!(RasterBuffer::from_premul_parts(2, 2, vec![0u8; 15]).is_err());
    }

    #[test]
    fn out_of_range_pixel_reads_transparent() {
        let buf = RasterBuffer::solid(2, 2, [255, 0, 0, 255]).unwrap();
        assert_eq!(buf.pixel(5, 0), [0, 0, 0, 0]);
        assert_eq!(buf.pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn decode_image_png_roundtrip() {
        let img = image::RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 0, 0, 0, 0]).unwrap();
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 1);
        assert_eq!(decoded.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(decoded.pixel(1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(b"not an image").is_err());
    }
}
