//! Image encoding: rasterised page → file bytes in the chosen format.
//!
//! JPEG and WebP honour the quality setting. JPEG drops the alpha channel
//! (pdfium renders onto an opaque white page, so nothing is lost). PNG is
//! lossless and ignores quality. WebP goes through libwebp's lossy encoder
//! because the `image` crate only ships a lossless one.

use crate::config::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::error::{EncodingError, ImageFormatHint};
use image::{DynamicImage, ImageError};
use std::io::Cursor;
use tracing::debug;
use webp::Encoder as WebPEncoder;

/// Encode `img` as `format`; `quality` is a fraction in `[0.01, 1.0]`.
pub fn encode_image(
    img: &DynamicImage,
    format: ImageFormat,
    quality: f32,
) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        }
        ImageFormat::Jpeg => {
            let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            let encoder = JpegEncoder::new_with_quality(&mut buf, q);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        }
        ImageFormat::Webp => {
            let rgba = img.to_rgba8();
            let q = (quality * 100.0).clamp(1.0, 100.0);
            let encoded = WebPEncoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                .encode_simple(false, q)
                .map_err(|e| {
                    ImageError::Encoding(EncodingError::new(
                        ImageFormatHint::Exact(image::ImageFormat::WebP),
                        format!("libwebp: {e:?}"),
                    ))
                })?;
            buf.extend_from_slice(&encoded);
        }
    }

    debug!(
        "Encoded {}x{} image → {} bytes {}",
        img.width(),
        img.height(),
        buf.len(),
        format
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn page(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn png_has_signature() {
        let bytes = encode_image(&page(10, 10), ImageFormat::Png, 0.8).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn jpeg_has_soi_marker_and_decodes() {
        let bytes = encode_image(&page(16, 8), ImageFormat::Jpeg, 0.8).unwrap();
        assert!(bytes.starts_with(&[0xFF, 0xD8]));
        let decoded = image::load_from_memory(&bytes).expect("valid jpeg");
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn webp_has_riff_header() {
        let bytes = encode_image(&page(4, 4), ImageFormat::Webp, 0.5).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    /// A noisy image so the quantiser has something to discard.
    fn noisy() -> DynamicImage {
        let mut img = RgbaImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let v = ((x * 31 + y * 17) % 256) as u8;
            *px = Rgba([v, v.wrapping_mul(3), v.wrapping_add(91), 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn webp_decodes_to_source_size() {
        let bytes = encode_image(&page(24, 12), ImageFormat::Webp, 0.9).unwrap();
        let decoded = image::load_from_memory(&bytes).expect("valid webp");
        assert_eq!((decoded.width(), decoded.height()), (24, 12));
    }

    #[test]
    fn webp_quality_changes_size() {
        let img = noisy();
        let low = encode_image(&img, ImageFormat::Webp, 0.1).unwrap();
        let high = encode_image(&img, ImageFormat::Webp, 1.0).unwrap();
        assert_ne!(low, high);
        assert!(low.len() < high.len(), "{} vs {}", low.len(), high.len());
    }

    #[test]
    fn oversized_jpeg_is_an_error() {
        let wide = DynamicImage::ImageRgba8(RgbaImage::new(65_536, 1));
        assert!(encode_image(&wide, ImageFormat::Jpeg, 0.8).is_err());
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let img = noisy();
        let low = encode_image(&img, ImageFormat::Jpeg, 0.1).unwrap();
        let high = encode_image(&img, ImageFormat::Jpeg, 1.0).unwrap();
        assert!(low.len() < high.len(), "{} vs {}", low.len(), high.len());
    }
}
