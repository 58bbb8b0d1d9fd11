//! Raster encoding to the supported output formats
//!
//! This is the plain encoder: it honours the quality factor for lossy
//! formats and nothing else. Quality emulation for formats without a
//! quality knob lives in the adapter.

use super::format::{OutputFormat, QualityMode};
use crate::utils::error::{PicError, Result};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use std::io::Cursor;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest)
const AVIF_SPEED: u8 = 8;

fn to_percent(factor: f32) -> u8 {
    (factor.clamp(0.01, 1.0) * 100.0).round() as u8
}

/// Largest width or height libwebp accepts
const WEBP_MAX_DIMENSION: u32 = 16383;

fn encode_webp(surface: &DynamicImage, buffer: &mut Vec<u8>, quality: u8) -> Result<()> {
    let (width, height) = (surface.width(), surface.height());
    if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(PicError::Encode(format!(
            "{}x{} is too large for webp (max {} per side)",
            width, height, WEBP_MAX_DIMENSION
        )));
    }

    let rgba = surface.to_rgba8();
    let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        .encode_simple(false, f32::from(quality))
        .map_err(|e| PicError::Encode(format!("Failed to encode webp: {:?}", e)))?;
    buffer.extend_from_slice(&encoded);
    Ok(())
}

/// Encode a raster to `format`
///
/// # Arguments
/// * `surface` - Decoded raster
/// * `format` - Target container
/// * `factor` - Quality factor in 0..=1, ignored by lossless formats
pub fn encode_image(surface: &DynamicImage, format: OutputFormat, factor: f32) -> Result<Vec<u8>> {
    if surface.width() == 0 || surface.height() == 0 {
        return Err(PicError::Encode("Cannot encode an empty raster".to_string()));
    }

    let quality = match format.policy().quality {
        QualityMode::Lossy => Some(to_percent(factor)),
        QualityMode::Ignored => None,
    };

    let mut buffer = Vec::new();
    let (width, height) = (surface.width(), surface.height());

    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = surface.to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality.unwrap_or(100))
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        OutputFormat::Png => {
            let rgba = surface.to_rgba8();
            PngEncoder::new_with_quality(
                Cursor::new(&mut buffer),
                CompressionType::Best,
                FilterType::Adaptive,
            )
            .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        }
        OutputFormat::WebP => {
            encode_webp(surface, &mut buffer, quality.unwrap_or(100))?;
            Ok(())
        }
        OutputFormat::Avif => {
            let rgba = surface.to_rgba8();
            AvifEncoder::new_with_speed_quality(
                Cursor::new(&mut buffer),
                AVIF_SPEED,
                quality.unwrap_or(100),
            )
            .write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        }
        OutputFormat::Gif => DynamicImage::ImageRgba8(surface.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif),
        OutputFormat::Bmp => DynamicImage::ImageRgba8(surface.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Bmp),
        OutputFormat::Tiff => DynamicImage::ImageRgba8(surface.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Tiff),
    };

    result.map_err(|e| PicError::Encode(format!("Failed to encode {}: {}", format, e)))?;

    if buffer.is_empty() {
        return Err(PicError::Encode(format!("{} encoder produced no data", format)));
    }

    tracing::debug!(
        "Encoded {}x{} raster to {} ({} bytes, quality {:?})",
        width,
        height,
        format,
        buffer.len(),
        quality
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processor::format::InputFormat;
    use crate::image_processor::magic::sniff;
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbaImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255]);
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_encode_every_format_sniffs_back() {
        let img = gradient(16, 16);
        for format in OutputFormat::ALL {
            let bytes = encode_image(&img, format, 0.8).unwrap();
            assert_eq!(sniff(&bytes).unwrap(), format.as_input(), "format {}", format);
        }
    }

    #[test]
    fn test_jpeg_quality_changes_size() {
        let img = gradient(64, 64);
        let high = encode_image(&img, OutputFormat::Jpeg, 0.95).unwrap();
        let low = encode_image(&img, OutputFormat::Jpeg, 0.2).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_webp_is_lossy_with_quality() {
        let img = gradient(64, 64);
        let high = encode_image(&img, OutputFormat::WebP, 1.0).unwrap();
        let low = encode_image(&img, OutputFormat::WebP, 0.1).unwrap();
        assert!(low.len() < high.len());
        assert_eq!(sniff(&low).unwrap(), InputFormat::WebP);
    }

    #[test]
    fn test_webp_oversized_raster_is_an_error() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(16_384, 1));
        assert!(matches!(
            encode_image(&img, OutputFormat::WebP, 0.8),
            Err(PicError::Encode(_))
        ));
    }

    #[test]
    fn test_webp_at_size_limit() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(WEBP_MAX_DIMENSION, 1));
        let bytes = encode_image(&img, OutputFormat::WebP, 0.8).unwrap();
        assert_eq!(sniff(&bytes).unwrap(), InputFormat::WebP);
    }

    #[test]
    fn test_png_ignores_quality() {
        let img = gradient(32, 32);
        let a = encode_image(&img, OutputFormat::Png, 0.1).unwrap();
        let b = encode_image(&img, OutputFormat::Png, 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_empty_raster() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(matches!(
            encode_image(&img, OutputFormat::Png, 1.0),
            Err(PicError::Encode(_))
        ));
    }

    #[test]
    fn test_to_percent_clamps() {
        assert_eq!(to_percent(0.85), 85);
        assert_eq!(to_percent(0.0), 1);
        assert_eq!(to_percent(2.0), 100);
    }
}
