//! Image decoding from raw bytes
//!
//! The sniffed signature takes precedence over the declared MIME type;
//! the declared type is only a fallback for data whose header we don't
//! recognize.

use super::format::InputFormat;
use super::magic;
use crate::utils::error::{PicError, Result};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

fn image_crate_format(format: InputFormat) -> Option<ImageFormat> {
    match format {
        InputFormat::Jpeg => Some(ImageFormat::Jpeg),
        InputFormat::Png => Some(ImageFormat::Png),
        InputFormat::WebP => Some(ImageFormat::WebP),
        InputFormat::Gif => Some(ImageFormat::Gif),
        InputFormat::Bmp => Some(ImageFormat::Bmp),
        InputFormat::Tiff => Some(ImageFormat::Tiff),
        InputFormat::Avif => Some(ImageFormat::Avif),
        InputFormat::Heic | InputFormat::Heif => None,
    }
}

/// Decode image from raw bytes
///
/// # Arguments
/// * `data` - Raw image file bytes
/// * `declared` - Format the caller believes the bytes are in, if any
///
/// # Returns
/// * `Ok(DynamicImage)` - Successfully decoded raster
/// * `Err(PicError::Decode)` - Not a decodable image of the sniffed or declared type
pub fn decode_image(data: &[u8], declared: Option<InputFormat>) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(PicError::Decode("Empty image data".to_string()));
    }

    let format = match magic::sniff(data) {
        Ok(sniffed) => {
            if let Some(declared) = declared.filter(|d| *d != sniffed) {
                tracing::debug!(
                    "Declared {} but bytes look like {}, trusting the bytes",
                    declared,
                    sniffed
                );
            }
            sniffed
        }
        Err(e) => declared.ok_or(e)?,
    };

    if !format.is_readable() {
        return Err(PicError::Decode(format!(
            "{} decoding needs the `avif-decode` feature",
            format
        )));
    }

    let codec_format = image_crate_format(format).ok_or_else(|| {
        PicError::Decode(format!(
            "{} cannot be decoded directly, it needs the legacy converter",
            format
        ))
    })?;

    let img = ImageReader::with_format(Cursor::new(data), codec_format)
        .decode()
        .map_err(|e| PicError::Decode(format!("Failed to decode {}: {}", format, e)))?;

    tracing::debug!("Decoded {} image: {}x{}", format, img.width(), img.height());
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid JPEG file (1x1 pixel)
    const MINIMAL_JPEG: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x03, 0x02, 0x02, 0x02, 0x02,
        0x02, 0x03, 0x02, 0x02, 0x02, 0x03, 0x03, 0x03, 0x03, 0x04, 0x06, 0x04, 0x04, 0x04, 0x04,
        0x04, 0x08, 0x06, 0x06, 0x05, 0x06, 0x09, 0x08, 0x0A, 0x0A, 0x09, 0x08, 0x09, 0x09, 0x0A,
        0x0C, 0x0F, 0x0C, 0x0A, 0x0B, 0x0E, 0x0B, 0x09, 0x09, 0x0D, 0x11, 0x0D, 0x0E, 0x0F, 0x10,
        0x10, 0x11, 0x10, 0x0A, 0x0C, 0x12, 0x13, 0x12, 0x10, 0x13, 0x0F, 0x10, 0x10, 0x10, 0xFF,
        0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x11, 0x00, 0xFF, 0xC4, 0x00,
        0x14, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x09, 0xFF, 0xC4, 0x00, 0x14, 0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xDA, 0x00, 0x08,
        0x01, 0x01, 0x00, 0x00, 0x3F, 0x00, 0x54, 0xDF, 0xFF, 0xD9,
    ];

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_jpeg() {
        let img = decode_image(MINIMAL_JPEG, Some(InputFormat::Jpeg)).unwrap();
        assert_eq!((img.width(), img.height()), (1, 1));
    }

    #[test]
    fn test_decode_png() {
        let img = decode_image(&png_bytes(3, 2), None).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[test]
    fn test_decode_trusts_bytes_over_declared_type() {
        // Declared as WebP but really a PNG
        let img = decode_image(&png_bytes(4, 4), Some(InputFormat::WebP)).unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn test_decode_empty_data() {
        let result = decode_image(&[], Some(InputFormat::Png));
        assert!(matches!(result, Err(PicError::Decode(_))));
    }

    #[test]
    fn test_decode_corrupt_data() {
        let corrupt = vec![0xFF, 0x00, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
        assert!(matches!(decode_image(&corrupt, None), Err(PicError::Decode(_))));
        // A declared type doesn't make garbage decodable
        assert!(matches!(
            decode_image(&corrupt, Some(InputFormat::Jpeg)),
            Err(PicError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_partial_data() {
        // Only JPEG signature, no actual image data
        let partial = vec![0xFF, 0xD8, 0xFF, 0xE0];
        assert!(decode_image(&partial, None).is_err());
    }

    #[test]
    fn test_decode_refuses_heic() {
        let mut heic = vec![0x00, 0x00, 0x00, 0x10];
        heic.extend_from_slice(b"ftypheic\x00\x00\x00\x00");
        let err = decode_image(&heic, Some(InputFormat::Heic)).unwrap_err();
        assert!(err.to_string().contains("legacy converter"));
    }
}
