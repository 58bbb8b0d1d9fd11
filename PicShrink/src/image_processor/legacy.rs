//! HEIC/HEIF pre-conversion
//!
//! Neither container can be decoded by the `image` crate. They are first
//! turned into a baseline JPEG by a [`LegacyConverter`]; everything after
//! that point treats the result as an ordinary JPEG.
//!
//! The real converter binds the system libheif and is only built with the
//! `heif` feature. Without it every HEIC/HEIF item fails cleanly with
//! [`PicError::UnsupportedLegacyFormat`].

use crate::utils::error::{PicError, Result};

/// Decodes a legacy container and re-encodes it as JPEG
pub trait LegacyConverter: Send + Sync {
    /// Convert `data` to JPEG at quality `factor` (0..=1)
    fn to_jpeg(&self, data: &[u8], factor: f32) -> Result<Vec<u8>>;
}

/// Converter used when no HEIF decoder is compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLegacyConverter;

impl LegacyConverter for UnavailableLegacyConverter {
    fn to_jpeg(&self, _data: &[u8], _factor: f32) -> Result<Vec<u8>> {
        Err(PicError::UnsupportedLegacyFormat(
            "built without HEIF support (enable the `heif` feature)".to_string(),
        ))
    }
}

/// The best converter this build offers
pub fn default_converter() -> std::sync::Arc<dyn LegacyConverter> {
    #[cfg(feature = "heif")]
    {
        std::sync::Arc::new(heif::LibheifConverter)
    }
    #[cfg(not(feature = "heif"))]
    {
        std::sync::Arc::new(UnavailableLegacyConverter)
    }
}

#[cfg(feature = "heif")]
pub use heif::LibheifConverter;

#[cfg(feature = "heif")]
mod heif {
    use super::LegacyConverter;
    use crate::image_processor::encoder::encode_image;
    use crate::image_processor::format::OutputFormat;
    use crate::utils::error::{PicError, Result};
    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    /// libheif-backed converter
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LibheifConverter;

    fn unsupported(e: impl std::fmt::Display) -> PicError {
        PicError::UnsupportedLegacyFormat(e.to_string())
    }

    impl LegacyConverter for LibheifConverter {
        fn to_jpeg(&self, data: &[u8], factor: f32) -> Result<Vec<u8>> {
            let lib_heif = LibHeif::new();
            let ctx = HeifContext::read_from_bytes(data).map_err(unsupported)?;
            let handle = ctx.primary_image_handle().map_err(unsupported)?;

            let (width, height) = (handle.width(), handle.height());
            let decoded = lib_heif
                .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
                .map_err(unsupported)?;

            let planes = decoded.planes();
            let interleaved = planes
                .interleaved
                .ok_or_else(|| unsupported("no interleaved RGB plane"))?;

            // Rows may be padded; copy them out tightly packed
            let row_len = width as usize * 3;
            let mut rgb = Vec::with_capacity(row_len * height as usize);
            for y in 0..height as usize {
                let start = y * interleaved.stride;
                let row = interleaved
                    .data
                    .get(start..start + row_len)
                    .ok_or_else(|| unsupported("truncated RGB plane"))?;
                rgb.extend_from_slice(row);
            }

            let raster = RgbImage::from_raw(width, height, rgb)
                .ok_or_else(|| unsupported("RGB buffer size mismatch"))?;

            tracing::debug!("libheif decoded {}x{} image", width, height);
            encode_image(&DynamicImage::ImageRgb8(raster), OutputFormat::Jpeg, factor)
                .map_err(unsupported)
        }
    }
}
