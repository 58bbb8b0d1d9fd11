//! Format codec adapter
//!
//! Wraps the raster primitives (decode, encode) and the legacy converter
//! behind one `convert` call used by the pipeline. Format-specific behavior
//! comes from the encode policy table in [`super::format`], not from
//! branches here.

use super::decoder::decode_image;
use super::encoder::encode_image;
use super::format::{downscale_for, quality_factor, InputFormat, OutputFormat};
use super::legacy::{default_converter, LegacyConverter};
use super::resizer::{self, ResizeFilter};
use crate::utils::error::{PicError, Result};
use image::DynamicImage;
use std::sync::Arc;

/// Raster decode/encode primitives
pub trait RasterCodec: Send + Sync {
    /// Decode bytes into a raster surface
    fn decode(&self, data: &[u8], declared: Option<InputFormat>) -> Result<DynamicImage>;

    /// Encode a raster surface at quality `factor` (0..=1)
    fn encode(&self, surface: &DynamicImage, format: OutputFormat, factor: f32) -> Result<Vec<u8>>;
}

/// [`RasterCodec`] backed by the `image` and `webp` crates
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateCodec;

impl RasterCodec for ImageCrateCodec {
    fn decode(&self, data: &[u8], declared: Option<InputFormat>) -> Result<DynamicImage> {
        decode_image(data, declared)
    }

    fn encode(&self, surface: &DynamicImage, format: OutputFormat, factor: f32) -> Result<Vec<u8>> {
        encode_image(surface, format, factor)
    }
}

/// Converts encoded bytes from one format/quality to another
#[derive(Clone)]
pub struct CodecAdapter {
    raster: Arc<dyn RasterCodec>,
    legacy: Arc<dyn LegacyConverter>,
    filter: ResizeFilter,
}

impl Default for CodecAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ImageCrateCodec), default_converter())
    }
}

impl CodecAdapter {
    pub fn new(raster: Arc<dyn RasterCodec>, legacy: Arc<dyn LegacyConverter>) -> Self {
        Self {
            raster,
            legacy,
            filter: ResizeFilter::Lanczos3,
        }
    }

    /// Raster primitives this adapter encodes with
    pub fn raster(&self) -> Arc<dyn RasterCodec> {
        Arc::clone(&self.raster)
    }

    /// Re-encode `data` as `target` at user-facing `quality` (1..=100)
    ///
    /// HEIC/HEIF input goes through the legacy converter first. If the
    /// target is JPEG its output is returned untouched; otherwise it is
    /// decoded and encoded once more. A converter failure is final: the
    /// normal decode path is never tried as a fallback.
    pub fn convert(
        &self,
        data: &[u8],
        declared: InputFormat,
        target: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>> {
        let factor = quality_factor(quality);

        if declared.is_legacy() {
            tracing::debug!("Converting {} input through the legacy converter", declared);
            let jpeg = self.legacy.to_jpeg(data, factor).map_err(|e| match e {
                PicError::UnsupportedLegacyFormat(_) => e,
                other => PicError::UnsupportedLegacyFormat(other.to_string()),
            })?;

            if target == OutputFormat::Jpeg {
                return Ok(jpeg);
            }
            return self.reencode(&jpeg, InputFormat::Jpeg, target, factor);
        }

        self.reencode(data, declared, target, factor)
    }

    fn reencode(
        &self,
        data: &[u8],
        declared: InputFormat,
        target: OutputFormat,
        factor: f32,
    ) -> Result<Vec<u8>> {
        let mut surface = self.raster.decode(data, Some(declared))?;

        if let Some(scale) = downscale_for(&target.policy(), factor) {
            let (w, h) = resizer::scaled_dimensions(surface.width(), surface.height(), scale);
            tracing::debug!(
                "{} has no quality setting, scaling by {:.2} to {}x{} instead",
                target,
                scale,
                w,
                h
            );
            surface = resizer::resize_to(surface, w, h, self.filter)?;
        }

        self.raster.encode(&surface, target, factor)
    }
}
