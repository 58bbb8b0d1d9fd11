//! Compression stage
//!
//! Shrinks an image in its own format before the codec adapter converts it.
//! The search works the way browser-side compressors do: encode once at the
//! requested quality and, while the result is over the size ceiling or
//! bigger than the source, step quality (and, for oversized sources, the
//! dimensions) down by 5% per trial.

use crate::image_processor::adapter::{ImageCrateCodec, RasterCodec};
use crate::image_processor::format::{InputFormat, OutputFormat, QualityMode};
use crate::image_processor::resizer::{self, ResizeFilter};
use crate::session::options::ProcessingOptions;
use crate::utils::error::{PicError, Result};
use std::sync::Arc;

const MIB: u64 = 1024 * 1024;

/// Size ceiling for most formats
pub const DEFAULT_MAX_SIZE: u64 = MIB;

/// Size ceiling when PNG is involved on either side
pub const PNG_MAX_SIZE: u64 = MIB / 2;

/// Quality floor when PNG is involved on either side
pub const PNG_MIN_QUALITY: f32 = 0.6;

/// Re-encode attempts after the first encode
pub const MAX_TRIALS: usize = 10;

/// Per-trial step for quality and dimensions
const STEP: f32 = 0.95;

/// Settings for one compression run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionConfig {
    /// Output should not exceed this many bytes
    pub max_size: u64,
    /// Starting quality factor, 0..=1
    pub initial_quality: f32,
    /// Cap on the longer output side
    pub max_dimension: Option<u32>,
}

impl CompressionConfig {
    pub fn from_options(source: InputFormat, options: &ProcessingOptions) -> Self {
        let quality = options.quality_factor();
        let png_involved = source == InputFormat::Png || options.format == OutputFormat::Png;

        let (max_size, initial_quality) = if png_involved {
            (PNG_MAX_SIZE, quality.max(PNG_MIN_QUALITY))
        } else {
            (DEFAULT_MAX_SIZE, quality)
        };

        Self {
            max_size,
            initial_quality,
            max_dimension: options.resize.max_dimension(),
        }
    }
}

/// Size-reduction transform run before format conversion
pub trait Compressor: Send + Sync {
    /// Compress `data`; the output is a decodable image
    ///
    /// Failures are reported as errors. The original bytes are never
    /// handed back in place of a failed result.
    fn compress(&self, data: &[u8], source: InputFormat, config: &CompressionConfig)
        -> Result<Vec<u8>>;
}

/// Default [`Compressor`]: iterative search in the source format
#[derive(Clone)]
pub struct ImageCompressor {
    codec: Arc<dyn RasterCodec>,
    filter: ResizeFilter,
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self::new(Arc::new(ImageCrateCodec))
    }
}

impl ImageCompressor {
    pub fn new(codec: Arc<dyn RasterCodec>) -> Self {
        Self {
            codec,
            filter: ResizeFilter::Triangle,
        }
    }

    fn search(
        &self,
        data: &[u8],
        source: InputFormat,
        format: OutputFormat,
        config: &CompressionConfig,
    ) -> Result<Vec<u8>> {
        let source_size = data.len() as u64;
        let surface = self.codec.decode(data, Some(source))?;

        let (mut width, mut height) = match config.max_dimension {
            Some(max) => resizer::fit_longest_side(surface.width(), surface.height(), max),
            None => (surface.width(), surface.height()),
        };
        let mut quality = config.initial_quality;

        let mut surface = resizer::resize_to(surface, width, height, self.filter)?;
        let mut candidate = self.codec.encode(&surface, format, quality)?;

        let exceeds_ceiling = candidate.len() as u64 > config.max_size;
        let grew = candidate.len() as u64 > source_size;
        if !exceeds_ceiling && !grew {
            return Ok(candidate);
        }

        let quality_matters = format.policy().quality == QualityMode::Lossy;
        if !exceeds_ceiling && !quality_matters {
            // Nothing left to trade
            return Ok(candidate);
        }

        let mut trials = 0;
        while trials < MAX_TRIALS
            && (candidate.len() as u64 > config.max_size || candidate.len() as u64 > source_size)
        {
            trials += 1;
            if exceeds_ceiling {
                (width, height) = resizer::scaled_dimensions(width, height, STEP);
                surface = resizer::resize_to(surface, width, height, self.filter)?;
            }
            quality *= STEP;
            candidate = self.codec.encode(&surface, format, quality)?;
            tracing::debug!(
                "Trial {}: {}x{} at {:.2} -> {} bytes",
                trials,
                width,
                height,
                quality,
                candidate.len()
            );
        }

        Ok(candidate)
    }
}

impl Compressor for ImageCompressor {
    fn compress(
        &self,
        data: &[u8],
        source: InputFormat,
        config: &CompressionConfig,
    ) -> Result<Vec<u8>> {
        // Only the legacy converter can read these
        let Some(format) = source.as_output() else {
            tracing::debug!("Passing {} through compression untouched", source);
            return Ok(data.to_vec());
        };

        let compressed = self
            .search(data, source, format, config)
            .map_err(|e| PicError::Compression(e.to_string()))?;

        tracing::debug!(
            "Compressed {} from {} to {} bytes",
            source,
            data.len(),
            compressed.len()
        );
        Ok(compressed)
    }
}
