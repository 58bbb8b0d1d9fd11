//! Processing options shared by every item in a session
use crate::image_processor::format::{quality_factor, OutputFormat};

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;
pub const DEFAULT_QUALITY: u8 = 85;

/// Optional bounding box applied during compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeOptions {
    pub enabled: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ResizeOptions {
    /// Longest-side cap, when resizing is on and at least one bound is set
    ///
    /// An unset bound counts as 0, so `width: 800, height: None` caps at 800.
    pub fn max_dimension(&self) -> Option<u32> {
        if !self.enabled {
            return None;
        }
        let width = self.width.filter(|w| *w > 0);
        let height = self.height.filter(|h| *h > 0);
        if width.is_none() && height.is_none() {
            return None;
        }
        Some(width.unwrap_or(0).max(height.unwrap_or(0)))
    }
}

/// Target format, quality and resize settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingOptions {
    pub format: OutputFormat,
    /// 1..=100
    pub quality: u8,
    pub resize: ResizeOptions,
}

impl Default for ProcessingOptions {
    /// WebP at quality 85, no resizing
    fn default() -> Self {
        Self {
            format: OutputFormat::WebP,
            quality: DEFAULT_QUALITY,
            resize: ResizeOptions::default(),
        }
    }
}

impl ProcessingOptions {
    /// Quality normalized to a 0..=1 codec factor
    pub fn quality_factor(&self) -> f32 {
        quality_factor(self.quality)
    }

    /// Shallow merge: fields present in `update` replace ours
    pub fn merge(&mut self, update: OptionsUpdate) {
        if let Some(format) = update.format {
            self.format = format;
        }
        if let Some(quality) = update.quality {
            self.quality = quality.clamp(MIN_QUALITY, MAX_QUALITY);
        }
        if let Some(resize) = update.resize {
            self.resize = resize;
        }
    }
}

/// Partial options update from the settings surface
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptionsUpdate {
    pub format: Option<OutputFormat>,
    pub quality: Option<u8>,
    pub resize: Option<ResizeOptions>,
}

impl OptionsUpdate {
    pub fn format(format: OutputFormat) -> Self {
        Self {
            format: Some(format),
            ..Default::default()
        }
    }

    pub fn quality(quality: u8) -> Self {
        Self {
            quality: Some(quality),
            ..Default::default()
        }
    }

    pub fn resize(resize: ResizeOptions) -> Self {
        Self {
            resize: Some(resize),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ProcessingOptions::default();
        assert_eq!(options.format, OutputFormat::WebP);
        assert_eq!(options.quality, 85);
        assert!(!options.resize.enabled);
        assert_eq!(options.resize.max_dimension(), None);
    }

    #[test]
    fn test_merge_keeps_unrelated_fields() {
        let mut options = ProcessingOptions::default();
        options.merge(OptionsUpdate::quality(40));
        assert_eq!(options.quality, 40);
        assert_eq!(options.format, OutputFormat::WebP);

        options.merge(OptionsUpdate::format(OutputFormat::Png));
        assert_eq!(options.format, OutputFormat::Png);
        assert_eq!(options.quality, 40);
    }

    #[test]
    fn test_merge_clamps_quality() {
        let mut options = ProcessingOptions::default();
        options.merge(OptionsUpdate::quality(0));
        assert_eq!(options.quality, 1);
        options.merge(OptionsUpdate::quality(250));
        assert_eq!(options.quality, 100);
    }

    #[test]
    fn test_max_dimension() {
        let mut resize = ResizeOptions {
            enabled: true,
            width: Some(800),
            height: Some(1200),
        };
        assert_eq!(resize.max_dimension(), Some(1200));

        resize.height = None;
        assert_eq!(resize.max_dimension(), Some(800));

        resize.width = None;
        assert_eq!(resize.max_dimension(), None);

        resize.width = Some(640);
        resize.enabled = false;
        assert_eq!(resize.max_dimension(), None);
    }

    #[test]
    fn test_quality_factor() {
        let options = ProcessingOptions {
            quality: 50,
            ..Default::default()
        };
        assert_eq!(options.quality_factor(), 0.5);
    }
}
