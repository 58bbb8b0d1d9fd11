//! Supported image formats and their encode policies
//!
//! Input formats are everything intake accepts. Output formats are the
//! subset we can encode; HEIC/HEIF are decode-only and always go through the
//! legacy converter first.

use std::fmt;
use std::str::FromStr;

/// Formats accepted at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Avif,
    Heic,
    Heif,
}

/// Accepted MIME types and their file extensions, in intake order
const INPUT_TABLE: &[(InputFormat, &str, &[&str])] = &[
    (InputFormat::Jpeg, "image/jpeg", &["jpg", "jpeg"]),
    (InputFormat::Png, "image/png", &["png"]),
    (InputFormat::WebP, "image/webp", &["webp"]),
    (InputFormat::Gif, "image/gif", &["gif"]),
    (InputFormat::Bmp, "image/bmp", &["bmp"]),
    (InputFormat::Tiff, "image/tiff", &["tiff", "tif"]),
    (InputFormat::Avif, "image/avif", &["avif"]),
    (InputFormat::Heic, "image/heic", &["heic"]),
    (InputFormat::Heif, "image/heif", &["heif"]),
];

impl InputFormat {
    pub fn mime(&self) -> &'static str {
        INPUT_TABLE
            .iter()
            .find(|(format, _, _)| format == self)
            .map(|(_, mime, _)| *mime)
            .unwrap_or("application/octet-stream")
    }

    /// Look up a declared MIME type (case-insensitive, parameters ignored)
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        INPUT_TABLE
            .iter()
            .find(|(_, m, _)| *m == essence)
            .map(|(format, _, _)| *format)
    }

    /// Look up a file extension (case-insensitive, no leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        INPUT_TABLE
            .iter()
            .find(|(_, _, exts)| exts.contains(&ext.as_str()))
            .map(|(format, _, _)| *format)
    }

    /// Guess the format of a file name from its extension
    pub fn from_file_name(name: &str) -> Option<Self> {
        std::path::Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }

    /// HEIC and HEIF need the external legacy converter
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Heic | Self::Heif)
    }

    /// The same container written back out, if we can encode it
    pub fn as_output(&self) -> Option<OutputFormat> {
        match self {
            Self::Jpeg => Some(OutputFormat::Jpeg),
            Self::Png => Some(OutputFormat::Png),
            Self::WebP => Some(OutputFormat::WebP),
            Self::Gif => Some(OutputFormat::Gif),
            Self::Bmp => Some(OutputFormat::Bmp),
            Self::Tiff => Some(OutputFormat::Tiff),
            Self::Avif => Some(OutputFormat::Avif),
            Self::Heic | Self::Heif => None,
        }
    }

    /// Whether this build can read the format
    ///
    /// AVIF decoding needs dav1d and is only built with the `avif-decode`
    /// feature. HEIC/HEIF count as readable; their converter reports its
    /// own failure per item.
    pub fn is_readable(&self) -> bool {
        match self {
            Self::Avif => cfg!(feature = "avif-decode"),
            _ => true,
        }
    }

    /// All MIME types intake accepts in this build, for user-facing messages
    pub fn supported_mimes() -> impl Iterator<Item = &'static str> {
        INPUT_TABLE
            .iter()
            .filter(|(format, _, _)| format.is_readable())
            .map(|(_, mime, _)| *mime)
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Formats we can encode to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
    Avif,
}

/// How a format uses the quality factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityMode {
    /// The encoder takes the factor directly
    Lossy,
    /// The codec has no quality knob
    Ignored,
}

/// Per-format encode behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodePolicy {
    pub quality: QualityMode,
    /// Quality factors below this threshold shrink the raster by
    /// `max(MIN_DOWNSCALE, factor)` before encoding
    pub downscale_below: Option<f32>,
}

/// Smallest scale factor the quality emulation will apply
pub const MIN_DOWNSCALE: f32 = 0.7;

const LOSSY: EncodePolicy = EncodePolicy {
    quality: QualityMode::Lossy,
    downscale_below: None,
};

const FIXED: EncodePolicy = EncodePolicy {
    quality: QualityMode::Ignored,
    downscale_below: None,
};

const OUTPUT_TABLE: &[(OutputFormat, &str, EncodePolicy)] = &[
    (OutputFormat::Jpeg, "jpeg", LOSSY),
    (
        OutputFormat::Png,
        "png",
        EncodePolicy {
            quality: QualityMode::Ignored,
            downscale_below: Some(0.8),
        },
    ),
    (OutputFormat::WebP, "webp", LOSSY),
    (OutputFormat::Gif, "gif", FIXED),
    (OutputFormat::Bmp, "bmp", FIXED),
    (OutputFormat::Tiff, "tiff", FIXED),
    (OutputFormat::Avif, "avif", LOSSY),
];

impl OutputFormat {
    pub const ALL: [OutputFormat; 7] = [
        Self::Jpeg,
        Self::Png,
        Self::WebP,
        Self::Gif,
        Self::Bmp,
        Self::Tiff,
        Self::Avif,
    ];

    fn entry(&self) -> &'static (OutputFormat, &'static str, EncodePolicy) {
        // Every variant has a row; the index matches declaration order
        &OUTPUT_TABLE[*self as usize]
    }

    /// Short name, also used as the file extension (`jpeg`, `webp`, ...)
    pub fn name(&self) -> &'static str {
        self.entry().1
    }

    pub fn extension(&self) -> &'static str {
        self.name()
    }

    pub fn mime(&self) -> &'static str {
        self.as_input().mime()
    }

    pub fn policy(&self) -> EncodePolicy {
        self.entry().2
    }

    pub fn as_input(&self) -> InputFormat {
        match self {
            Self::Jpeg => InputFormat::Jpeg,
            Self::Png => InputFormat::Png,
            Self::WebP => InputFormat::WebP,
            Self::Gif => InputFormat::Gif,
            Self::Bmp => InputFormat::Bmp,
            Self::Tiff => InputFormat::Tiff,
            Self::Avif => InputFormat::Avif,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let lower = if lower == "jpg" { "jpeg".to_string() } else { lower };
        OUTPUT_TABLE
            .iter()
            .find(|(_, name, _)| *name == lower)
            .map(|(format, _, _)| *format)
            .ok_or_else(|| format!("unsupported output format: {}", s))
    }
}

/// Normalize a user-facing quality (1..=100) into a codec factor (0..=1)
pub fn quality_factor(quality: u8) -> f32 {
    f32::from(quality.clamp(1, 100)) / 100.0
}

/// Scale factor the encode policy applies for `factor`, if any
pub fn downscale_for(policy: &EncodePolicy, factor: f32) -> Option<f32> {
    match policy.downscale_below {
        Some(threshold) if factor < threshold => Some(factor.max(MIN_DOWNSCALE)),
        _ => None,
    }
}
