//! Default processing options from the environment
//!
//! Reads `PICSHRINK_FORMAT` and `PICSHRINK_QUALITY`. Anything missing or
//! unparseable falls back to the built-in defaults.
use super::options::{ProcessingOptions, MAX_QUALITY, MIN_QUALITY};
use crate::image_processor::format::OutputFormat;

pub const FORMAT_ENV: &str = "PICSHRINK_FORMAT";
pub const QUALITY_ENV: &str = "PICSHRINK_QUALITY";

/// Build default options from the process environment
pub fn load_default_options() -> ProcessingOptions {
    options_from_lookup(|key| std::env::var(key).ok())
}

/// Build default options from an arbitrary key lookup
pub fn options_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ProcessingOptions {
    let mut options = ProcessingOptions::default();

    match lookup(FORMAT_ENV).map(|raw| raw.parse::<OutputFormat>()) {
        Some(Ok(format)) => options.format = format,
        Some(Err(e)) => {
            tracing::debug!("Ignoring {}: {}, defaulting to {}", FORMAT_ENV, e, options.format)
        }
        None => {}
    }

    match lookup(QUALITY_ENV).map(|raw| read_quality(&raw)) {
        Some(Ok(quality)) => options.quality = quality,
        Some(Err(e)) => {
            tracing::debug!("Ignoring {}: {}, defaulting to {}", QUALITY_ENV, e, options.quality)
        }
        None => {}
    }

    options
}

fn read_quality(raw: &str) -> Result<u8, String> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|e| format!("'{}' is not a number ({})", raw, e))?;

    if !(MIN_QUALITY as u32..=MAX_QUALITY as u32).contains(&value) {
        return Err(format!("{} is outside {}..={}", value, MIN_QUALITY, MAX_QUALITY));
    }
    Ok(value as u8)
}
