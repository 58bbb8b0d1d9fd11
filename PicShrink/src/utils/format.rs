//! Human readable formatting helpers

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with 1024-based units
///
/// Trailing zeros of the fractional part are dropped, so `1536` becomes
/// `1.5 KB` and `2048` becomes `2 KB`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text = text.trim_end_matches('0').trim_end_matches('.').to_string();
    }

    format!("{} {}", text, UNITS[unit])
}

/// Percentage saved going from `original` to `processed` bytes
///
/// Negative when the output grew.
pub fn saving_percent(original: u64, processed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - processed as f64 / original as f64) * 100.0
}
