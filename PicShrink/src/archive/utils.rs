//! File naming for exports and downloads

use crate::image_processor::format::OutputFormat;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Natural sort comparison using natord (`img2` before `img10`)
pub fn natural_sort_cmp(a: &str, b: &str) -> Ordering {
    natord::compare(a, b)
}

/// File name without its last extension
///
/// A name without a dot, or with only a leading dot, is kept whole.
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// `<base>.<ext>` for a single processed download
pub fn download_name(original: &str, format: OutputFormat) -> String {
    format!("{}.{}", base_name(original), format.extension())
}

/// `<base>_<format>_<quality>.<format>` for an archive entry
pub fn export_name(original: &str, format: OutputFormat, quality: u8) -> String {
    format!(
        "{}_{}_{}.{}",
        base_name(original),
        format.name(),
        quality,
        format.extension()
    )
}

/// `processed_images_<unix-millis>.zip`
pub fn archive_file_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("processed_images_{}.zip", millis)
}

/// Make names unique by appending ` (n)` before the extension
///
/// The first occurrence keeps its name. Suffixes skip any name already
/// taken, including names that happen to look like an earlier suffix.
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(names.len());

    for name in names {
        if !taken.contains_key(&name) {
            taken.insert(name.clone(), 0);
            unique.push(name);
            continue;
        }

        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name.as_str(), ""),
        };
        let mut n = taken.get(&name).copied().unwrap_or(0);
        let candidate = loop {
            n += 1;
            let candidate = format!("{} ({}){}", stem, n, ext);
            if !taken.contains_key(&candidate) {
                break candidate;
            }
        };

        taken.insert(name.clone(), n);
        taken.insert(candidate.clone(), 0);
        unique.push(candidate);
    }

    unique
}
