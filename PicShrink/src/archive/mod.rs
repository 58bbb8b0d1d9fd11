//! Export of processed images
//!
//! Turns Done items into named entries and packs them into a single zip.

mod utils;
mod zip;

pub use self::zip::build_zip;
pub use utils::{archive_file_name, base_name, dedupe_names, download_name, export_name};

use crate::session::{Item, ItemState};
use bytes::Bytes;
use utils::natural_sort_cmp;

/// One file destined for the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub name: String,
    pub bytes: Bytes,
}

/// Archive entries for every Done item
///
/// Names carry the format and quality each item was processed with. They
/// are made unique and sorted naturally.
pub fn export_entries(items: &[Item]) -> Vec<ExportEntry> {
    let done: Vec<(String, Bytes)> = items
        .iter()
        .filter(|item| item.state == ItemState::Done)
        .filter_map(|item| {
            item.processed.as_ref().map(|processed| {
                (
                    export_name(&item.original.name, processed.format, processed.quality),
                    processed.bytes.clone(),
                )
            })
        })
        .collect();

    let (names, payloads): (Vec<String>, Vec<Bytes>) = done.into_iter().unzip();
    let mut entries: Vec<ExportEntry> = dedupe_names(names)
        .into_iter()
        .zip(payloads)
        .map(|(name, bytes)| ExportEntry { name, bytes })
        .collect();

    entries.sort_by(|a, b| natural_sort_cmp(&a.name, &b.name));
    entries
}
