//! ZIP writer for processed images
//!
//! Payloads are already compressed images, so entries are stored rather
//! than deflated.

use super::ExportEntry;
use crate::utils::error::{PicError, Result};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write `entries` into an in-memory zip archive
pub fn build_zip(entries: &[ExportEntry]) -> Result<Vec<u8>> {
    if entries.is_empty() {
        return Err(PicError::NothingToExport);
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    for entry in entries {
        writer
            .start_file(entry.name.as_str(), options)
            .map_err(|e| PicError::Archive(format!("Failed to add {}: {}", entry.name, e)))?;
        writer.write_all(&entry.bytes)?;
        tracing::debug!("Added {} ({} bytes)", entry.name, entry.bytes.len());
    }

    let cursor = writer
        .finish()
        .map_err(|e| PicError::Archive(format!("Failed to finish archive: {}", e)))?;

    let archive = cursor.into_inner();
    tracing::info!("Built archive: {} entries, {} bytes", entries.len(), archive.len());
    Ok(archive)
}
