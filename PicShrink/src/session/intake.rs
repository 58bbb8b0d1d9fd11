//! File intake validation
//!
//! Files arrive from a picker with a declared MIME type. A batch is either
//! accepted whole or rejected whole; the first bad file decides.

use crate::image_processor::format::InputFormat;
use crate::utils::error::{PicError, Result};
use bytes::Bytes;

/// One file handed over by the picker
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Build from a file name alone, inferring the MIME type from its extension
    ///
    /// Unknown extensions get `application/octet-stream`, which intake rejects.
    pub fn from_name(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = InputFormat::from_file_name(&name)
            .map(|format| format.mime())
            .unwrap_or("application/octet-stream");
        Self::new(name, mime, bytes)
    }
}

/// A file that passed validation
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    pub name: String,
    pub format: InputFormat,
    pub bytes: Bytes,
}

fn reject(file: &IncomingFile, reason: String) -> PicError {
    PicError::IntakeRejected {
        file: file.name.clone(),
        reason,
    }
}

/// Validate a single file's declared type
pub fn validate(file: &IncomingFile) -> Result<AcceptedFile> {
    let mime = file.mime.trim().to_ascii_lowercase();

    if !mime.starts_with("image/") {
        return Err(reject(file, "not an image".to_string()));
    }

    let format = InputFormat::from_mime(&mime).ok_or_else(|| {
        let supported: Vec<&str> = InputFormat::supported_mimes().collect();
        reject(
            file,
            format!(
                "unsupported image type {}, use one of: {}",
                mime,
                supported.join(", ")
            ),
        )
    })?;

    if !format.is_readable() {
        return Err(reject(
            file,
            format!("{} input needs the `avif-decode` feature", mime),
        ));
    }

    Ok(AcceptedFile {
        name: file.name.clone(),
        format,
        bytes: file.bytes.clone(),
    })
}

/// Validate a whole batch, all or nothing
pub fn validate_batch(files: &[IncomingFile]) -> Result<Vec<AcceptedFile>> {
    files.iter().map(validate).collect()
}
