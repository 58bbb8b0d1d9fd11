//! Error types for PicShrink
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicError {
    #[error("File \"{file}\" rejected: {reason}")]
    IntakeRejected { file: String, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unsupported HEIC/HEIF image: {0}")]
    UnsupportedLegacyFormat(String),

    #[error("Compression failed: {0}")]
    Compression(String),

    #[error("No images to process")]
    NothingToProcess,

    #[error("No processed images to export")]
    NothingToExport,

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Preview handle {0} has been released")]
    PreviewReleased(u64),

    #[error("No item with id {0}")]
    UnknownItem(String),

    #[error("Item {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PicError {
    /// Whether the error belongs on the session banner rather than on an item
    pub fn is_session_level(&self) -> bool {
        matches!(
            self,
            PicError::IntakeRejected { .. } | PicError::NothingToProcess
        )
    }
}

pub type Result<T> = std::result::Result<T, PicError>;
