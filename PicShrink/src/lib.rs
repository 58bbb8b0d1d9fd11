//! PicShrink - local image compressor and format converter
//!
//! Takes a batch of images, shrinks each one in its own format and converts
//! it to the requested output format and quality. Results are exported one
//! by one or as a single zip archive. HEIC/HEIF input goes through a legacy
//! JPEG pre-conversion (enable the `heif` feature for libheif support).
//!
//! ```no_run
//! use picshrink::{IncomingFile, Pipeline, Session, SessionHandle};
//!
//! # async fn run(bytes: Vec<u8>) -> picshrink::Result<()> {
//! let session = SessionHandle::new(Session::new());
//! session.lock().add_files(vec![IncomingFile::from_name("cat.jpg", bytes)])?;
//!
//! let report = Pipeline::new(session.clone()).process_all().await?;
//! println!("{} of {} done", report.succeeded, report.attempted);
//! let archive = picshrink::build_zip(&session.lock().export_entries())?;
//! std::fs::write("processed.zip", archive)?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod compression;
pub mod image_processor;
pub mod pipeline;
pub mod session;
pub mod utils;

pub use archive::{archive_file_name, build_zip, download_name, ExportEntry};
pub use compression::{CompressionConfig, Compressor, ImageCompressor};
pub use image_processor::{CodecAdapter, InputFormat, OutputFormat};
pub use pipeline::{BatchReport, ItemOutcome, Pipeline};
pub use session::intake::IncomingFile;
pub use session::options::{OptionsUpdate, ProcessingOptions, ResizeOptions};
pub use session::{Item, ItemId, ItemState, Session, SessionHandle};
pub use utils::error::{PicError, Result};
