//! Image codec layer
//!
//! Everything that touches pixels lives here. The pipeline only ever calls
//! [`adapter::CodecAdapter::convert`]; the compression stage reuses the
//! same [`adapter::RasterCodec`] primitives.
//!
//! # Architecture
//!
//! - **format**: supported formats and the per-format encode policy table
//! - **magic**: signature sniffing
//! - **decoder** / **encoder**: `image` crate (+ `webp` for lossy WebP)
//! - **resizer**: dimension math and `fast_image_resize` resampling
//! - **legacy**: HEIC/HEIF to JPEG pre-conversion
//! - **adapter**: ties the above into one convert call
//!
//! # Supported Formats
//!
//! | Format | Decode | Encode | Quality |
//! |--------|--------|--------|---------|
//! | JPEG   | yes    | yes    | lossy   |
//! | PNG    | yes    | yes    | emulated by downscaling |
//! | WebP   | yes    | yes    | lossy   |
//! | GIF    | yes    | yes    | none    |
//! | BMP    | yes    | yes    | none    |
//! | TIFF   | yes    | yes    | none    |
//! | AVIF   | `avif-decode` feature | yes | lossy |
//! | HEIC/HEIF | via legacy converter | no | - |

pub mod adapter;
mod decoder;
mod encoder;
pub mod format;
pub mod legacy;
pub mod magic;
pub mod resizer;

pub use adapter::{CodecAdapter, ImageCrateCodec, RasterCodec};
pub use decoder::decode_image;
pub use encoder::encode_image;
pub use format::{quality_factor, InputFormat, OutputFormat};
pub use legacy::{LegacyConverter, UnavailableLegacyConverter};
