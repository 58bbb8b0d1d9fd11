//! Image format detection using magic headers (file signatures)
//!
//! Declared MIME types come from the file picker and can lie; the bytes
//! don't. Every decode and every "what did we actually produce" check goes
//! through [`sniff`].
//!
//! ## Signatures
//!
//! - **JPEG**: `FF D8 FF`
//! - **PNG**: `89 50 4E 47 0D 0A 1A 0A`
//! - **GIF**: `47 49 46 38` (GIF87a/GIF89a)
//! - **BMP**: `42 4D`
//! - **TIFF**: `49 49 2A 00` or `4D 4D 00 2A`
//! - **WebP**: `RIFF....WEBP`
//! - **AVIF / HEIC / HEIF**: ISO-BMFF `ftyp` box, told apart by brand

use super::format::InputFormat;
use crate::utils::error::{PicError, Result};

/// Minimum bytes needed for detection
const MIN_BYTES: usize = 4;

/// How far into the file the `ftyp` box may start
const BMFF_PARSE_LIMIT: usize = 4096;

const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];
const HEIC_BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis"];
const HEIF_BRANDS: &[&[u8; 4]] = &[b"mif1", b"msf1"];

/// Detect image format from magic bytes
///
/// # Returns
/// * `Ok(InputFormat)` - Recognized format
/// * `Err(PicError::Decode)` - Too short or not a known image signature
pub fn sniff(data: &[u8]) -> Result<InputFormat> {
    if data.is_empty() {
        return Err(PicError::Decode("Empty data".to_string()));
    }

    if data.len() < MIN_BYTES {
        return Err(PicError::Decode(format!(
            "Insufficient data for format detection (need {} bytes, got {})",
            MIN_BYTES,
            data.len()
        )));
    }

    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Ok(InputFormat::Jpeg);
    }

    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Ok(InputFormat::Png);
    }

    if data.starts_with(b"GIF8") {
        return Ok(InputFormat::Gif);
    }

    if data.starts_with(b"BM") {
        return Ok(InputFormat::Bmp);
    }

    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Ok(InputFormat::Tiff);
    }

    // RIFF (4) + size (4) + WEBP (4)
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Ok(InputFormat::WebP);
    }

    if let Some(format) = sniff_bmff(data) {
        return Ok(format);
    }

    Err(PicError::Decode(format!(
        "Unrecognized image format (first 16 bytes: {:02X?})",
        &data[..data.len().min(16)]
    )))
}

/// Classify an ISO-BMFF container by the brands of its `ftyp` box
///
/// The major brand wins; compatible brands are consulted only when the major
/// brand is something generic. AVIF is checked before HEIF because AVIF
/// files commonly list `mif1` as a compatible brand.
fn sniff_bmff(data: &[u8]) -> Option<InputFormat> {
    let brands = ftyp_brands(data)?;
    let (major, compatible) = brands.split_first()?;

    for brand in std::iter::once(major).chain(compatible.iter()) {
        if AVIF_BRANDS.contains(brand) {
            return Some(InputFormat::Avif);
        }
        if HEIC_BRANDS.contains(brand) {
            return Some(InputFormat::Heic);
        }
    }

    if std::iter::once(major)
        .chain(compatible.iter())
        .any(|brand| HEIF_BRANDS.contains(brand))
    {
        return Some(InputFormat::Heif);
    }

    None
}

/// Walk top-level boxes until `ftyp`; return major + compatible brands
fn ftyp_brands(data: &[u8]) -> Option<Vec<&[u8; 4]>> {
    let parse_limit = data.len().min(BMFF_PARSE_LIMIT);
    let mut cursor = 0usize;

    while cursor + 8 <= parse_limit {
        let size = u32::from_be_bytes(data[cursor..cursor + 4].try_into().ok()?) as usize;
        let box_type = &data[cursor + 4..cursor + 8];

        let (header_size, box_end) = if size == 1 {
            if cursor + 16 > parse_limit {
                return None;
            }
            let large_size =
                u64::from_be_bytes(data[cursor + 8..cursor + 16].try_into().ok()?) as usize;
            if large_size < 16 {
                return None;
            }
            (16usize, cursor.saturating_add(large_size))
        } else {
            if size < 8 {
                return None;
            }
            (8usize, cursor.saturating_add(size))
        };

        if box_type == b"ftyp" {
            // Truncated input still gets classified by whatever brands fit
            let end = box_end.min(data.len());
            let body = data.get(cursor + header_size..end)?;
            if body.len() < 4 {
                return None;
            }

            let mut brands: Vec<&[u8; 4]> = vec![body[0..4].try_into().ok()?];
            // Skip minor version (4 bytes)
            let mut offset = 8;
            while offset + 4 <= body.len() {
                brands.push(body[offset..offset + 4].try_into().ok()?);
                offset += 4;
            }
            return Some(brands);
        }

        if box_end > parse_limit {
            return None;
        }
        cursor = box_end;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_HEADER: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01,
    ];
    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    ];
    const GIF_HEADER: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
    const BMP_HEADER: &[u8] = &[0x42, 0x4D, 0x46, 0x00, 0x00, 0x00];
    const TIFF_HEADER_LE: &[u8] = &[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00];
    const TIFF_HEADER_BE: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x08];
    const WEBP_HEADER: &[u8] = b"RIFF\x00\x00\x00\x00WEBPVP8 ";

    fn ftyp(major: &[u8; 4], compatible: &[&[u8; 4]]) -> Vec<u8> {
        let size = 16 + 4 * compatible.len();
        let mut data = Vec::with_capacity(size);
        data.extend_from_slice(&(size as u32).to_be_bytes());
        data.extend_from_slice(b"ftyp");
        data.extend_from_slice(major);
        data.extend_from_slice(&[0, 0, 0, 0]);
        for brand in compatible {
            data.extend_from_slice(*brand);
        }
        data
    }

    #[test]
    fn test_sniff_classic_formats() {
        assert_eq!(sniff(JPEG_HEADER).unwrap(), InputFormat::Jpeg);
        assert_eq!(sniff(PNG_HEADER).unwrap(), InputFormat::Png);
        assert_eq!(sniff(GIF_HEADER).unwrap(), InputFormat::Gif);
        assert_eq!(sniff(BMP_HEADER).unwrap(), InputFormat::Bmp);
        assert_eq!(sniff(TIFF_HEADER_LE).unwrap(), InputFormat::Tiff);
        assert_eq!(sniff(TIFF_HEADER_BE).unwrap(), InputFormat::Tiff);
        assert_eq!(sniff(WEBP_HEADER).unwrap(), InputFormat::WebP);
    }

    #[test]
    fn test_sniff_avif() {
        assert_eq!(sniff(&ftyp(b"avif", &[b"mif1", b"miaf"])).unwrap(), InputFormat::Avif);
        assert_eq!(sniff(&ftyp(b"avis", &[])).unwrap(), InputFormat::Avif);
    }

    #[test]
    fn test_sniff_heic_and_heif() {
        assert_eq!(sniff(&ftyp(b"heic", &[b"mif1"])).unwrap(), InputFormat::Heic);
        assert_eq!(sniff(&ftyp(b"heix", &[])).unwrap(), InputFormat::Heic);
        assert_eq!(sniff(&ftyp(b"mif1", &[b"heic"])).unwrap(), InputFormat::Heic);
        assert_eq!(sniff(&ftyp(b"mif1", &[b"miaf"])).unwrap(), InputFormat::Heif);
    }

    #[test]
    fn test_sniff_avif_with_mif1_major() {
        assert_eq!(sniff(&ftyp(b"mif1", &[b"avif"])).unwrap(), InputFormat::Avif);
    }

    #[test]
    fn test_sniff_unknown_bmff_brand() {
        // MP4 video
        assert!(sniff(&ftyp(b"isom", &[b"mp41"])).is_err());
    }

    #[test]
    fn test_sniff_empty() {
        assert!(matches!(sniff(&[]), Err(PicError::Decode(_))));
    }

    #[test]
    fn test_sniff_insufficient() {
        assert!(sniff(&[0xFF, 0xD8]).is_err());
    }

    #[test]
    fn test_sniff_not_an_image() {
        assert!(sniff(b"This is not an image file").is_err());
    }

    #[test]
    fn test_sniff_malformed_box_sizes() {
        // Box size smaller than its own header
        let mut data = vec![0, 0, 0, 4];
        data.extend_from_slice(b"ftypheic");
        assert!(sniff(&data).is_err());

        // Large size marker with no room for the 64-bit size
        let mut data = vec![0, 0, 0, 1];
        data.extend_from_slice(b"ftyp");
        assert!(sniff(&data).is_err());
    }
}
