//! Raster resizing with aspect ratio preservation
//!
//! Dimension math lives in plain functions so the compression stage and the
//! codec adapter agree on rounding. Pixel work goes through
//! `fast_image_resize`.

use crate::utils::error::{PicError, Result};
use fast_image_resize as fr;
use fast_image_resize::images::Image;
use image::{DynamicImage, RgbaImage};

/// Resize filter algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFilter {
    /// Bilinear filtering (fastest, good quality)
    Triangle,

    /// Lanczos3 filtering (slower, highest quality)
    Lanczos3,
}

impl From<ResizeFilter> for fr::FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Triangle => fr::FilterType::Bilinear,
            ResizeFilter::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}

/// Fit `src` into a `max_width` x `max_height` box
///
/// Keeps the aspect ratio and never upscales. A non-empty source never
/// yields a zero dimension.
pub fn fit_within(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if src_width == 0 || src_height == 0 {
        return (0, 0);
    }

    let rx = max_width as f32 / src_width as f32;
    let ry = max_height as f32 / src_height as f32;
    let scale = rx.min(ry);

    if scale >= 1.0 {
        return (src_width, src_height);
    }

    let new_width = (src_width as f32 * scale).round() as u32;
    let new_height = (src_height as f32 * scale).round() as u32;

    (new_width.max(1), new_height.max(1))
}

/// Cap the longer side of `src` at `max_dimension`
pub fn fit_longest_side(src_width: u32, src_height: u32, max_dimension: u32) -> (u32, u32) {
    fit_within(src_width, src_height, max_dimension, max_dimension)
}

/// Slack for f32 products like `1000 * 0.7` landing just under an integer
const FLOOR_EPSILON: f32 = 1e-3;

/// Scale both sides by `scale`, flooring, with a 1px minimum
pub fn scaled_dimensions(src_width: u32, src_height: u32, scale: f32) -> (u32, u32) {
    let w = (src_width as f32 * scale + FLOOR_EPSILON).floor() as u32;
    let h = (src_height as f32 * scale + FLOOR_EPSILON).floor() as u32;
    (w.max(1), h.max(1))
}

/// Resize an RGBA raster to exactly `target_width` x `target_height`
pub fn resize_rgba(
    source: &RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: ResizeFilter,
) -> Result<RgbaImage> {
    let (src_width, src_height) = source.dimensions();

    if target_width == 0 || target_height == 0 {
        return Err(PicError::Encode(
            "Target dimensions must be greater than zero".to_string(),
        ));
    }

    if src_width == target_width && src_height == target_height {
        return Ok(source.clone());
    }

    let src_view = Image::from_vec_u8(
        src_width,
        src_height,
        source.as_raw().to_vec(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| PicError::Encode(format!("Failed to create source view: {}", e)))?;

    let mut dst_image = Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src_view,
            &mut dst_image,
            &fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(filter.into())),
        )
        .map_err(|e| PicError::Encode(format!("Resize operation failed: {}", e)))?;

    RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| PicError::Encode("Failed to create output image".to_string()))
}

/// Resize any raster, returning it unchanged when the size already matches
pub fn resize_to(
    surface: DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: ResizeFilter,
) -> Result<DynamicImage> {
    if (surface.width(), surface.height()) == (target_width, target_height) {
        return Ok(surface);
    }

    let rgba = surface.to_rgba8();
    let resized = resize_rgba(&rgba, target_width, target_height, filter)?;
    tracing::debug!(
        "Resized {}x{} -> {}x{}",
        surface.width(),
        surface.height(),
        target_width,
        target_height
    );
    Ok(DynamicImage::ImageRgba8(resized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_fit_landscape() {
        let (w, h) = fit_within(1000, 500, 256, 256);
        assert_eq!((w, h), (256, 128));
    }

    #[test]
    fn test_fit_portrait() {
        let (w, h) = fit_within(500, 1000, 256, 256);
        assert_eq!((w, h), (128, 256));
    }

    #[test]
    fn test_fit_no_upscale() {
        assert_eq!(fit_within(100, 100, 256, 256), (100, 100));
        assert_eq!(fit_within(50, 75, 256, 256), (50, 75));
        assert_eq!(fit_within(256, 256, 256, 256), (256, 256));
    }

    #[test]
    fn test_fit_zero_dimensions() {
        assert_eq!(fit_within(0, 0, 256, 256), (0, 0));
        assert_eq!(fit_within(100, 0, 256, 256), (0, 0));
    }

    #[test]
    fn test_fit_very_wide_image() {
        // 256 * (100/4000) = 6.4 rounded to 6
        assert_eq!(fit_within(4000, 100, 256, 256), (256, 6));
    }

    #[test]
    fn test_fit_longest_side() {
        assert_eq!(fit_longest_side(4000, 3000, 800), (800, 600));
        assert_eq!(fit_longest_side(3000, 4000, 800), (600, 800));
        assert_eq!(fit_longest_side(640, 480, 800), (640, 480));
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(1000, 1000, 0.7), (700, 700));
        assert_eq!(scaled_dimensions(999, 333, 0.5), (499, 166));
        assert_eq!(scaled_dimensions(1, 1, 0.7), (1, 1));
    }

    #[test]
    fn test_resize_rgba_downscale() {
        let source = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));

        let resized = resize_rgba(&source, 2, 2, ResizeFilter::Triangle).unwrap();
        assert_eq!(resized.dimensions(), (2, 2));

        let pixel = resized.get_pixel(0, 0);
        assert!(pixel[0] > 200);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_resize_rgba_same_size() {
        let source = RgbaImage::new(10, 10);
        let resized = resize_rgba(&source, 10, 10, ResizeFilter::Triangle).unwrap();
        assert_eq!(resized.dimensions(), (10, 10));
    }

    #[test]
    fn test_resize_rgba_invalid_dimensions() {
        let source = RgbaImage::new(10, 10);
        assert!(resize_rgba(&source, 0, 10, ResizeFilter::Triangle).is_err());
        assert!(resize_rgba(&source, 10, 0, ResizeFilter::Triangle).is_err());
    }

    #[test]
    fn test_resize_to_keeps_matching_surface() {
        let surface = DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
        let out = resize_to(surface, 8, 8, ResizeFilter::Lanczos3).unwrap();
        // Untouched, so still RGB
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_resize_to_large_to_small() {
        let mut source = RgbaImage::new(1000, 800);
        for (x, y, pixel) in source.enumerate_pixels_mut() {
            *pixel = Rgba([(x * 255 / 1000) as u8, (y * 255 / 800) as u8, 0, 255]);
        }

        let out = resize_to(DynamicImage::ImageRgba8(source), 200, 160, ResizeFilter::Lanczos3)
            .unwrap();
        assert_eq!((out.width(), out.height()), (200, 160));
    }
}
