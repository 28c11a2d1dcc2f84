//! Image normalization ahead of recognition.

use crate::core::config::OcrConfig;
use crate::{ExtractumError, Result};
use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;

/// Decode `image`, apply the configured depth and preprocessing, and encode
/// the result as PNG.
///
/// # Errors
///
/// `OcrFailed` when the input cannot be decoded or re-encoded.
pub fn prepare_image(image: &[u8], config: &OcrConfig) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(image)
        .map_err(|e| ExtractumError::ocr_with_source("Failed to decode image for OCR", e))?;

    let decoded = if config.enable_image_preprocessing() {
        DynamicImage::ImageLuma8(stretch_contrast(decoded.to_luma8()))
    } else {
        decoded
    };
    let converted = apply_depth(decoded, config.depth());

    let mut png = Vec::new();
    converted
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ExtractumError::ocr_with_source("Failed to encode image for OCR", e))?;
    Ok(png)
}

/// Map the darkest pixel to 0 and the brightest to 255.
pub(crate) fn stretch_contrast(mut gray: GrayImage) -> GrayImage {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    if max <= min {
        return gray;
    }
    let range = u32::from(max - min);
    for pixel in gray.pixels_mut() {
        let value = u32::from(pixel.0[0] - min) * 255 / range;
        pixel.0[0] = value as u8;
    }
    gray
}

/// Convert to the pixel layout matching a bit depth: 1 is black and white,
/// 8 grayscale, 24 RGB and 32 RGBA.
pub(crate) fn apply_depth(image: DynamicImage, depth: u32) -> DynamicImage {
    match depth {
        1 => {
            let mut gray = image.to_luma8();
            for pixel in gray.pixels_mut() {
                pixel.0[0] = if pixel.0[0] >= 128 { 255 } else { 0 };
            }
            DynamicImage::ImageLuma8(gray)
        }
        8 => DynamicImage::ImageLuma8(image.to_luma8()),
        24 => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}
