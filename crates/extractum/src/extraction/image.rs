//! Image metadata: dimensions, container format and common EXIF tags.

use crate::metadata::MetadataBuilder;
use crate::{ExtractumError, Result};
use exif::{In, Reader, Tag};
use image::ImageReader;
use std::io::Cursor;

/// Image metadata extracted from an image file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Image format (e.g., "PNG", "JPEG")
    pub format: String,
    /// EXIF tags in a fixed order
    pub exif: Vec<(&'static str, String)>,
}

impl ImageMetadata {
    pub fn add_to(&self, metadata: &mut MetadataBuilder) {
        metadata
            .add("tiff:ImageWidth", self.width.to_string())
            .add("tiff:ImageLength", self.height.to_string())
            .add("image:Format", self.format.as_str());
        for (name, value) in &self.exif {
            metadata.add(format!("exif:{}", name), value.as_str());
        }
    }
}

/// Read dimensions and EXIF data without decoding the pixels.
///
/// # Errors
///
/// `ExtractionFailed` when the format is unknown or the header is corrupt.
pub fn extract_image_metadata(bytes: &[u8]) -> Result<ImageMetadata> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExtractumError::extraction_failed_with_source("Failed to read image format", e))?;

    let format = reader
        .format()
        .ok_or_else(|| ExtractumError::extraction_failed("Could not determine image format"))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ExtractumError::extraction_failed_with_source("Failed to read image dimensions", e))?;

    Ok(ImageMetadata {
        width,
        height,
        format: format!("{:?}", format).to_uppercase(),
        exif: extract_exif_data(bytes),
    })
}

/// Common EXIF tags. Images without EXIF data yield an empty list.
fn extract_exif_data(bytes: &[u8]) -> Vec<(&'static str, String)> {
    let Ok(exif_reader) = Reader::new().read_from_container(&mut Cursor::new(bytes)) else {
        return Vec::new();
    };

    let common_tags = [
        (Tag::Make, "Make"),
        (Tag::Model, "Model"),
        (Tag::DateTime, "DateTime"),
        (Tag::DateTimeOriginal, "DateTimeOriginal"),
        (Tag::Software, "Software"),
        (Tag::Orientation, "Orientation"),
        (Tag::XResolution, "XResolution"),
        (Tag::YResolution, "YResolution"),
        (Tag::ResolutionUnit, "ResolutionUnit"),
        (Tag::GPSLatitude, "GPSLatitude"),
        (Tag::GPSLongitude, "GPSLongitude"),
    ];

    common_tags
        .into_iter()
        .filter_map(|(tag, name)| {
            exif_reader
                .get_field(tag, In::PRIMARY)
                .map(|field| (name, field.display_value().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_extract_png_metadata() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(12, 7))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let metadata = extract_image_metadata(&png).unwrap();
        assert_eq!((metadata.width, metadata.height), (12, 7));
        assert_eq!(metadata.format, "PNG");
        assert!(metadata.exif.is_empty());

        let mut builder = MetadataBuilder::new();
        metadata.add_to(&mut builder);
        let built = builder.build();
        assert_eq!(built.get_value("tiff:ImageWidth"), Some("12"));
        assert_eq!(built.get_value("tiff:ImageLength"), Some("7"));
    }

    #[test]
    fn test_invalid_image() {
        let err = extract_image_metadata(&[0, 1, 2, 3, 4, 5]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ExtractionFailed);
    }
}
