//! Image extractor.
//!
//! Supports: PNG, JPEG, WebP, BMP, TIFF, GIF.

use crate::Result;
use crate::core::mime::IMAGE_MIME_TYPES;
use crate::extraction::image::extract_image_metadata;
use crate::metadata::MetadataBuilder;
use crate::plugins::{ContentEvent, DocumentExtractor, DocumentSource, ExtractionContext, ParsedDocument, Plugin};

/// Image extractor.
///
/// Metadata carries dimensions, format and EXIF tags. Content is OCR text:
/// when an [`OcrConfig`](crate::OcrConfig) is attached recognition is required
/// and its failures are reported; otherwise OCR runs only if an engine is
/// available and failures leave the content empty.
pub struct ImageExtractor;

impl ImageExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ImageExtractor {
    fn name(&self) -> &str {
        "image-extractor"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn description(&self) -> &str {
        "Extracts dimensions and EXIF data from images, with OCR text when available"
    }
}

impl DocumentExtractor for ImageExtractor {
    fn supported_mime_types(&self) -> &[&str] {
        IMAGE_MIME_TYPES
    }

    fn priority(&self) -> i32 {
        50
    }

    #[tracing::instrument(skip(self, source, ctx), fields(extractor.name = self.name()))]
    fn extract(&self, source: DocumentSource, mime_type: &str, ctx: &ExtractionContext) -> Result<ParsedDocument> {
        let bytes = source.into_bytes()?;
        let image_metadata = extract_image_metadata(&bytes)?;

        let mut metadata = MetadataBuilder::new();
        metadata.add("Content-Type", mime_type);
        image_metadata.add_to(&mut metadata);

        let required = ctx.ocr.is_some();
        if !required && !ctx.ocr_backend.is_available() {
            tracing::debug!("no OCR engine available, image content left empty");
            return Ok(ParsedDocument::from_events(metadata.build(), Vec::new()));
        }

        let ctx = ctx.clone();
        let content = std::iter::once_with(move || match ctx.recognize(&bytes) {
            Ok(text) => Ok(text),
            Err(e) if !required => {
                tracing::warn!(error = %e, "opportunistic OCR failed, image content left empty");
                Ok(String::new())
            }
            Err(e) => Err(e),
        })
        .flat_map(|recognized| {
            let events = match recognized {
                Ok(text) if text.trim().is_empty() => Vec::new(),
                Ok(text) => vec![
                    Ok(ContentEvent::StartParagraph),
                    Ok(ContentEvent::Text(text)),
                    Ok(ContentEvent::EndParagraph),
                ],
                Err(e) => vec![Err(e)],
            };
            events.into_iter()
        });

        Ok(ParsedDocument::new(metadata.build(), content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{OcrConfig, OfficeConfig, PdfConfig};
    use crate::plugins::{NoOcrBackend, OcrBackend};
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;
    use std::sync::Arc;

    struct FixedOcr(&'static str);

    impl Plugin for FixedOcr {
        fn name(&self) -> &str {
            "fixed-ocr"
        }
        fn version(&self) -> String {
            "1.0.0".to_string()
        }
    }

    impl OcrBackend for FixedOcr {
        fn is_available(&self) -> bool {
            true
        }
        fn recognize(&self, _image: &[u8], _config: &OcrConfig) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(3, 2))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn context(ocr: Option<OcrConfig>, backend: Arc<dyn OcrBackend>) -> ExtractionContext {
        ExtractionContext {
            pdf: PdfConfig::default(),
            office: OfficeConfig::default(),
            ocr,
            ocr_backend: backend,
            declared_charset: None,
        }
    }

    fn extract(ctx: &ExtractionContext) -> Result<(Vec<ContentEvent>, crate::Metadata)> {
        let doc = ImageExtractor::new().extract(DocumentSource::Bytes(png()), "image/png", ctx)?;
        let events = doc.content.collect::<Result<Vec<_>>>()?;
        Ok((events, doc.metadata))
    }

    #[test]
    fn test_without_engine_content_is_empty() {
        let (events, metadata) = extract(&context(None, Arc::new(NoOcrBackend))).unwrap();
        assert!(events.is_empty());
        assert_eq!(metadata.get_value("tiff:ImageWidth"), Some("3"));
        assert_eq!(metadata.get_value("Content-Type"), Some("image/png"));
    }

    #[test]
    fn test_opportunistic_ocr() {
        let (events, _) = extract(&context(None, Arc::new(FixedOcr("scanned text")))).unwrap();
        assert_eq!(
            events,
            vec![
                ContentEvent::StartParagraph,
                ContentEvent::text("scanned text"),
                ContentEvent::EndParagraph
            ]
        );
    }

    #[test]
    fn test_attached_ocr_config_requires_engine() {
        let err = extract(&context(Some(OcrConfig::default()), Arc::new(NoOcrBackend))).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OcrFailed);
    }

    #[test]
    fn test_invalid_image() {
        let err = ImageExtractor::new()
            .extract(
                DocumentSource::Bytes(vec![0, 1, 2, 3, 4, 5]),
                "image/png",
                &context(None, Arc::new(NoOcrBackend)),
            )
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ExtractionFailed);
    }

    #[test]
    fn test_image_plugin_interface() {
        let extractor = ImageExtractor::new();
        assert_eq!(extractor.name(), "image-extractor");
        assert!(extractor.supported_mime_types().contains(&"image/png"));
        assert!(extractor.supported_mime_types().contains(&"image/webp"));
        assert_eq!(extractor.priority(), 50);
    }
}
