//! Built-in document extractors.
//!
//! Every extractor implements [`DocumentExtractor`] and is registered by
//! [`DocumentExtractorRegistry::with_defaults`](crate::plugins::DocumentExtractorRegistry::with_defaults).

use crate::plugins::DocumentExtractor;
use std::sync::Arc;

pub mod text;

#[cfg(feature = "office")]
pub mod docx;

#[cfg(feature = "image")]
pub mod image;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use text::PlainTextExtractor;

#[cfg(feature = "office")]
pub use docx::DocxExtractor;

#[cfg(feature = "image")]
pub use image::ImageExtractor;

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;

/// Every extractor compiled into the crate.
pub fn default_extractors() -> Vec<Arc<dyn DocumentExtractor>> {
    let mut extractors: Vec<Arc<dyn DocumentExtractor>> = vec![Arc::new(PlainTextExtractor::new())];

    #[cfg(feature = "office")]
    extractors.push(Arc::new(DocxExtractor::new()));

    #[cfg(feature = "image")]
    extractors.push(Arc::new(ImageExtractor::new()));

    #[cfg(feature = "pdf")]
    extractors.push(Arc::new(PdfExtractor::new()));

    extractors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::DocumentExtractorRegistry;

    #[test]
    fn test_default_extractors_have_unique_names() {
        let extractors = default_extractors();
        let mut names: Vec<&str> = extractors.iter().map(|e| e.name()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_default_registry_covers_builtin_formats() {
        let registry = DocumentExtractorRegistry::with_defaults();
        assert_eq!(registry.get("text/plain").unwrap().name(), "plain-text-extractor");
        assert!(registry.supports("text/markdown"));

        #[cfg(feature = "pdf")]
        assert_eq!(registry.get("application/pdf").unwrap().name(), "pdf-extractor");

        #[cfg(feature = "office")]
        assert_eq!(
            registry.get(crate::core::mime::DOCM_MIME_TYPE).unwrap().name(),
            "docx-extractor"
        );

        #[cfg(feature = "image")]
        assert_eq!(registry.get("image/tiff").unwrap().name(), "image-extractor");
    }
}
