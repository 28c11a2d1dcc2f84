//! Plugin system.
//!
//! Format backends implement [`DocumentExtractor`], OCR engines implement
//! [`OcrBackend`]; both build on [`Plugin`].

mod extractor;
mod ocr;
pub mod registry;
mod traits;

pub use extractor::{ContentEvent, ContentProducer, DocumentExtractor, DocumentSource, ExtractionContext, ParsedDocument};
pub use ocr::{NoOcrBackend, OcrBackend};
pub use registry::DocumentExtractorRegistry;
pub use traits::Plugin;
