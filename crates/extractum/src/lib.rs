//! Extractum - streaming document content extraction
//!
//! Extractum pulls text (or XHTML markup) and metadata out of PDFs, Word
//! documents, images and plain text files, from a path, a byte buffer or a URL.
//! Output is either materialized into a `String` or handed out incrementally
//! through a [`ContentStream`] whose memory use does not grow with the document.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use extractum::{Extractor, OcrConfig, PdfConfig, PdfOcrStrategy};
//!
//! # fn main() -> extractum::Result<()> {
//! let extractor = Extractor::new()
//!     .set_pdf_config(PdfConfig::new().set_ocr_strategy(PdfOcrStrategy::Auto))
//!     .set_ocr_config(OcrConfig::new().set_language("eng"));
//!
//! let (content, metadata) = extractor.extract_file_to_string("document.pdf")?;
//! println!("{}", content);
//! for (key, value) in &metadata {
//!     println!("{} = {}", key, value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** ([`core`]): the [`Extractor`], configuration, MIME detection, URL fetching
//! - **Stream** ([`stream`]): renders backend events into bytes with length and charset limits
//! - **Plugins** ([`plugins`]): backend, OCR engine and registry contracts
//! - **Extractors** ([`extractors`]): built-in backends for text, PDF, Word and images
//! - **OCR** (`ocr`): Tesseract backend and image preprocessing

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extraction;
pub mod extractors;
pub mod metadata;
pub mod plugins;
pub mod stream;

#[cfg(feature = "ocr")]
pub mod ocr;

#[cfg(feature = "pdf")]
pub mod pdf;

pub use error::{ErrorKind, ExtractumError, Result, error_category, error_message};
pub use metadata::{Metadata, MetadataBuilder};
pub use stream::{ContentStream, DEFAULT_BUFFER_SIZE, StreamState};

pub use core::config::{
    CONFIG_FILE_NAME, Charset, DEFAULT_MAX_LENGTH, ExtractorConfig, OcrConfig, OfficeConfig, OutputFormat, PdfConfig,
    PdfOcrStrategy,
};
pub use core::extractor::{Extractor, TRUNCATED_METADATA_KEY};
pub use core::fetch::{FetchedDocument, UrlFetcher};

pub use core::mime::{DOCX_MIME_TYPE, PDF_MIME_TYPE, PLAIN_TEXT_MIME_TYPE};
