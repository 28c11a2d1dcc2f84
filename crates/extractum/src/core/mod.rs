//! Core extraction orchestration.
//!
//! - **Entry points** ([`extractor`]): the [`Extractor`] and its six
//!   path/bytes/URL × string/stream operations
//! - **Configuration** ([`config`]): per-format configs and configuration files
//! - **MIME detection** ([`mime`]): extension, declared type and content sniffing
//! - **Remote sources** ([`fetch`]): the [`UrlFetcher`] seam
//! - **I/O** ([`io`]): file validation helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use extractum::core::extractor::Extractor;
//!
//! # fn example() -> extractum::Result<()> {
//! let (content, metadata) = Extractor::new().extract_file_to_string("document.pdf")?;
//! println!("{} characters, {} metadata entries", content.chars().count(), metadata.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod extractor;
pub mod fetch;
pub mod io;
pub mod mime;

pub use config::{Charset, ExtractorConfig, OcrConfig, OfficeConfig, OutputFormat, PdfConfig, PdfOcrStrategy};
pub use extractor::{Extractor, TRUNCATED_METADATA_KEY};
pub use fetch::{FetchedDocument, FileFetcher, UrlFetcher};

#[cfg(feature = "url")]
pub use fetch::HttpFetcher;
