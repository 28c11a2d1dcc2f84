//! Format backend contract.
//!
//! A backend receives the raw document plus the resolved configuration and
//! returns its metadata together with a lazy sequence of [`ContentEvent`]s. The
//! engine turns those events into plain text or markup, applies the output
//! length limit and encodes the result, so backends never deal with output
//! formatting.

use crate::core::config::{OcrConfig, OfficeConfig, PdfConfig};
use crate::metadata::Metadata;
use crate::plugins::{OcrBackend, Plugin};
use crate::{ExtractumError, Result};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One unit of backend output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
    StartPage,
    EndPage,
    StartParagraph,
    EndParagraph,
    /// A run of document text, emitted verbatim.
    Text(String),
    /// Reference to an embedded image. Rendered as `<img>` in markup output only.
    Image { name: String, alt: Option<String> },
}

impl ContentEvent {
    pub fn text(text: impl Into<String>) -> Self {
        ContentEvent::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentEvent::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Lazy producer of content events. Dropping it releases every backend resource.
pub type ContentProducer = Box<dyn Iterator<Item = Result<ContentEvent>> + Send>;

/// Raw document handed to a backend.
pub enum DocumentSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl DocumentSource {
    /// Load the whole document into memory.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            DocumentSource::Path(path) => Ok(std::fs::read(path)?),
            DocumentSource::Bytes(bytes) => Ok(bytes),
        }
    }

    /// Open the document as a sequential reader.
    pub fn into_reader(self) -> Result<Box<dyn Read + Send>> {
        match self {
            DocumentSource::Path(path) => Ok(Box::new(std::fs::File::open(path)?)),
            DocumentSource::Bytes(bytes) => Ok(Box::new(std::io::Cursor::new(bytes))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DocumentSource::Path(path) => Some(path),
            DocumentSource::Bytes(_) => None,
        }
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            DocumentSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Configuration resolved for one extraction.
///
/// Attached configs are used as-is; missing PDF and Office configs fall back to
/// their defaults. `ocr` stays `None` when no OCR config was attached, letting
/// backends tell "OCR requested" apart from "OCR opportunistic".
#[derive(Clone)]
pub struct ExtractionContext {
    pub pdf: PdfConfig,
    pub office: OfficeConfig,
    pub ocr: Option<OcrConfig>,
    pub ocr_backend: Arc<dyn OcrBackend>,
    /// Charset label declared by the transport (e.g. an HTTP `Content-Type` parameter).
    pub declared_charset: Option<String>,
}

impl ExtractionContext {
    /// OCR settings to use, defaults when none were attached.
    pub fn ocr_config(&self) -> OcrConfig {
        self.ocr.clone().unwrap_or_default()
    }

    /// Run the OCR backend, failing with an OCR error when it is not installed.
    pub fn recognize(&self, image: &[u8]) -> Result<String> {
        if !self.ocr_backend.is_available() {
            return Err(ExtractumError::ocr(format!(
                "OCR backend '{}' is not available",
                self.ocr_backend.name()
            )));
        }
        self.ocr_backend.recognize(image, &self.ocr_config())
    }
}

impl fmt::Debug for ExtractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionContext")
            .field("pdf", &self.pdf)
            .field("office", &self.office)
            .field("ocr", &self.ocr)
            .field("ocr_backend", &self.ocr_backend.name())
            .field("declared_charset", &self.declared_charset)
            .finish()
    }
}

/// Backend output: metadata is complete, content is produced on demand.
pub struct ParsedDocument {
    pub metadata: Metadata,
    pub content: ContentProducer,
}

impl ParsedDocument {
    pub fn new(metadata: Metadata, content: impl Iterator<Item = Result<ContentEvent>> + Send + 'static) -> Self {
        Self {
            metadata,
            content: Box::new(content),
        }
    }

    /// Document whose content is known upfront.
    pub fn from_events(metadata: Metadata, events: Vec<ContentEvent>) -> Self {
        Self::new(metadata, events.into_iter().map(Ok))
    }
}

impl fmt::Debug for ParsedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedDocument").field("metadata", &self.metadata).finish_non_exhaustive()
    }
}

/// Trait for format backends.
///
/// The engine selects, for a detected MIME type, the registered backend with the
/// highest [`priority`](DocumentExtractor::priority). Parse failures that can be
/// detected upfront should be reported from [`extract`](DocumentExtractor::extract)
/// itself; the content producer may still fail later with an error item.
///
/// # Example
///
/// ```rust
/// use extractum::plugins::{ContentEvent, DocumentExtractor, DocumentSource, ExtractionContext, ParsedDocument, Plugin};
/// use extractum::{MetadataBuilder, Result};
///
/// struct Rot13Extractor;
///
/// impl Plugin for Rot13Extractor {
///     fn name(&self) -> &str { "rot13" }
///     fn version(&self) -> String { "1.0.0".to_string() }
/// }
///
/// impl DocumentExtractor for Rot13Extractor {
///     fn supported_mime_types(&self) -> &[&str] {
///         &["text/x-rot13"]
///     }
///
///     fn extract(&self, source: DocumentSource, _mime: &str, _ctx: &ExtractionContext) -> Result<ParsedDocument> {
///         let bytes = source.into_bytes()?;
///         let text: String = bytes.iter().map(|b| match b {
///             b'a'..=b'z' => (((b - b'a') + 13) % 26 + b'a') as char,
///             b'A'..=b'Z' => (((b - b'A') + 13) % 26 + b'A') as char,
///             other => *other as char,
///         }).collect();
///         Ok(ParsedDocument::from_events(MetadataBuilder::new().build(), vec![ContentEvent::Text(text)]))
///     }
/// }
/// ```
pub trait DocumentExtractor: Plugin {
    /// MIME types handled by this backend. A trailing `/*` matches a whole family.
    fn supported_mime_types(&self) -> &[&str];

    /// Higher wins when several backends claim a MIME type.
    fn priority(&self) -> i32 {
        50
    }

    fn extract(&self, source: DocumentSource, mime_type: &str, ctx: &ExtractionContext) -> Result<ParsedDocument>;
}
