//! Main extraction entry points.
//!
//! An [`Extractor`] is an immutable value: every setter consumes it and returns
//! the updated extractor, and extraction only borrows it. Cloning is cheap
//! (backends, OCR engine and URL fetcher are shared `Arc`s), so one configured
//! extractor can be cloned into as many threads as needed.
//!
//! # Entry points
//!
//! | source | to-string | to-stream |
//! |--------|-----------|-----------|
//! | path   | [`Extractor::extract_file_to_string`] | [`Extractor::extract_file`] |
//! | bytes  | [`Extractor::extract_bytes_to_string`] | [`Extractor::extract_bytes`] |
//! | URL    | [`Extractor::extract_url_to_string`] | [`Extractor::extract_url`] |
//!
//! Every entry point validates its argument and the attached configuration,
//! reads or fetches the source, detects the MIME type, selects the
//! highest-priority backend and hands it the resolved configuration. Content
//! and metadata are returned together or not at all.

use crate::core::config::{Charset, ExtractorConfig, OcrConfig, OfficeConfig, OutputFormat, PdfConfig};
use crate::core::fetch::{UrlFetcher, default_fetcher, url_file_name};
use crate::core::{io, mime};
use crate::metadata::Metadata;
use crate::plugins::{
    DocumentExtractor, DocumentExtractorRegistry, DocumentSource, ExtractionContext, OcrBackend, ParsedDocument,
};
use crate::stream::{ContentStream, RenderSettings, decode};
use crate::{ExtractumError, Result};
use once_cell::sync::Lazy;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Metadata key set on to-string results whose content was clipped.
pub const TRUNCATED_METADATA_KEY: &str = "X-Extractum:content_truncated";

static DEFAULT_REGISTRY: Lazy<Arc<DocumentExtractorRegistry>> =
    Lazy::new(|| Arc::new(DocumentExtractorRegistry::with_defaults()));

fn default_ocr_backend() -> Arc<dyn OcrBackend> {
    #[cfg(feature = "ocr")]
    {
        Arc::new(crate::ocr::TesseractBackend::new())
    }
    #[cfg(not(feature = "ocr"))]
    {
        Arc::new(crate::plugins::NoOcrBackend)
    }
}

/// Document extraction engine.
///
/// # Example
///
/// ```rust,no_run
/// use extractum::{Charset, Extractor, PdfConfig, PdfOcrStrategy};
///
/// # fn main() -> extractum::Result<()> {
/// let extractor = Extractor::new()
///     .set_extract_string_max_length(1_000_000)
///     .set_encoding(Charset::Utf8)
///     .set_pdf_config(PdfConfig::new().set_ocr_strategy(PdfOcrStrategy::Auto));
///
/// let (content, metadata) = extractor.extract_file_to_string("report.pdf")?;
/// println!("{} ({} metadata entries)", content, metadata.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Extractor {
    max_length: usize,
    encoding: Charset,
    output_format: OutputFormat,
    pdf: Option<PdfConfig>,
    office: Option<OfficeConfig>,
    ocr: Option<OcrConfig>,
    registry: Arc<DocumentExtractorRegistry>,
    ocr_backend: Arc<dyn OcrBackend>,
    fetcher: Arc<dyn UrlFetcher>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Extractor with default settings and every built-in backend.
    pub fn new() -> Self {
        Self {
            max_length: crate::core::config::DEFAULT_MAX_LENGTH,
            encoding: Charset::default(),
            output_format: OutputFormat::default(),
            pdf: None,
            office: None,
            ocr: None,
            registry: Arc::clone(&DEFAULT_REGISTRY),
            ocr_backend: default_ocr_backend(),
            fetcher: default_fetcher(),
        }
    }

    /// Build an extractor from a loaded configuration file.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when the OCR settings are inconsistent.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        config.validate()?;
        let mut extractor = Self::new()
            .set_extract_string_max_length(config.max_length)
            .set_encoding(config.encoding)
            .set_output_format(config.output_format);
        extractor.pdf = config.pdf.clone();
        extractor.office = config.office.clone();
        extractor.ocr = config.ocr.clone();
        Ok(extractor)
    }

    /// Serializable snapshot of the current settings.
    pub fn config(&self) -> ExtractorConfig {
        ExtractorConfig {
            max_length: self.max_length,
            encoding: self.encoding,
            output_format: self.output_format,
            pdf: self.pdf.clone(),
            office: self.office.clone(),
            ocr: self.ocr.clone(),
        }
    }

    /// Attach a PDF config, replacing any previous one.
    pub fn set_pdf_config(mut self, config: PdfConfig) -> Self {
        self.pdf = Some(config);
        self
    }

    /// Attach an Office config, replacing any previous one.
    pub fn set_office_config(mut self, config: OfficeConfig) -> Self {
        self.office = Some(config);
        self
    }

    /// Attach an OCR config, replacing any previous one. With an OCR config
    /// attached, image OCR becomes mandatory and its failures are reported.
    pub fn set_ocr_config(mut self, config: OcrConfig) -> Self {
        self.ocr = Some(config);
        self
    }

    /// Maximum number of characters of document text in the output.
    pub fn set_extract_string_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn set_encoding(mut self, encoding: Charset) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn set_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Shorthand for [`OutputFormat::Markup`] (`true`) or [`OutputFormat::PlainText`].
    pub fn set_xml_output(self, xml: bool) -> Self {
        self.set_output_format(if xml { OutputFormat::Markup } else { OutputFormat::PlainText })
    }

    /// Replace the OCR engine.
    pub fn with_ocr_backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.ocr_backend = backend;
        self
    }

    /// Replace the URL fetcher.
    pub fn with_url_fetcher(mut self, fetcher: Arc<dyn UrlFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Register an additional backend on this extractor only.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty or whitespace-containing backend name, or
    /// whatever the backend's `initialize` hook reports.
    pub fn register_backend(mut self, backend: Arc<dyn DocumentExtractor>) -> Result<Self> {
        Arc::make_mut(&mut self.registry).register(backend)?;
        Ok(self)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
    pub fn encoding(&self) -> Charset {
        self.encoding
    }
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }
    pub fn pdf_config(&self) -> Option<&PdfConfig> {
        self.pdf.as_ref()
    }
    pub fn office_config(&self) -> Option<&OfficeConfig> {
        self.office.as_ref()
    }
    pub fn ocr_config(&self) -> Option<&OcrConfig> {
        self.ocr.as_ref()
    }

    /// Names of the registered backends.
    pub fn backends(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Check the attached configuration. Runs before every extraction.
    pub fn validate(&self) -> Result<()> {
        if let Some(ocr) = &self.ocr {
            ocr.validate()?;
        }
        Ok(())
    }

    /// Stream the content of a file.
    #[tracing::instrument(skip(self, path), fields(extraction.path = %path.as_ref().display()))]
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Result<(ContentStream, Metadata)> {
        let parsed = self.parse_file(path.as_ref())?;
        Ok(self.stream(parsed))
    }

    /// Extract the content of a file into a string.
    #[tracing::instrument(skip(self, path), fields(extraction.path = %path.as_ref().display()))]
    pub fn extract_file_to_string(&self, path: impl AsRef<Path>) -> Result<(String, Metadata)> {
        let parsed = self.parse_file(path.as_ref())?;
        self.materialize(parsed)
    }

    /// Stream the content of an in-memory document.
    #[tracing::instrument(skip(self, content), fields(extraction.size_bytes = content.len()))]
    pub fn extract_bytes(&self, content: &[u8]) -> Result<(ContentStream, Metadata)> {
        let parsed = self.parse_bytes(content)?;
        Ok(self.stream(parsed))
    }

    /// Extract the content of an in-memory document into a string.
    #[tracing::instrument(skip(self, content), fields(extraction.size_bytes = content.len()))]
    pub fn extract_bytes_to_string(&self, content: &[u8]) -> Result<(String, Metadata)> {
        let parsed = self.parse_bytes(content)?;
        self.materialize(parsed)
    }

    /// Stream the content of the document behind a URL.
    #[tracing::instrument(skip(self), fields(extraction.url = url))]
    pub fn extract_url(&self, url: &str) -> Result<(ContentStream, Metadata)> {
        let parsed = self.parse_url(url)?;
        Ok(self.stream(parsed))
    }

    /// Extract the content of the document behind a URL into a string.
    #[tracing::instrument(skip(self), fields(extraction.url = url))]
    pub fn extract_url_to_string(&self, url: &str) -> Result<(String, Metadata)> {
        let parsed = self.parse_url(url)?;
        self.materialize(parsed)
    }

    fn parse_file(&self, path: &Path) -> Result<ParsedDocument> {
        if path.as_os_str().is_empty() {
            return Err(ExtractumError::invalid_argument("File path must not be empty"));
        }
        self.validate()?;
        io::validate_file_exists(path)?;

        let supported = |mime_type: &str| self.registry.supports(mime_type);
        let mime_type = mime::detect_for_file(path, None, &supported)?;
        self.dispatch(DocumentSource::Path(path.to_path_buf()), &mime_type, None)
    }

    fn parse_bytes(&self, content: &[u8]) -> Result<ParsedDocument> {
        if content.is_empty() {
            return Err(ExtractumError::invalid_argument("Input buffer must not be empty"));
        }
        self.validate()?;

        let supported = |mime_type: &str| self.registry.supports(mime_type);
        let mime_type = mime::detect_for_bytes(content, None, None, &supported)?;
        self.dispatch(DocumentSource::Bytes(content.to_vec()), &mime_type, None)
    }

    fn parse_url(&self, url: &str) -> Result<ParsedDocument> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ExtractumError::invalid_argument("URL must not be empty"));
        }
        self.validate()?;

        let fetched = self.fetcher.fetch(url)?;
        let name = url_file_name(&fetched.final_url);
        let declared = fetched.content_type.as_deref();
        let supported = |mime_type: &str| self.registry.supports(mime_type);
        let mime_type = mime::detect_for_bytes(&fetched.bytes, name.as_deref(), declared, &supported)?;
        let charset = declared.and_then(mime::charset_parameter);
        self.dispatch(DocumentSource::Bytes(fetched.bytes), &mime_type, charset)
    }

    fn dispatch(&self, source: DocumentSource, mime_type: &str, declared_charset: Option<String>) -> Result<ParsedDocument> {
        let backend = self.registry.get(mime_type)?;
        tracing::debug!(mime_type, backend = backend.name(), "selected backend");

        let ctx = ExtractionContext {
            pdf: self.pdf.clone().unwrap_or_default(),
            office: self.office.clone().unwrap_or_default(),
            ocr: self.ocr.clone(),
            ocr_backend: Arc::clone(&self.ocr_backend),
            declared_charset,
        };
        backend.extract(source, mime_type, &ctx)
    }

    fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            format: self.output_format,
            max_length: self.max_length,
            charset: self.encoding,
        }
    }

    fn stream(&self, parsed: ParsedDocument) -> (ContentStream, Metadata) {
        let stream = ContentStream::new(parsed.content, &parsed.metadata, self.render_settings());
        (stream, parsed.metadata)
    }

    fn materialize(&self, parsed: ParsedDocument) -> Result<(String, Metadata)> {
        let (mut stream, mut metadata) = self.stream(parsed);
        let bytes = stream.read_all().map_err(crate::stream::backend_failure)?;
        let content = decode(bytes, self.encoding)?;
        if stream.is_truncated() {
            tracing::debug!(max_length = self.max_length, "output truncated");
            metadata.insert(TRUNCATED_METADATA_KEY, "true");
        }
        Ok((content, metadata))
    }
}

#[cfg(feature = "tokio-runtime")]
impl Extractor {
    async fn run_blocking<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Extractor) -> Result<T> + Send + 'static,
    {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || task(extractor))
            .await
            .map_err(|e| ExtractumError::extraction_failed_with_source("Extraction task failed", e))?
    }

    /// [`Extractor::extract_file`] on tokio's blocking pool.
    pub async fn extract_file_async(&self, path: impl AsRef<Path>) -> Result<(ContentStream, Metadata)> {
        let path = path.as_ref().to_path_buf();
        self.run_blocking(move |extractor| extractor.extract_file(path)).await
    }

    /// [`Extractor::extract_file_to_string`] on tokio's blocking pool.
    pub async fn extract_file_to_string_async(&self, path: impl AsRef<Path>) -> Result<(String, Metadata)> {
        let path = path.as_ref().to_path_buf();
        self.run_blocking(move |extractor| extractor.extract_file_to_string(path)).await
    }

    /// [`Extractor::extract_bytes`] on tokio's blocking pool.
    pub async fn extract_bytes_async(&self, content: Vec<u8>) -> Result<(ContentStream, Metadata)> {
        self.run_blocking(move |extractor| extractor.extract_bytes(&content)).await
    }

    /// [`Extractor::extract_bytes_to_string`] on tokio's blocking pool.
    pub async fn extract_bytes_to_string_async(&self, content: Vec<u8>) -> Result<(String, Metadata)> {
        self.run_blocking(move |extractor| extractor.extract_bytes_to_string(&content)).await
    }

    /// [`Extractor::extract_url`] on tokio's blocking pool.
    pub async fn extract_url_async(&self, url: &str) -> Result<(ContentStream, Metadata)> {
        let url = url.to_string();
        self.run_blocking(move |extractor| extractor.extract_url(&url)).await
    }

    /// [`Extractor::extract_url_to_string`] on tokio's blocking pool.
    pub async fn extract_url_to_string_async(&self, url: &str) -> Result<(String, Metadata)> {
        let url = url.to_string();
        self.run_blocking(move |extractor| extractor.extract_url_to_string(&url)).await
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("max_length", &self.max_length)
            .field("encoding", &self.encoding)
            .field("output_format", &self.output_format)
            .field("pdf", &self.pdf)
            .field("office", &self.office)
            .field("ocr", &self.ocr)
            .field("backends", &self.registry.list())
            .field("ocr_backend", &self.ocr_backend.name())
            .finish_non_exhaustive()
    }
}
