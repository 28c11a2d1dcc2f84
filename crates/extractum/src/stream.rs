//! Pull-based content stream.
//!
//! A [`ContentStream`] adapts a backend's lazy [`ContentEvent`] producer into
//! bytes: events are rendered as plain text or XHTML, clipped to the configured
//! maximum length, encoded in the target charset and handed out through
//! [`ContentStream::read`], [`ContentStream::read_full`] and
//! [`ContentStream::read_all`] (and `std::io::Read`).
//!
//! The stream is forward-only and single-consumer. It moves from
//! [`StreamState::Open`] to [`StreamState::Exhausted`] once every byte has been
//! handed out, or to [`StreamState::Errored`] when the producer fails. Every
//! failed read reports `ErrorKind::Io`; a backend failure is kept as the
//! source of that error. Dropping
//! the stream drops the producer, which releases backend resources
//! (temporary OCR files, decoders) immediately.

use crate::core::config::{Charset, OutputFormat};
use crate::metadata::Metadata;
use crate::plugins::{ContentEvent, ContentProducer};
use crate::{ExtractumError, Result};
use quick_xml::escape::escape;
use std::fmt;

/// Default chunk size used by callers that have no better idea.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Lifecycle state of a [`ContentStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Exhausted,
    Errored,
}

/// Output settings applied while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RenderSettings {
    pub format: OutputFormat,
    pub max_length: usize,
    pub charset: Charset,
}

/// Forward-only byte source over extracted content.
///
/// ```rust,no_run
/// use extractum::Extractor;
///
/// let (mut stream, _metadata) = Extractor::new().extract_file("notes.txt")?;
/// let mut buf = [0u8; 4096];
/// loop {
///     let n = stream.read(&mut buf)?;
///     if n == 0 {
///         break;
///     }
///     // process &buf[..n]
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ContentStream {
    producer: Option<ContentProducer>,
    renderer: Renderer,
    charset: Charset,
    pending: Vec<u8>,
    position: usize,
    state: StreamState,
}

impl ContentStream {
    pub(crate) fn new(producer: ContentProducer, metadata: &Metadata, settings: RenderSettings) -> Self {
        Self {
            producer: Some(producer),
            renderer: Renderer::new(settings.format, settings.max_length, metadata),
            charset: settings.charset,
            pending: Vec::new(),
            position: 0,
            state: StreamState::Open,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Whether output was clipped at the configured maximum length.
    ///
    /// Only final once the stream is exhausted: clipping is detected when the
    /// first character past the limit shows up, so a document producing exactly
    /// the limit is never reported as truncated.
    pub fn is_truncated(&self) -> bool {
        self.renderer.truncated
    }

    /// Best-effort read into `buf`.
    ///
    /// Returns the number of bytes written, which may be less than `buf.len()`
    /// even when more data follows. `Ok(0)` means the stream is exhausted (or
    /// `buf` is empty) and is returned again on every later call.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check_readable()?;
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.fill()? {
            return Ok(0);
        }
        let available = &self.pending[self.position..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }

    /// Read until `buf` is full or the stream is exhausted.
    ///
    /// Reaching the end of the stream before `buf` is full is **not** an error:
    /// the short count is returned with `Ok`. Callers framing fixed-size records
    /// must compare the returned count with `buf.len()` themselves.
    pub fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Drain the rest of the stream into one buffer.
    ///
    /// Holds the entire remaining output in memory; use [`ContentStream::read`]
    /// for large documents.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while self.fill()? {
            let chunk = &self.pending[self.position..];
            out.try_reserve(chunk.len()).map_err(|e| {
                ExtractumError::OutOfMemory(format!(
                    "Failed to grow output buffer beyond {} bytes: {}",
                    out.len(),
                    e
                ))
            })?;
            out.extend_from_slice(chunk);
            self.position = self.pending.len();
        }
        Ok(out)
    }

    fn check_readable(&self) -> Result<()> {
        if self.state == StreamState::Errored {
            return Err(ExtractumError::io("Content stream is in an errored state"));
        }
        Ok(())
    }

    /// Make sure unread bytes are pending. Returns `false` once exhausted.
    fn fill(&mut self) -> Result<bool> {
        self.check_readable()?;
        let mut rendered = String::new();
        while self.position >= self.pending.len() {
            if self.state == StreamState::Exhausted {
                return Ok(false);
            }
            self.pending.clear();
            self.position = 0;
            rendered.clear();

            match self.producer.as_mut().map(|producer| producer.next()) {
                Some(Some(Ok(event))) => {
                    if !self.renderer.render(event, &mut rendered) {
                        self.producer = None;
                    }
                }
                Some(Some(Err(e))) => {
                    tracing::debug!("content producer failed: {}", e);
                    self.producer = None;
                    self.state = StreamState::Errored;
                    return Err(read_failure(e));
                }
                Some(None) => {
                    self.producer = None;
                }
                None => {
                    self.renderer.finish(&mut rendered);
                    self.state = StreamState::Exhausted;
                }
            }

            encode_into(&rendered, self.charset, &mut self.pending);
        }
        Ok(true)
    }
}

/// Report a producer failure as a stream I/O error with the failure as source.
fn read_failure(err: ExtractumError) -> ExtractumError {
    match err {
        ExtractumError::Io(_) => err,
        other => ExtractumError::Io(std::io::Error::other(other)),
    }
}

/// Recover the backend failure behind a stream read error.
///
/// Whole-document extraction reports what the backend reported rather than
/// the stream's I/O classification.
pub(crate) fn backend_failure(err: ExtractumError) -> ExtractumError {
    match err {
        ExtractumError::Io(io) if io.get_ref().is_some_and(|inner| inner.is::<ExtractumError>()) => {
            match io.into_inner().map(|inner| inner.downcast::<ExtractumError>()) {
                Some(Ok(original)) => *original,
                Some(Err(inner)) => ExtractumError::Io(std::io::Error::other(inner)),
                None => ExtractumError::io("Content stream failed"),
            }
        }
        other => other,
    }
}

impl std::io::Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        ContentStream::read(self, buf).map_err(|e| match e {
            ExtractumError::Io(io) => io,
            other => std::io::Error::other(other),
        })
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("state", &self.state)
            .field("charset", &self.charset)
            .field("truncated", &self.renderer.truncated)
            .finish_non_exhaustive()
    }
}

/// Encode rendered text in the target charset.
pub(crate) fn encode_into(text: &str, charset: Charset, out: &mut Vec<u8>) {
    match charset {
        Charset::Utf8 => out.extend_from_slice(text.as_bytes()),
        Charset::UsAscii => out.extend(text.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' })),
        Charset::Utf16Be => {
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
        }
    }
}

/// Decode bytes produced by [`encode_into`] back into text.
pub(crate) fn decode(bytes: Vec<u8>, charset: Charset) -> Result<String> {
    match charset {
        Charset::Utf8 | Charset::UsAscii => String::from_utf8(bytes)
            .map_err(|e| ExtractumError::extraction_failed_with_source("Rendered output is not valid text", e)),
        Charset::Utf16Be => {
            let (text, had_errors) = encoding_rs::UTF_16BE.decode_without_bom_handling(&bytes);
            if had_errors {
                return Err(ExtractumError::extraction_failed("Rendered output is not valid UTF-16BE"));
            }
            Ok(text.into_owned())
        }
    }
}

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Turns content events into text, enforcing the character budget.
struct Renderer {
    format: OutputFormat,
    remaining: usize,
    truncated: bool,
    head: Option<String>,
    open: Vec<&'static str>,
}

impl Renderer {
    fn new(format: OutputFormat, max_length: usize, metadata: &Metadata) -> Self {
        let head = match format {
            OutputFormat::PlainText => None,
            OutputFormat::Markup => Some(markup_head(metadata)),
        };
        Self {
            format,
            remaining: max_length,
            truncated: false,
            head,
            open: Vec::new(),
        }
    }

    /// Render one event. Returns `false` once the budget is exceeded and no
    /// further events are wanted.
    fn render(&mut self, event: ContentEvent, out: &mut String) -> bool {
        if let Some(head) = self.head.take() {
            out.push_str(&head);
        }
        match self.format {
            OutputFormat::PlainText => self.render_plain(event, out),
            OutputFormat::Markup => self.render_markup(event, out),
        }
    }

    fn render_plain(&mut self, event: ContentEvent, out: &mut String) -> bool {
        match event {
            ContentEvent::Text(text) => self.push_clipped(&text, out, |s, out| out.push_str(s)),
            ContentEvent::EndParagraph | ContentEvent::EndPage => {
                self.push_clipped("\n", out, |s, out| out.push_str(s))
            }
            ContentEvent::StartPage | ContentEvent::StartParagraph | ContentEvent::Image { .. } => true,
        }
    }

    fn render_markup(&mut self, event: ContentEvent, out: &mut String) -> bool {
        match event {
            ContentEvent::Text(text) => self.push_clipped(&text, out, |s, out| out.push_str(&escape(s))),
            ContentEvent::StartPage => {
                out.push_str("<div class=\"page\">");
                self.open.push("</div>");
                true
            }
            ContentEvent::StartParagraph => {
                out.push_str("<p>");
                self.open.push("</p>");
                true
            }
            ContentEvent::EndPage | ContentEvent::EndParagraph => {
                if let Some(close) = self.open.pop() {
                    out.push_str(close);
                }
                true
            }
            ContentEvent::Image { name, alt } => {
                out.push_str("<img src=\"embedded:");
                out.push_str(&escape(name.as_str()));
                out.push_str("\" alt=\"");
                out.push_str(&escape(alt.as_deref().unwrap_or(name.as_str())));
                out.push_str("\"/>");
                true
            }
        }
    }

    /// Emit as much of `text` as the budget allows.
    fn push_clipped(&mut self, text: &str, out: &mut String, emit: impl Fn(&str, &mut String)) -> bool {
        if text.is_empty() {
            return true;
        }
        let char_count = text.chars().count();
        if char_count <= self.remaining {
            self.remaining -= char_count;
            emit(text, out);
            return true;
        }
        let cut = text.char_indices().nth(self.remaining).map_or(text.len(), |(i, _)| i);
        emit(&text[..cut], out);
        self.remaining = 0;
        self.truncated = true;
        false
    }

    fn finish(&mut self, out: &mut String) {
        if let Some(head) = self.head.take() {
            out.push_str(&head);
        }
        if self.format == OutputFormat::Markup {
            while let Some(close) = self.open.pop() {
                out.push_str(close);
            }
            out.push_str("</body></html>");
        }
    }
}

fn markup_head(metadata: &Metadata) -> String {
    let mut head = format!("<html xmlns=\"{}\"><head>", XHTML_NAMESPACE);
    for (key, value) in metadata.iter() {
        head.push_str("<meta name=\"");
        head.push_str(&escape(key));
        head.push_str("\" content=\"");
        head.push_str(&escape(value));
        head.push_str("\"/>");
    }
    if let Some(title) = metadata.get_value("dc:title") {
        head.push_str("<title>");
        head.push_str(&escape(title));
        head.push_str("</title>");
    }
    head.push_str("</head><body>");
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataBuilder;

    fn stream_of(events: Vec<ContentEvent>, format: OutputFormat, max_length: usize, charset: Charset) -> ContentStream {
        let producer: ContentProducer = Box::new(events.into_iter().map(Ok::<_, ExtractumError>));
        ContentStream::new(
            producer,
            &Metadata::default(),
            RenderSettings {
                format,
                max_length,
                charset,
            },
        )
    }

    fn plain(events: Vec<ContentEvent>) -> ContentStream {
        stream_of(events, OutputFormat::PlainText, usize::MAX, Charset::Utf8)
    }

    #[test]
    fn test_read_exhausts_idempotently() {
        let mut stream = plain(vec![ContentEvent::text("hello")]);
        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"hello");
        for _ in 0..3 {
            assert_eq!(stream.read(&mut buf).unwrap(), 0);
        }
        assert_eq!(stream.state(), StreamState::Exhausted);
    }

    #[test]
    fn test_empty_buffer_read_returns_zero_without_consuming() {
        let mut stream = plain(vec![ContentEvent::text("abc")]);
        assert_eq!(stream.read(&mut []).unwrap(), 0);
        assert_eq!(stream.state(), StreamState::Open);
        assert_eq!(stream.read_all().unwrap(), b"abc");
    }

    #[test]
    fn test_read_full_short_count_at_end_is_success() {
        let mut stream = plain(vec![ContentEvent::text("ab"), ContentEvent::text("cde")]);
        let mut buf = [0u8; 4];
        assert_eq!(stream.read_full(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(stream.read_full(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'e');
        assert_eq!(stream.read_full(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_mixed_reads_never_duplicate_bytes() {
        let events: Vec<_> = (0..50).map(|i| ContentEvent::text(format!("chunk{:02};", i))).collect();
        let expected: String = (0..50).map(|i| format!("chunk{:02};", i)).collect();

        let mut stream = plain(events);
        let mut collected = Vec::new();
        let mut small = [0u8; 3];
        let n = stream.read(&mut small).unwrap();
        collected.extend_from_slice(&small[..n]);
        let mut exact = [0u8; 17];
        let n = stream.read_full(&mut exact).unwrap();
        collected.extend_from_slice(&exact[..n]);
        collected.extend(stream.read_all().unwrap());

        assert_eq!(String::from_utf8(collected).unwrap(), expected);
    }

    #[test]
    fn test_plain_paragraph_and_page_breaks() {
        let mut stream = plain(vec![
            ContentEvent::StartPage,
            ContentEvent::StartParagraph,
            ContentEvent::text("one"),
            ContentEvent::EndParagraph,
            ContentEvent::Image {
                name: "img0.png".into(),
                alt: None,
            },
            ContentEvent::EndPage,
        ]);
        assert_eq!(stream.read_all().unwrap(), b"one\n\n");
    }

    #[test]
    fn test_max_length_clips_exactly() {
        let text = "x".repeat(1000);
        let mut stream = stream_of(vec![ContentEvent::text(text)], OutputFormat::PlainText, 10, Charset::Utf8);
        let out = stream.read_all().unwrap();
        assert_eq!(out.len(), 10);
        assert!(stream.is_truncated());
    }

    #[test]
    fn test_output_of_exact_limit_is_not_truncated() {
        let mut stream = stream_of(
            vec![ContentEvent::text("12345"), ContentEvent::text("")],
            OutputFormat::PlainText,
            5,
            Charset::Utf8,
        );
        assert_eq!(stream.read_all().unwrap(), b"12345");
        assert!(!stream.is_truncated());
    }

    #[test]
    fn test_max_length_counts_characters_not_bytes() {
        let mut stream = stream_of(vec![ContentEvent::text("héllo wörld")], OutputFormat::PlainText, 4, Charset::Utf8);
        assert_eq!(String::from_utf8(stream.read_all().unwrap()).unwrap(), "héll");
    }

    #[test]
    fn test_truncation_drops_producer() {
        let events = (0..).map(|i| Ok::<_, ExtractumError>(ContentEvent::text(format!("{}", i % 10))));
        let producer: ContentProducer = Box::new(events);
        let mut stream = ContentStream::new(
            producer,
            &Metadata::default(),
            RenderSettings {
                format: OutputFormat::PlainText,
                max_length: 3,
                charset: Charset::Utf8,
            },
        );
        assert_eq!(stream.read_all().unwrap(), b"012");
        assert!(stream.producer.is_none());
    }

    #[test]
    fn test_markup_is_well_formed_and_escaped() {
        let mut builder = MetadataBuilder::new();
        builder.add("dc:title", "Q&A").add("Content-Type", "text/plain");
        let producer: ContentProducer = Box::new(
            vec![
                ContentEvent::StartPage,
                ContentEvent::StartParagraph,
                ContentEvent::text("a < b"),
                ContentEvent::EndParagraph,
                ContentEvent::EndPage,
            ]
            .into_iter()
            .map(Ok::<_, ExtractumError>),
        );
        let mut stream = ContentStream::new(
            producer,
            &builder.build(),
            RenderSettings {
                format: OutputFormat::Markup,
                max_length: usize::MAX,
                charset: Charset::Utf8,
            },
        );
        let out = String::from_utf8(stream.read_all().unwrap()).unwrap();
        assert_eq!(
            out,
            "<html xmlns=\"http://www.w3.org/1999/xhtml\"><head>\
             <meta name=\"dc:title\" content=\"Q&amp;A\"/>\
             <meta name=\"Content-Type\" content=\"text/plain\"/>\
             <title>Q&amp;A</title></head><body>\
             <div class=\"page\"><p>a &lt; b</p></div></body></html>"
        );
    }

    #[test]
    fn test_markup_truncation_closes_open_elements() {
        let mut stream = stream_of(
            vec![
                ContentEvent::StartPage,
                ContentEvent::StartParagraph,
                ContentEvent::text("abcdefgh"),
                ContentEvent::EndParagraph,
                ContentEvent::EndPage,
            ],
            OutputFormat::Markup,
            3,
            Charset::Utf8,
        );
        let out = String::from_utf8(stream.read_all().unwrap()).unwrap();
        assert!(out.ends_with("<div class=\"page\"><p>abc</p></div></body></html>"), "{}", out);
        assert!(stream.is_truncated());
    }

    #[test]
    fn test_empty_document_markup_still_has_skeleton() {
        let mut stream = stream_of(Vec::new(), OutputFormat::Markup, usize::MAX, Charset::Utf8);
        let out = String::from_utf8(stream.read_all().unwrap()).unwrap();
        assert!(out.starts_with("<html"));
        assert!(out.ends_with("<body></body></html>"));
    }

    #[test]
    fn test_charsets() {
        let mut ascii = stream_of(vec![ContentEvent::text("naïve")], OutputFormat::PlainText, 100, Charset::UsAscii);
        assert_eq!(ascii.read_all().unwrap(), b"na?ve");

        let mut utf16 = stream_of(vec![ContentEvent::text("hé")], OutputFormat::PlainText, 100, Charset::Utf16Be);
        let bytes = utf16.read_all().unwrap();
        assert_eq!(bytes, vec![0x00, b'h', 0x00, 0xE9]);
        assert_eq!(decode(bytes, Charset::Utf16Be).unwrap(), "hé");
    }

    #[test]
    fn test_errored_stream_reports_io() {
        let producer: ContentProducer = Box::new(
            vec![
                Ok(ContentEvent::text("ok")),
                Err(ExtractumError::extraction_failed("corrupt page")),
            ]
            .into_iter(),
        );
        let mut stream = ContentStream::new(
            producer,
            &Metadata::default(),
            RenderSettings {
                format: OutputFormat::PlainText,
                max_length: usize::MAX,
                charset: Charset::Utf8,
            },
        );
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        let first = stream.read(&mut buf).unwrap_err();
        assert_eq!(first.kind(), crate::ErrorKind::Io);
        assert!(first.to_string().contains("corrupt page"));
        assert_eq!(stream.state(), StreamState::Errored);
        for _ in 0..2 {
            assert_eq!(stream.read(&mut buf).unwrap_err().kind(), crate::ErrorKind::Io);
        }
        assert_eq!(stream.read_all().unwrap_err().kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_backend_failure_recovered_from_read_error() {
        let wrapped = read_failure(ExtractumError::extraction_failed("corrupt page"));
        assert_eq!(wrapped.kind(), crate::ErrorKind::Io);
        let original = backend_failure(wrapped);
        assert_eq!(original.kind(), crate::ErrorKind::ExtractionFailed);
        assert!(original.to_string().contains("corrupt page"));

        let plain_io = backend_failure(ExtractumError::io("disk gone"));
        assert_eq!(plain_io.kind(), crate::ErrorKind::Io);
        let oom = backend_failure(ExtractumError::OutOfMemory("big".to_string()));
        assert_eq!(oom.kind(), crate::ErrorKind::OutOfMemory);
    }

    #[test]
    fn test_std_io_read_adapter() {
        use std::io::Read as _;
        let mut stream = plain(vec![ContentEvent::text("line one\n"), ContentEvent::text("line two")]);
        let mut text = String::new();
        std::io::Read::read_to_string(&mut stream, &mut text).unwrap();
        assert_eq!(text, "line one\nline two");
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }
}
