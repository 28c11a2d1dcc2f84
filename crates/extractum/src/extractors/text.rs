//! Plain text extractor.
//!
//! Streams the source in fixed-size chunks and decodes it incrementally, so
//! memory stays bounded regardless of file size. The source encoding is taken
//! from, in order: a charset declared by the transport, a byte-order mark,
//! strict UTF-8 validation of the first chunk, and finally a `chardetng` guess.

use crate::Result;
use crate::core::io::read_prefix;
use crate::core::mime::TEXT_MIME_TYPES;
use crate::metadata::MetadataBuilder;
use crate::plugins::{ContentEvent, DocumentExtractor, DocumentSource, ExtractionContext, ParsedDocument, Plugin};
use chardetng::EncodingDetector;
use encoding_rs::{Decoder, Encoding, UTF_8};
use std::io::Read;

const CHUNK_SIZE: usize = 64 * 1024;

/// Plain text extractor.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text-extractor"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn description(&self) -> &str {
        "Extracts content from plain text files"
    }
}

impl DocumentExtractor for PlainTextExtractor {
    fn supported_mime_types(&self) -> &[&str] {
        TEXT_MIME_TYPES
    }

    fn priority(&self) -> i32 {
        50
    }

    #[tracing::instrument(skip(self, source, ctx), fields(extractor.name = self.name()))]
    fn extract(&self, source: DocumentSource, mime_type: &str, ctx: &ExtractionContext) -> Result<ParsedDocument> {
        let mut reader = source.into_reader()?;
        let first_chunk = read_prefix(&mut reader, CHUNK_SIZE)?;
        let at_eof = first_chunk.len() < CHUNK_SIZE;

        let encoding = detect_encoding(&first_chunk, at_eof, ctx.declared_charset.as_deref());
        tracing::debug!(encoding = encoding.name(), "decoding plain text");

        let mut metadata = MetadataBuilder::new();
        metadata
            .add("Content-Type", format!("{}; charset={}", mime_type, encoding.name()))
            .add("Content-Encoding", encoding.name());

        let producer = TextProducer {
            reader,
            decoder: encoding.new_decoder_with_bom_removal(),
            buffered: Some(first_chunk),
            finished: false,
        };
        Ok(ParsedDocument::new(metadata.build(), producer))
    }
}

/// Pick the source encoding.
pub(crate) fn detect_encoding(head: &[u8], at_eof: bool, declared: Option<&str>) -> &'static Encoding {
    if let Some(encoding) = declared.and_then(|label| Encoding::for_label(label.as_bytes())) {
        return encoding;
    }
    if let Some((encoding, _bom_len)) = Encoding::for_bom(head) {
        return encoding;
    }
    match std::str::from_utf8(head) {
        Ok(_) => return UTF_8,
        Err(e) if e.error_len().is_none() && !at_eof => return UTF_8,
        Err(_) => {}
    }

    let mut detector = EncodingDetector::new();
    detector.feed(head, at_eof);
    detector.guess(None, true)
}

struct TextProducer {
    reader: Box<dyn Read + Send>,
    decoder: Decoder,
    buffered: Option<Vec<u8>>,
    finished: bool,
}

impl TextProducer {
    fn decode(&mut self, bytes: &[u8], last: bool) -> String {
        let capacity = self.decoder.max_utf8_buffer_length(bytes.len()).unwrap_or(bytes.len() * 3 + 16);
        let mut text = String::with_capacity(capacity);
        let (_result, _read, _had_errors) = self.decoder.decode_to_string(bytes, &mut text, last);
        text
    }
}

impl Iterator for TextProducer {
    type Item = Result<ContentEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            let chunk = match self.buffered.take() {
                Some(chunk) => chunk,
                None => match read_prefix(&mut self.reader, CHUNK_SIZE) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                },
            };

            let last = chunk.is_empty();
            let text = self.decode(&chunk, last);
            if last {
                self.finished = true;
            }
            if !text.is_empty() {
                return Some(Ok(ContentEvent::Text(text)));
            }
        }
    }
}
