//! PDF document extractor.
//!
//! Pages are processed one at a time as the content stream is read, so a
//! clipped or dropped stream never touches the remaining pages.

use crate::core::config::PdfOcrStrategy;
use crate::core::mime::PDF_MIME_TYPE;
use crate::metadata::MetadataBuilder;
use crate::pdf::{PageImage, add_document_metadata, annotation_texts, marked_content_texts, page_images, page_text};
use crate::plugins::{ContentEvent, DocumentExtractor, DocumentSource, ExtractionContext, ParsedDocument, Plugin};
use crate::{ExtractumError, Result};
use lopdf::{Document, ObjectId};
use std::collections::{HashSet, VecDeque};

const MIN_MEANINGFUL_WORD_LEN: usize = 4;
const MIN_NON_WHITESPACE: usize = 32;
const MIN_ALNUM_RATIO: f64 = 0.3;

struct NativeTextStats {
    non_whitespace: usize,
    alnum: usize,
    meaningful_words: usize,
}

impl NativeTextStats {
    fn from(text: &str) -> Self {
        let mut non_whitespace = 0usize;
        let mut alnum = 0usize;

        for ch in text.chars() {
            if !ch.is_whitespace() {
                non_whitespace += 1;
                if ch.is_alphanumeric() {
                    alnum += 1;
                }
            }
        }

        let meaningful_words = text
            .split_whitespace()
            .filter(|word| word.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_MEANINGFUL_WORD_LEN)
            .count();

        Self {
            non_whitespace,
            alnum,
            meaningful_words,
        }
    }

    fn alnum_ratio(&self) -> f64 {
        if self.non_whitespace == 0 {
            0.0
        } else {
            self.alnum as f64 / self.non_whitespace as f64
        }
    }
}

/// Decide whether `Auto` should OCR a page given its text layer.
///
/// Blank pages, pages without alphanumerics and short pages made mostly of
/// punctuation fall back to OCR.
fn page_needs_ocr(native_text: &str) -> bool {
    let stats = NativeTextStats::from(native_text.trim());
    if stats.alnum == 0 {
        return true;
    }
    if stats.meaningful_words > 0 || stats.non_whitespace >= MIN_NON_WHITESPACE {
        return stats.alnum_ratio() < MIN_ALNUM_RATIO && stats.non_whitespace < MIN_NON_WHITESPACE;
    }
    stats.alnum_ratio() < MIN_ALNUM_RATIO
}

/// PDF extractor built on `lopdf`.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PdfExtractor {
    fn name(&self) -> &str {
        "pdf-extractor"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn description(&self) -> &str {
        "Extracts text, annotations and images from PDF documents with optional OCR"
    }
}

impl DocumentExtractor for PdfExtractor {
    fn supported_mime_types(&self) -> &[&str] {
        &[PDF_MIME_TYPE]
    }

    fn priority(&self) -> i32 {
        50
    }

    #[tracing::instrument(skip(self, source, ctx), fields(extractor.name = self.name()))]
    fn extract(&self, source: DocumentSource, mime_type: &str, ctx: &ExtractionContext) -> Result<ParsedDocument> {
        let strategy = ctx.pdf.ocr_strategy();
        if matches!(strategy, PdfOcrStrategy::OcrOnly | PdfOcrStrategy::OcrAndText) && !ctx.ocr_backend.is_available()
        {
            return Err(ExtractumError::ocr(format!(
                "OCR strategy {:?} requires an OCR engine, but '{}' is not available",
                strategy,
                ctx.ocr_backend.name()
            )));
        }

        let doc = match source {
            DocumentSource::Path(path) => Document::load(&path)?,
            DocumentSource::Bytes(bytes) => Document::load_mem(&bytes)?,
        };

        let mut metadata = MetadataBuilder::new();
        metadata.add("Content-Type", mime_type);
        add_document_metadata(&doc, &mut metadata);

        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        tracing::debug!(pages = pages.len(), ?strategy, "parsed PDF document");

        let ocr_available = ctx.ocr_backend.is_available();
        if strategy == PdfOcrStrategy::Auto && !ocr_available {
            tracing::warn!(backend = ctx.ocr_backend.name(), "OCR engine unavailable, Auto strategy keeps text layer only");
        }

        let producer = PdfPages {
            doc,
            pages: pages.into_iter(),
            ctx: ctx.clone(),
            ocr_available,
            seen_images: HashSet::new(),
            image_counter: 0,
            pending: VecDeque::new(),
            failed: false,
        };
        Ok(ParsedDocument::new(metadata.build(), producer))
    }
}

struct PdfPages {
    doc: Document,
    pages: std::vec::IntoIter<(u32, ObjectId)>,
    ctx: ExtractionContext,
    ocr_available: bool,
    seen_images: HashSet<String>,
    image_counter: usize,
    pending: VecDeque<ContentEvent>,
    failed: bool,
}

impl PdfPages {
    fn render_page(&mut self, number: u32, page_id: ObjectId) -> Result<Vec<ContentEvent>> {
        let pdf = &self.ctx.pdf;
        let strategy = pdf.ocr_strategy();
        let mut events = vec![ContentEvent::StartPage];

        let text = if strategy == PdfOcrStrategy::OcrOnly {
            String::new()
        } else {
            page_text(&self.doc, number)?
        };
        push_paragraphs(&mut events, &text);

        if pdf.extract_marked_content() {
            for replacement in marked_content_texts(&self.doc, page_id)? {
                push_paragraphs(&mut events, &replacement);
            }
        }
        if pdf.extract_annotation_text() {
            for annotation in annotation_texts(&self.doc, page_id) {
                push_paragraphs(&mut events, &annotation);
            }
        }

        let run_ocr = match strategy {
            PdfOcrStrategy::NoOcr => false,
            PdfOcrStrategy::OcrOnly | PdfOcrStrategy::OcrAndText => true,
            PdfOcrStrategy::Auto => self.ocr_available && page_needs_ocr(&text),
        };
        let images = if run_ocr || pdf.extract_inline_images() {
            page_images(&self.doc, page_id)
        } else {
            Vec::new()
        };

        if pdf.extract_inline_images() {
            let unique_only = pdf.extract_unique_inline_images_only();
            for image in &images {
                if unique_only && !self.seen_images.insert(image.digest.clone()) {
                    continue;
                }
                events.push(ContentEvent::Image {
                    name: format!("image{}.{}", self.image_counter, image.extension()),
                    alt: None,
                });
                self.image_counter += 1;
            }
        }

        if run_ocr {
            tracing::debug!(page = number, images = images.len(), "running OCR on page images");
            for image in &images {
                let recognized = self.recognize(number, image)?;
                push_paragraphs(&mut events, &recognized);
            }
        }

        events.push(ContentEvent::EndPage);
        Ok(events)
    }

    fn recognize(&self, number: u32, image: &PageImage) -> Result<String> {
        match image.to_ocr_input() {
            Some(input) => self.ctx.recognize(&input),
            None => {
                tracing::warn!(page = number, image = %image.name, format = ?image.format, "skipping image that cannot be prepared for OCR");
                Ok(String::new())
            }
        }
    }
}

/// One paragraph per blank-line separated block.
fn push_paragraphs(events: &mut Vec<ContentEvent>, text: &str) {
    for block in text.split("\n\n") {
        let block = block.trim_matches(|c| c == '\n' || c == '\r').trim_end();
        if block.trim().is_empty() {
            continue;
        }
        events.push(ContentEvent::StartParagraph);
        events.push(ContentEvent::text(block));
        events.push(ContentEvent::EndParagraph);
    }
}

impl Iterator for PdfPages {
    type Item = Result<ContentEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.failed {
                return None;
            }
            let (number, page_id) = self.pages.next()?;
            match self.render_page(number, page_id) {
                Ok(events) => self.pending.extend(events),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
