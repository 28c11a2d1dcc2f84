//! Word (WordprocessingML) extractor.
//!
//! Supports: .docx, .dotx, .docm, .dotm

use crate::Result;
use crate::core::mime::WORD_MIME_TYPES;
use crate::extraction::{docx, office_metadata};
use crate::metadata::{Metadata, MetadataBuilder};
use crate::plugins::{ContentEvent, DocumentExtractor, DocumentSource, ExtractionContext, ParsedDocument, Plugin};
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// Word package extractor built on `zip` and `roxmltree`.
///
/// Reads `docProps/core.xml` and `docProps/app.xml` for metadata and walks
/// headers, body, footers and notes for content.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DocxExtractor {
    fn name(&self) -> &str {
        "docx-extractor"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn description(&self) -> &str {
        "Extracts text and document properties from Word packages"
    }
}

impl DocumentExtractor for DocxExtractor {
    fn supported_mime_types(&self) -> &[&str] {
        WORD_MIME_TYPES
    }

    fn priority(&self) -> i32 {
        50
    }

    #[tracing::instrument(skip(self, source, ctx), fields(extractor.name = self.name()))]
    fn extract(&self, source: DocumentSource, mime_type: &str, ctx: &ExtractionContext) -> Result<ParsedDocument> {
        let (metadata, events) = match source {
            DocumentSource::Path(path) => {
                let mut archive = ZipArchive::new(std::fs::File::open(&path)?)?;
                parse_package(&mut archive, mime_type, ctx)?
            }
            DocumentSource::Bytes(bytes) => {
                let mut archive = ZipArchive::new(Cursor::new(bytes))?;
                parse_package(&mut archive, mime_type, ctx)?
            }
        };
        Ok(ParsedDocument::from_events(metadata, events))
    }
}

fn parse_package<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    mime_type: &str,
    ctx: &ExtractionContext,
) -> Result<(Metadata, Vec<ContentEvent>)> {
    let mut metadata = MetadataBuilder::new();
    metadata.add("Content-Type", mime_type);

    office_metadata::extract_core_properties(archive)?.add_to(&mut metadata);
    office_metadata::extract_app_properties(archive)?.add_to(&mut metadata);

    let macros = docx::macro_parts(archive);
    if !macros.is_empty() {
        metadata.add("office:has-macros", "true");
        if ctx.office.extract_macros() {
            for (name, size) in &macros {
                tracing::debug!(part = %name, size, "listing macro part");
                metadata.add("office:macro-part", name.as_str());
            }
        }
    }

    let events = docx::extract_events(archive, &ctx.office)?;
    Ok((metadata.build(), events))
}
