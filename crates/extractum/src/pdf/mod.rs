//! PDF object-level helpers built on `lopdf`.
//!
//! Used by the PDF extractor for document information, per-page text,
//! annotations, marked content and image XObjects.
//!
//! # Example
//!
//! ```rust,no_run
//! use extractum::metadata::MetadataBuilder;
//! use extractum::pdf::{add_document_metadata, page_text};
//!
//! # fn example() -> extractum::Result<()> {
//! let doc = lopdf::Document::load("document.pdf")?;
//! let mut metadata = MetadataBuilder::new();
//! add_document_metadata(&doc, &mut metadata);
//!
//! for page_number in doc.get_pages().keys() {
//!     println!("{}", page_text(&doc, *page_number)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod images;
pub mod metadata;
pub mod text;

pub use images::{ImageFormat, PageImage, page_images};
pub use metadata::add_document_metadata;
pub use text::{annotation_texts, marked_content_texts, page_text};

use encoding_rs::UTF_16BE;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Follow an indirect reference; direct objects are returned as-is.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

pub(crate) fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|object| resolve(doc, object))
}

/// Text value of a string entry, decoded as a PDF text string.
pub(crate) fn text_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict_entry(doc, dict, key)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
    .map(|s| s.trim_matches(char::from(0)).trim().to_string())
    .filter(|s| !s.is_empty())
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with a byte-order mark,
/// otherwise PDFDocEncoding, read here as Latin-1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (text, _had_errors) = UTF_16BE.decode_without_bom_handling(rest);
        return text.into_owned();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Page dictionary lookup with inheritance through `/Parent`.
pub(crate) fn inherited_entry<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok();
    let mut depth = 0;
    while let Some(dict) = current {
        if let Some(value) = dict_entry(doc, dict, key) {
            return Some(value);
        }
        depth += 1;
        if depth > 64 {
            break;
        }
        current = dict.get(b"Parent").ok().and_then(|parent| resolve_dict(doc, parent));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_string_utf16() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Grüße".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text_string(&bytes), "Grüße");
    }

    #[test]
    fn test_decode_text_string_latin1() {
        assert_eq!(decode_text_string(b"Caf\xe9"), "Café");
        assert_eq!(decode_text_string(b"plain"), "plain");
    }

    #[test]
    fn test_decode_text_string_utf8_bom() {
        assert_eq!(decode_text_string("\u{feff}naïve".as_bytes()), "naïve");
    }
}
