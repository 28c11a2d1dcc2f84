//! Word documents through the public extractor.

#![cfg(feature = "office")]

mod common;

use common::{docx, read_in_chunks};
use extractum::{DOCX_MIME_TYPE, Extractor, OfficeConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_docx_file_to_string() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("letter.docx");
    fs::write(&path, docx(&["First paragraph.", "Second paragraph."], "A Letter")).unwrap();

    let (content, metadata) = Extractor::new().extract_file_to_string(&path).unwrap();

    assert_eq!(content, "First paragraph.\nSecond paragraph.\n");
    assert_eq!(metadata.get_value("Content-Type"), Some(DOCX_MIME_TYPE));
    assert_eq!(metadata.get_value("dc:title"), Some("A Letter"));
    assert_eq!(metadata.get_value("dc:creator"), Some("Ada Lovelace"));
}

#[test]
fn test_docx_detected_from_bytes() {
    let bytes = docx(&["Sniffed from content"], "Untitled");
    let (content, metadata) = Extractor::new().extract_bytes_to_string(&bytes).unwrap();
    assert_eq!(content.trim_end(), "Sniffed from content");
    assert_eq!(metadata.get_value("Content-Type"), Some(DOCX_MIME_TYPE));
}

#[test]
fn test_docx_markup_has_paragraphs() {
    let bytes = docx(&["Fish &amp; Chips", "Tea"], "Menu");
    let (content, _) = Extractor::new()
        .set_xml_output(true)
        .extract_bytes_to_string(&bytes)
        .unwrap();

    assert!(content.contains("<title>Menu</title>"));
    assert!(content.contains("<p>Fish &amp; Chips</p><p>Tea</p>"));
}

#[test]
fn test_docx_stream_matches_string() {
    let paragraphs: Vec<String> = (0..300).map(|i| format!("Paragraph number {} with some words.", i)).collect();
    let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
    let bytes = docx(&refs, "Long");
    let extractor = Extractor::new()
        .set_office_config(OfficeConfig::new().set_include_shape_based_content(false))
        .set_extract_string_max_length(2000);

    let (content, _) = extractor.extract_bytes_to_string(&bytes).unwrap();
    let (mut stream, _) = extractor.extract_bytes(&bytes).unwrap();
    assert_eq!(read_in_chunks(&mut stream), content.into_bytes());
    assert!(stream.is_truncated());
}
