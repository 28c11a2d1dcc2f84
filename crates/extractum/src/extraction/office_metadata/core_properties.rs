//! Core properties extraction from docProps/core.xml
//!
//! Extracts Dublin Core metadata from Office Open XML documents.

use crate::metadata::MetadataBuilder;
use crate::{ExtractumError, Result};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Dublin Core metadata from docProps/core.xml
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreProperties {
    /// Document title
    pub title: Option<String>,
    /// Document subject/topic
    pub subject: Option<String>,
    /// Document creator/author, `;`-separated when there are several
    pub creator: Option<String>,
    /// Keywords or tags as stored
    pub keywords: Option<String>,
    /// Document description/abstract
    pub description: Option<String>,
    /// User who last modified the document
    pub last_modified_by: Option<String>,
    pub revision: Option<String>,
    /// Creation timestamp (ISO 8601)
    pub created: Option<String>,
    /// Last modification timestamp (ISO 8601)
    pub modified: Option<String>,
    pub category: Option<String>,
    /// Content status (Draft, Final, etc.)
    pub content_status: Option<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
    pub version: Option<String>,
    /// Last print timestamp (ISO 8601)
    pub last_printed: Option<String>,
}

impl CoreProperties {
    /// Split stored keywords on `,` and `;`.
    pub fn keyword_list(&self) -> Vec<&str> {
        split_list(self.keywords.as_deref(), &[',', ';'])
    }

    /// Split the creator field on `;`.
    pub fn creator_list(&self) -> Vec<&str> {
        split_list(self.creator.as_deref(), &[';'])
    }

    /// Record the properties under their Dublin Core keys.
    pub fn add_to(&self, metadata: &mut MetadataBuilder) {
        metadata.add_opt("dc:title", self.title.as_deref());
        for creator in self.creator_list() {
            metadata.add("dc:creator", creator);
        }
        metadata.add_opt("dc:subject", self.subject.as_deref());
        for keyword in self.keyword_list() {
            metadata.add("meta:keyword", keyword);
        }
        metadata
            .add_opt("dc:description", self.description.as_deref())
            .add_opt("meta:last-author", self.last_modified_by.as_deref())
            .add_opt("cp:revision", self.revision.as_deref())
            .add_opt("dcterms:created", self.created.as_deref())
            .add_opt("dcterms:modified", self.modified.as_deref())
            .add_opt("cp:category", self.category.as_deref())
            .add_opt("cp:contentStatus", self.content_status.as_deref())
            .add_opt("dc:language", self.language.as_deref())
            .add_opt("dc:identifier", self.identifier.as_deref())
            .add_opt("cp:version", self.version.as_deref())
            .add_opt("meta:print-date", self.last_printed.as_deref());
    }
}

fn split_list<'a>(value: Option<&'a str>, separators: &[char]) -> Vec<&'a str> {
    value
        .map(|v| v.split(separators).map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Extract core properties from an Office Open XML package.
///
/// Fields that are not present in the document are `None`; a package without
/// `docProps/core.xml` yields `CoreProperties::default()`.
///
/// # Errors
///
/// Returns `ExtractionFailed` if core.xml exists but is not well-formed XML.
pub fn extract_core_properties<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<CoreProperties> {
    let Some(xml_content) = super::read_part(archive, "docProps/core.xml")? else {
        return Ok(CoreProperties::default());
    };

    let doc = roxmltree::Document::parse(&xml_content)
        .map_err(|e| ExtractumError::extraction_failed_with_source("Failed to parse core.xml", e))?;
    let root = doc.root_element();

    Ok(CoreProperties {
        title: super::parse_xml_text(root, "title"),
        subject: super::parse_xml_text(root, "subject"),
        creator: super::parse_xml_text(root, "creator"),
        keywords: super::parse_xml_text(root, "keywords"),
        description: super::parse_xml_text(root, "description"),
        last_modified_by: super::parse_xml_text(root, "lastModifiedBy"),
        revision: super::parse_xml_text(root, "revision"),
        created: super::parse_xml_text(root, "created"),
        modified: super::parse_xml_text(root, "modified"),
        category: super::parse_xml_text(root, "category"),
        content_status: super::parse_xml_text(root, "contentStatus"),
        language: super::parse_xml_text(root, "language"),
        identifier: super::parse_xml_text(root, "identifier"),
        version: super::parse_xml_text(root, "version"),
        last_printed: super::parse_xml_text(root, "lastPrinted"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::{FileOptions, ZipWriter};

    fn create_test_zip(core_xml: &str) -> ZipArchive<Cursor<Vec<u8>>> {
        let buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(buffer));

        let options = FileOptions::<()>::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("docProps/core.xml", options).unwrap();
        zip.write_all(core_xml.as_bytes()).unwrap();

        let cursor = zip.finish().unwrap();
        ZipArchive::new(cursor).unwrap()
    }

    const CORE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
                   xmlns:dc="http://purl.org/dc/elements/1.1/"
                   xmlns:dcterms="http://purl.org/dc/terms/"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>Quarterly Report</dc:title>
    <dc:creator>Alice Example; Bob Example</dc:creator>
    <cp:keywords>finance, report; q3</cp:keywords>
    <cp:lastModifiedBy>Carol</cp:lastModifiedBy>
    <cp:revision>4</cp:revision>
    <dcterms:created xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:created>
    <dcterms:modified xsi:type="dcterms:W3CDTF">2024-01-02T00:00:00Z</dcterms:modified>
</cp:coreProperties>"#;

    #[test]
    fn test_extract_core_properties() {
        let mut archive = create_test_zip(CORE_XML);
        let props = extract_core_properties(&mut archive).unwrap();

        assert_eq!(props.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(props.last_modified_by.as_deref(), Some("Carol"));
        assert_eq!(props.revision.as_deref(), Some("4"));
        assert_eq!(props.created.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(props.keyword_list(), vec!["finance", "report", "q3"]);
        assert_eq!(props.creator_list(), vec!["Alice Example", "Bob Example"]);
        assert_eq!(props.subject, None);
    }

    #[test]
    fn test_add_to_joins_multi_values() {
        let mut archive = create_test_zip(CORE_XML);
        let props = extract_core_properties(&mut archive).unwrap();
        let mut builder = MetadataBuilder::new();
        props.add_to(&mut builder);
        let metadata = builder.build();

        assert_eq!(metadata.key(0), Some("dc:title"));
        assert_eq!(metadata.get_value("dc:creator"), Some("Alice Example,Bob Example"));
        assert_eq!(metadata.get_value("meta:keyword"), Some("finance,report,q3"));
        assert_eq!(metadata.get_value("dcterms:modified"), Some("2024-01-02T00:00:00Z"));
        assert_eq!(metadata.get_value("dc:subject"), None);
    }

    #[test]
    fn test_missing_core_xml() {
        let buffer = Vec::new();
        let zip = ZipWriter::new(Cursor::new(buffer));
        let cursor = zip.finish().unwrap();
        let mut archive = ZipArchive::new(cursor).unwrap();

        let props = extract_core_properties(&mut archive).unwrap();
        assert_eq!(props, CoreProperties::default());
    }

    #[test]
    fn test_malformed_core_xml() {
        let mut archive = create_test_zip("<cp:coreProperties><dc:title>");
        let err = extract_core_properties(&mut archive).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ExtractionFailed);
    }
}
