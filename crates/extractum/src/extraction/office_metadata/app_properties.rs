//! Application properties extraction from docProps/app.xml

use crate::metadata::MetadataBuilder;
use crate::{ExtractumError, Result};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Application properties of a WordprocessingML package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppProperties {
    /// Producing application, e.g. "Microsoft Office Word"
    pub application: Option<String>,
    pub app_version: Option<String>,
    pub template: Option<String>,
    /// Total editing time in minutes
    pub total_time: Option<i64>,
    pub pages: Option<i64>,
    pub words: Option<i64>,
    pub characters: Option<i64>,
    pub characters_with_spaces: Option<i64>,
    pub lines: Option<i64>,
    pub paragraphs: Option<i64>,
    pub company: Option<String>,
    pub doc_security: Option<i64>,
}

impl AppProperties {
    /// Record the properties under their extended-properties keys.
    pub fn add_to(&self, metadata: &mut MetadataBuilder) {
        let number = |v: Option<i64>| v.map(|n| n.to_string());
        metadata
            .add_opt("extended-properties:Application", self.application.as_deref())
            .add_opt("extended-properties:AppVersion", self.app_version.as_deref())
            .add_opt("extended-properties:Template", self.template.as_deref())
            .add_opt("extended-properties:TotalTime", number(self.total_time))
            .add_opt("xmpTPg:NPages", number(self.pages))
            .add_opt("meta:word-count", number(self.words))
            .add_opt("meta:character-count", number(self.characters))
            .add_opt("meta:character-count-with-spaces", number(self.characters_with_spaces))
            .add_opt("meta:line-count", number(self.lines))
            .add_opt("meta:paragraph-count", number(self.paragraphs))
            .add_opt("extended-properties:Company", self.company.as_deref())
            .add_opt("extended-properties:DocSecurity", number(self.doc_security));
    }
}

/// Extract application properties from an Office Open XML package.
///
/// A package without `docProps/app.xml` yields `AppProperties::default()`.
pub fn extract_app_properties<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<AppProperties> {
    let Some(xml_content) = super::read_part(archive, "docProps/app.xml")? else {
        return Ok(AppProperties::default());
    };

    let doc = roxmltree::Document::parse(&xml_content)
        .map_err(|e| ExtractumError::extraction_failed_with_source("Failed to parse app.xml", e))?;
    let root = doc.root_element();

    Ok(AppProperties {
        application: super::parse_xml_text(root, "Application"),
        app_version: super::parse_xml_text(root, "AppVersion"),
        template: super::parse_xml_text(root, "Template"),
        total_time: super::parse_xml_int(root, "TotalTime"),
        pages: super::parse_xml_int(root, "Pages"),
        words: super::parse_xml_int(root, "Words"),
        characters: super::parse_xml_int(root, "Characters"),
        characters_with_spaces: super::parse_xml_int(root, "CharactersWithSpaces"),
        lines: super::parse_xml_int(root, "Lines"),
        paragraphs: super::parse_xml_int(root, "Paragraphs"),
        company: super::parse_xml_text(root, "Company"),
        doc_security: super::parse_xml_int(root, "DocSecurity"),
    })
}
