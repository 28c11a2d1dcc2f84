//! Office Open XML package metadata.
//!
//! Word packages keep their document properties in two parts:
//! - `docProps/core.xml` - Dublin Core metadata (title, creator, dates, keywords, etc.)
//! - `docProps/app.xml` - application statistics (page count, word count, etc.)
//!
//! Both parts are optional; a package without them yields empty properties.
//!
//! # Example
//!
//! ```no_run
//! use extractum::extraction::office_metadata::{extract_app_properties, extract_core_properties};
//! use std::fs::File;
//! use zip::ZipArchive;
//!
//! let file = File::open("document.docx")?;
//! let mut archive = ZipArchive::new(file)?;
//!
//! let core = extract_core_properties(&mut archive)?;
//! println!("Title: {:?}", core.title);
//!
//! let app = extract_app_properties(&mut archive)?;
//! println!("Word count: {:?}", app.words);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod app_properties;
pub mod core_properties;

pub use app_properties::{AppProperties, extract_app_properties};
pub use core_properties::{CoreProperties, extract_core_properties};

use crate::{ExtractumError, Result};
use roxmltree::Node;
use std::io::{Read, Seek};
use zip::ZipArchive;
use zip::result::ZipError;

/// Read a package part as UTF-8 text, or `None` when the part is absent.
pub(crate) fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| ExtractumError::extraction_failed_with_source(format!("Failed to read {}", name), e))?;
    Ok(Some(content))
}

/// Parse text content from an XML element by local tag name.
///
/// Returns the text content if the element exists and has non-empty text.
pub(crate) fn parse_xml_text(node: Node, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Parse integer content from an XML element by local tag name.
pub(crate) fn parse_xml_int(node: Node, name: &str) -> Option<i64> {
    parse_xml_text(node, name).and_then(|s| s.parse::<i64>().ok())
}
