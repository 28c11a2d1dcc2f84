//! WordprocessingML content walker.
//!
//! Turns the XML parts of a Word package into [`ContentEvent`]s. Tracked
//! changes, moved-from text and text boxes are filtered according to
//! [`OfficeConfig`]. For markup-compatibility blocks only the first
//! `mc:Choice` is read, so shapes carrying a VML fallback are not emitted twice.
//!
//! Text boxes anchored inside a paragraph are emitted after that paragraph
//! closes, which keeps the paragraph events flat.

use super::office_metadata::read_part;
use crate::core::config::OfficeConfig;
use crate::plugins::ContentEvent;
use crate::{ExtractumError, Result};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const VML_NS: &str = "urn:schemas-microsoft-com:vml";

const DEFAULT_MAIN_PART: &str = "word/document.xml";
const MACRO_PART_SUFFIX: &str = "vbaProject.bin";

/// A package relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    /// Last path segment of the relationship type URI, e.g. `header`.
    pub kind: String,
    /// Target resolved against the source part's directory.
    pub target: String,
    pub external: bool,
}

/// Relationships of one source part, in document order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    ordered: Vec<Relationship>,
    by_id: HashMap<String, usize>,
}

impl Relationships {
    /// Parse a `.rels` part. `base_dir` is the directory of the source part.
    pub fn parse(xml: &str, base_dir: &str) -> Result<Self> {
        let doc = Document::parse(xml)
            .map_err(|e| ExtractumError::extraction_failed_with_source("Failed to parse relationships", e))?;

        let mut relationships = Self::default();
        for node in doc.root_element().children().filter(|n| n.has_tag_name("Relationship")) {
            let (Some(id), Some(kind), Some(target)) =
                (node.attribute("Id"), node.attribute("Type"), node.attribute("Target"))
            else {
                continue;
            };
            let external = node.attribute("TargetMode") == Some("External");
            let target = if external {
                target.to_string()
            } else {
                resolve_target(base_dir, target)
            };
            relationships.by_id.insert(id.to_string(), relationships.ordered.len());
            relationships.ordered.push(Relationship {
                id: id.to_string(),
                kind: kind.rsplit('/').next().unwrap_or(kind).to_string(),
                target,
                external,
            });
        }
        Ok(relationships)
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id).map(|&i| &self.ordered[i])
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.ordered.iter().filter(move |r| r.kind == kind && !r.external)
    }
}

fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn rels_path(part: &str) -> (String, String) {
    match part.rsplit_once('/') {
        Some((dir, file)) => (dir.to_string(), format!("{}/_rels/{}.rels", dir, file)),
        None => (String::new(), format!("_rels/{}.rels", part)),
    }
}

fn part_relationships<R: Read + Seek>(archive: &mut ZipArchive<R>, part: &str) -> Result<Relationships> {
    let (base_dir, rels) = rels_path(part);
    match read_part(archive, &rels)? {
        Some(xml) => Relationships::parse(&xml, &base_dir),
        None => Ok(Relationships::default()),
    }
}

/// Locate the main document part through the package relationships.
pub fn main_document_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let package = match read_part(archive, "_rels/.rels")? {
        Some(xml) => Relationships::parse(&xml, "")?,
        None => Relationships::default(),
    };
    Ok(package
        .of_kind("officeDocument")
        .next()
        .map(|r| r.target.clone())
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
}

/// Names and sizes of VBA project parts in the package.
pub fn macro_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Vec<(String, u64)> {
    let names: Vec<String> = archive
        .file_names()
        .filter(|name| name.ends_with(MACRO_PART_SUFFIX))
        .map(String::from)
        .collect();
    names
        .into_iter()
        .filter_map(|name| {
            let size = archive.by_name(&name).ok()?.size();
            Some((name, size))
        })
        .collect()
}

/// Walk the whole package: headers, body, footers, footnotes and endnotes.
///
/// # Errors
///
/// `ExtractionFailed` when the main part is missing or any content part is
/// not well-formed XML.
pub fn extract_events<R: Read + Seek>(archive: &mut ZipArchive<R>, options: &OfficeConfig) -> Result<Vec<ContentEvent>> {
    let main_part = main_document_part(archive)?;
    let Some(body_xml) = read_part(archive, &main_part)? else {
        return Err(ExtractumError::extraction_failed(format!(
            "Word package has no main document part ({})",
            main_part
        )));
    };
    let relationships = part_relationships(archive, &main_part)?;

    let mut events = Vec::new();
    let headers: Vec<String> = relationships.of_kind("header").map(|r| r.target.clone()).collect();
    let footers: Vec<String> = relationships.of_kind("footer").map(|r| r.target.clone()).collect();

    for header in &headers {
        walk_related_part(archive, header, options, &mut events, None)?;
    }
    events.extend(walk_part(&body_xml, options, &relationships, None)?);
    for footer in &footers {
        walk_related_part(archive, footer, options, &mut events, None)?;
    }
    for (kind, element) in [("footnotes", "footnote"), ("endnotes", "endnote")] {
        let parts: Vec<String> = relationships.of_kind(kind).map(|r| r.target.clone()).collect();
        for part in &parts {
            walk_related_part(archive, part, options, &mut events, Some(element))?;
        }
    }
    Ok(events)
}

fn walk_related_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    options: &OfficeConfig,
    events: &mut Vec<ContentEvent>,
    notes: Option<&str>,
) -> Result<()> {
    let Some(xml) = read_part(archive, part)? else {
        tracing::debug!(part, "related part is missing from the package");
        return Ok(());
    };
    let relationships = part_relationships(archive, part)?;
    events.extend(walk_part(&xml, options, &relationships, notes)?);
    Ok(())
}

/// Walk one WordprocessingML part.
///
/// With `notes` set to `footnote` or `endnote`, only the user notes under the
/// root are walked and separator notes are skipped.
pub fn walk_part(
    xml: &str,
    options: &OfficeConfig,
    relationships: &Relationships,
    notes: Option<&str>,
) -> Result<Vec<ContentEvent>> {
    let doc = Document::parse(xml)
        .map_err(|e| ExtractumError::extraction_failed_with_source("Failed to parse WordprocessingML part", e))?;

    let mut walker = Walker {
        options,
        relationships,
        events: Vec::new(),
        deferred: Vec::new(),
        in_paragraph: false,
    };
    let root = doc.root_element();
    match notes {
        Some(element) => {
            for note in root.children().filter(|n| is_w(n, element)) {
                if matches!(
                    note.attribute((W_NS, "type")),
                    Some("separator" | "continuationSeparator" | "continuationNotice")
                ) {
                    continue;
                }
                walker.walk_children(note);
            }
        }
        None => walker.walk_children(root),
    }
    Ok(walker.events)
}

fn is_w(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(W_NS) && node.tag_name().name() == name
}

struct Walker<'a> {
    options: &'a OfficeConfig,
    relationships: &'a Relationships,
    events: Vec<ContentEvent>,
    deferred: Vec<ContentEvent>,
    in_paragraph: bool,
}

impl Walker<'_> {
    fn walk_children(&mut self, node: Node) {
        for child in node.children().filter(Node::is_element) {
            self.walk(child);
        }
    }

    fn walk(&mut self, node: Node) {
        let tag = node.tag_name();
        match (tag.namespace(), tag.name()) {
            (Some(W_NS), name) if name.ends_with("Pr") || name == "tblGrid" || name == "instrText" => {}
            (Some(W_NS), "p") => self.paragraph(node),
            (Some(W_NS), "t") => self.text(node.text().unwrap_or_default()),
            (Some(W_NS), "delText") => self.text(node.text().unwrap_or_default()),
            (Some(W_NS), "tab") => self.text("\t"),
            (Some(W_NS), "br" | "cr") => self.text("\n"),
            (Some(W_NS), "noBreakHyphen") => self.text("-"),
            (Some(W_NS), "del") => {
                if self.options.include_deleted_content() {
                    self.walk_children(node);
                }
            }
            (Some(W_NS), "moveFrom") => {
                if self.options.include_move_from_content() {
                    self.walk_children(node);
                }
            }
            (Some(W_NS), "txbxContent") => {
                if self.options.include_shape_based_content() {
                    self.text_box(node);
                }
            }
            (Some(MC_NS), "AlternateContent") => {
                let choice = node
                    .children()
                    .find(|n| n.has_tag_name((MC_NS, "Choice")))
                    .or_else(|| node.children().find(|n| n.has_tag_name((MC_NS, "Fallback"))));
                if let Some(choice) = choice {
                    self.walk_children(choice);
                }
            }
            (Some(A_NS), "blip") => self.image(node, node.attribute((R_NS, "embed"))),
            (Some(VML_NS), "imagedata") => self.image(node, node.attribute((R_NS, "id"))),
            _ => self.walk_children(node),
        }
    }

    fn paragraph(&mut self, node: Node) {
        self.events.push(ContentEvent::StartParagraph);
        self.in_paragraph = true;
        self.walk_children(node);
        self.events.push(ContentEvent::EndParagraph);
        self.in_paragraph = false;

        let deferred = std::mem::take(&mut self.deferred);
        self.events.extend(deferred);
    }

    fn text_box(&mut self, node: Node) {
        if !self.in_paragraph {
            self.walk_children(node);
            return;
        }
        let outer = std::mem::take(&mut self.events);
        self.in_paragraph = false;
        self.walk_children(node);
        self.in_paragraph = true;
        let inner = std::mem::replace(&mut self.events, outer);
        self.deferred.extend(inner);
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(ContentEvent::Text(last)) = self.events.last_mut() {
            last.push_str(text);
        } else {
            self.events.push(ContentEvent::Text(text.to_string()));
        }
    }

    fn image(&mut self, node: Node, relationship_id: Option<&str>) {
        let Some(relationship) = relationship_id.and_then(|id| self.relationships.get(id)) else {
            return;
        };
        if relationship.external {
            return;
        }
        let name = relationship
            .target
            .rsplit('/')
            .next()
            .unwrap_or(&relationship.target)
            .to_string();
        let alt = node
            .ancestors()
            .find(|n| n.has_tag_name((WP_NS, "inline")) || n.has_tag_name((WP_NS, "anchor")))
            .and_then(|frame| frame.children().find(|n| n.has_tag_name((WP_NS, "docPr"))))
            .and_then(|doc_pr| doc_pr.attribute("descr"))
            .filter(|descr| !descr.trim().is_empty())
            .map(str::to_string);
        self.events.push(ContentEvent::Image { name, alt });
    }
}
