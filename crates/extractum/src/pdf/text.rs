//! Per-page text sources: the text layer, annotations and marked content.

use super::{dict_entry, inherited_entry, resolve_dict, text_entry};
use crate::{ExtractumError, Result};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

/// Text layer of one page (1-based page number).
pub fn page_text(doc: &Document, page_number: u32) -> Result<String> {
    doc.extract_text(&[page_number]).map_err(|e| {
        ExtractumError::extraction_failed_with_source(format!("Failed to extract text of page {}", page_number), e)
    })
}

/// `/Contents` of the page's annotations, in array order.
///
/// Popup annotations repeat their parent's contents and are skipped.
pub fn annotation_texts(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Some(Object::Array(annotations)) = dict_entry(doc, page, b"Annots") else {
        return Vec::new();
    };

    annotations
        .iter()
        .filter_map(|annotation| resolve_dict(doc, annotation))
        .filter(|annotation| !matches!(annotation.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Popup"))
        .filter_map(|annotation| text_entry(doc, annotation, b"Contents"))
        .collect()
}

/// Replacement text of marked-content sequences: `/ActualText`, else `/Alt`.
///
/// Property lists given by name are looked up in the page's `/Properties`
/// resources.
pub fn marked_content_texts(doc: &Document, page_id: ObjectId) -> Result<Vec<String>> {
    let raw = doc.get_page_content(page_id).map_err(|e| {
        ExtractumError::extraction_failed_with_source("Failed to read page content stream", e)
    })?;
    let content = Content::decode(&raw)
        .map_err(|e| ExtractumError::extraction_failed_with_source("Failed to decode page content stream", e))?;

    let named_properties = inherited_entry(doc, page_id, b"Resources")
        .and_then(|resources| resolve_dict(doc, resources))
        .and_then(|resources| dict_entry(doc, resources, b"Properties"))
        .and_then(|properties| resolve_dict(doc, properties));

    let mut texts = Vec::new();
    for operation in content.operations.iter().filter(|op| op.operator == "BDC") {
        let properties = match operation.operands.get(1) {
            Some(Object::Name(name)) => named_properties
                .and_then(|named| named.get(name).ok())
                .and_then(|props| resolve_dict(doc, props)),
            Some(other) => resolve_dict(doc, other),
            None => None,
        };
        if let Some(text) = properties.and_then(|props| {
            text_entry(doc, props, b"ActualText").or_else(|| text_entry(doc, props, b"Alt"))
        }) {
            texts.push(text);
        }
    }
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{Stream, StringFormat, dictionary};

    fn literal(text: &str) -> Object {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn single_page(operations: Vec<Operation>, extra: lopdf::Dictionary) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        for (key, value) in extra.iter() {
            page.set(key.clone(), value.clone());
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    #[test]
    fn test_annotation_texts_skip_popups() {
        let (mut doc, page_id) = single_page(Vec::new(), dictionary! {});
        let note = doc.add_object(dictionary! { "Subtype" => "Text", "Contents" => literal("Check this figure") });
        let popup = doc.add_object(dictionary! { "Subtype" => "Popup", "Contents" => literal("Check this figure") });
        let link = doc.add_object(dictionary! { "Subtype" => "Link" });
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Annots", vec![note.into(), popup.into(), link.into()]);
        }

        assert_eq!(annotation_texts(&doc, page_id), vec!["Check this figure".to_string()]);
    }

    #[test]
    fn test_marked_content_inline_and_named_properties() {
        let operations = vec![
            Operation::new("BDC", vec!["Span".into(), Object::Dictionary(dictionary! { "ActualText" => literal("fi") })]),
            Operation::new("EMC", vec![]),
            Operation::new("BDC", vec!["Figure".into(), "MC0".into()]),
            Operation::new("EMC", vec![]),
            Operation::new("BMC", vec!["Artifact".into()]),
            Operation::new("EMC", vec![]),
        ];
        let resources = dictionary! {
            "Properties" => dictionary! { "MC0" => dictionary! { "Alt" => literal("Bar chart of revenue") } },
        };
        let (doc, page_id) = single_page(operations, dictionary! { "Resources" => resources });

        assert_eq!(
            marked_content_texts(&doc, page_id).unwrap(),
            vec!["fi".to_string(), "Bar chart of revenue".to_string()]
        );
    }
}
