use super::{resolve_dict, text_entry};
use crate::metadata::MetadataBuilder;
use lopdf::{Dictionary, Document};

const STANDARD_INFO_KEYS: &[&[u8]] = &[
    b"Title",
    b"Author",
    b"Subject",
    b"Keywords",
    b"Creator",
    b"Producer",
    b"CreationDate",
    b"ModDate",
    b"Trapped",
];

/// Record the document information dictionary plus structural facts.
///
/// Standard entries map to Dublin Core style keys; any other entry is kept as
/// `pdf:docinfo:custom:<Name>`.
pub fn add_document_metadata(doc: &Document, metadata: &mut MetadataBuilder) {
    metadata
        .add("pdf:PDFVersion", doc.version.as_str())
        .add("xmpTPg:NPages", doc.get_pages().len().to_string())
        .add("pdf:encrypted", doc.is_encrypted().to_string());

    let Some(info) = info_dictionary(doc) else {
        return;
    };

    metadata.add_opt("dc:title", text_entry(doc, info, b"Title"));
    if let Some(author) = text_entry(doc, info, b"Author") {
        for name in parse_authors(&author) {
            metadata.add("dc:creator", name);
        }
    }
    metadata.add_opt("dc:subject", text_entry(doc, info, b"Subject"));
    if let Some(keywords) = text_entry(doc, info, b"Keywords") {
        for keyword in parse_keywords(&keywords) {
            metadata.add("meta:keyword", keyword);
        }
    }
    metadata
        .add_opt("xmp:CreatorTool", text_entry(doc, info, b"Creator"))
        .add_opt("pdf:producer", text_entry(doc, info, b"Producer"))
        .add_opt("dcterms:created", text_entry(doc, info, b"CreationDate").map(|d| parse_pdf_date(&d)))
        .add_opt("dcterms:modified", text_entry(doc, info, b"ModDate").map(|d| parse_pdf_date(&d)));

    for (key, _) in info.iter() {
        if STANDARD_INFO_KEYS.contains(&key.as_slice()) {
            continue;
        }
        if let Some(value) = text_entry(doc, info, key) {
            metadata.add(format!("pdf:docinfo:custom:{}", String::from_utf8_lossy(key)), value);
        }
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    doc.trailer.get(b"Info").ok().and_then(|info| resolve_dict(doc, info))
}

fn parse_authors(author_str: &str) -> Vec<String> {
    let author_str = author_str.replace(" and ", ", ");
    let mut authors = Vec::new();

    for segment in author_str.split(';') {
        for author in segment.split(',') {
            let trimmed = author.trim();
            if !trimmed.is_empty() {
                authors.push(trimmed.to_string());
            }
        }
    }

    authors
}

fn parse_keywords(keywords_str: &str) -> Vec<String> {
    keywords_str
        .replace(';', ",")
        .split(',')
        .filter_map(|k| {
            let trimmed = k.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Convert `D:YYYYMMDDHHmmSSOHH'mm'` to ISO 8601. Unparseable input is
/// returned unchanged.
fn parse_pdf_date(date_str: &str) -> String {
    let cleaned = date_str.trim();
    let digits_part = cleaned.strip_prefix("D:").unwrap_or(cleaned);
    if !digits_part.is_ascii() || digits_part.len() < 4 || !digits_part[..4].bytes().all(|b| b.is_ascii_digit()) {
        return date_str.to_string();
    }

    let digit_len = digits_part.bytes().take_while(u8::is_ascii_digit).count();
    let digits = &digits_part[..digit_len];
    let field = |start: usize, default: &'static str| digits.get(start..start + 2).unwrap_or(default);

    let year = &digits[..4];
    let (month, day) = (field(4, "01"), field(6, "01"));
    let (hour, minute, second) = (field(8, "00"), field(10, "00"), field(12, "00"));

    let zone = &digits_part[digit_len..];
    let offset = match zone.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let parts: Vec<&str> = zone[1..].split('\'').filter(|p| !p.is_empty()).collect();
            let hours = parts.first().copied().unwrap_or("00");
            let minutes = parts.get(1).copied().unwrap_or("00");
            format!("{}{}:{}", sign, hours, minutes)
        }
        _ => "Z".to_string(),
    };

    format!("{}-{}-{}T{}:{}:{}{}", year, month, day, hour, minute, second, offset)
}
