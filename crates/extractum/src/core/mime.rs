//! MIME type detection.
//!
//! Detection order: a declared type (e.g. an HTTP `Content-Type`) wins unless
//! it is the generic `application/octet-stream`; then the file extension
//! (built-in table, then `mime_guess`) when some backend handles the type it
//! names; then content sniffing with `infer`,
//! where ZIP containers are opened to recognise WordprocessingML; finally a
//! text heuristic for BOM-marked or NUL-free content.

use crate::{ExtractumError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const TSV_MIME_TYPE: &str = "text/tab-separated-values";
pub const JSON_MIME_TYPE: &str = "application/json";
pub const XML_MIME_TYPE: &str = "application/xml";
pub const XML_TEXT_MIME_TYPE: &str = "text/xml";
pub const YAML_MIME_TYPE: &str = "application/x-yaml";
pub const TOML_MIME_TYPE: &str = "application/toml";

pub const PDF_MIME_TYPE: &str = "application/pdf";

pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOTX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.template";
pub const DOCM_MIME_TYPE: &str = "application/vnd.ms-word.document.macroEnabled.12";
pub const DOTM_MIME_TYPE: &str = "application/vnd.ms-word.template.macroEnabled.12";

pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
pub const ZIP_MIME_TYPE: &str = "application/zip";

/// Text formats handled by the plain-text backend.
pub const TEXT_MIME_TYPES: &[&str] = &[
    PLAIN_TEXT_MIME_TYPE,
    MARKDOWN_MIME_TYPE,
    CSV_MIME_TYPE,
    TSV_MIME_TYPE,
    JSON_MIME_TYPE,
    XML_MIME_TYPE,
    XML_TEXT_MIME_TYPE,
    YAML_MIME_TYPE,
    TOML_MIME_TYPE,
];

/// WordprocessingML packages.
pub const WORD_MIME_TYPES: &[&str] = &[DOCX_MIME_TYPE, DOTX_MIME_TYPE, DOCM_MIME_TYPE, DOTM_MIME_TYPE];

/// Raster image formats.
pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/bmp",
    "image/tiff",
    "image/webp",
];

/// How much of a document is inspected by content sniffing.
const SNIFF_LEN: usize = 8192;

static EXT_TO_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("txt", PLAIN_TEXT_MIME_TYPE);
    m.insert("text", PLAIN_TEXT_MIME_TYPE);
    m.insert("log", PLAIN_TEXT_MIME_TYPE);
    m.insert("md", MARKDOWN_MIME_TYPE);
    m.insert("markdown", MARKDOWN_MIME_TYPE);
    m.insert("csv", CSV_MIME_TYPE);
    m.insert("tsv", TSV_MIME_TYPE);
    m.insert("json", JSON_MIME_TYPE);
    m.insert("xml", XML_MIME_TYPE);
    m.insert("yaml", YAML_MIME_TYPE);
    m.insert("yml", YAML_MIME_TYPE);
    m.insert("toml", TOML_MIME_TYPE);

    m.insert("pdf", PDF_MIME_TYPE);

    m.insert("docx", DOCX_MIME_TYPE);
    m.insert("dotx", DOTX_MIME_TYPE);
    m.insert("docm", DOCM_MIME_TYPE);
    m.insert("dotm", DOTM_MIME_TYPE);

    m.insert("png", "image/png");
    m.insert("jpg", "image/jpeg");
    m.insert("jpeg", "image/jpeg");
    m.insert("gif", "image/gif");
    m.insert("bmp", "image/bmp");
    m.insert("tif", "image/tiff");
    m.insert("tiff", "image/tiff");
    m.insert("webp", "image/webp");

    m
});

static MIME_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("application/x-pdf", PDF_MIME_TYPE);
    m.insert("application/acrobat", PDF_MIME_TYPE);
    m.insert("text/x-markdown", MARKDOWN_MIME_TYPE);
    m.insert("text/x-yaml", YAML_MIME_TYPE);
    m.insert("text/yaml", YAML_MIME_TYPE);
    m.insert("application/yaml", YAML_MIME_TYPE);
    m.insert("text/x-toml", TOML_MIME_TYPE);
    m.insert("text/json", JSON_MIME_TYPE);
    m.insert("image/jpg", "image/jpeg");
    m.insert("image/pjpeg", "image/jpeg");
    m.insert("image/x-ms-bmp", "image/bmp");
    m.insert("image/x-png", "image/png");

    m
});

/// Normalize a declared MIME type: parameters stripped, lowercased, aliases folded.
pub fn normalize_mime_type(declared: &str) -> String {
    let essence = declared.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    MIME_ALIASES
        .get(essence.as_str())
        .map(|canonical| canonical.to_string())
        .unwrap_or(essence)
}

/// `charset` parameter of a declared MIME type, if any.
pub fn charset_parameter(declared: &str) -> Option<String> {
    declared.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}

/// MIME type implied by a file name.
pub fn detect_from_path(path: &Path) -> Option<String> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(|s| s.to_lowercase());

    if let Some(ext) = &extension
        && let Some(mime_type) = EXT_TO_MIME.get(ext.as_str())
    {
        return Some(mime_type.to_string());
    }

    extension.and(mime_guess::from_path(path).first()).map(|mime| mime.essence_str().to_string())
}

/// Detect the MIME type of a file on disk.
///
/// `supported` tells whether a backend handles a type; extension results it
/// rejects (and `application/octet-stream`) fall through to content sniffing.
pub fn detect_for_file(path: &Path, declared: Option<&str>, supported: &dyn Fn(&str) -> bool) -> Result<String> {
    if let Some(mime) = declared_type(declared) {
        return Ok(mime);
    }
    if let Some(mime) = extension_type(path, supported) {
        return Ok(mime);
    }

    let mut file = std::fs::File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    (&mut file).take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    file.rewind()?;

    sniff(&head, || inspect_zip(file))
        .ok_or_else(|| ExtractumError::UnsupportedFormat(format!("Could not determine format of {}", path.display())))
}

/// Detect the MIME type of an in-memory document.
///
/// `name` is an optional file name hint (e.g. the last segment of a URL).
pub fn detect_for_bytes(
    content: &[u8],
    name: Option<&Path>,
    declared: Option<&str>,
    supported: &dyn Fn(&str) -> bool,
) -> Result<String> {
    if let Some(mime) = declared_type(declared) {
        return Ok(mime);
    }
    if let Some(mime) = name.and_then(|name| extension_type(name, supported)) {
        return Ok(mime);
    }

    let head = &content[..content.len().min(SNIFF_LEN)];
    sniff(head, || inspect_zip(std::io::Cursor::new(content)))
        .ok_or_else(|| ExtractumError::UnsupportedFormat("Could not determine format of input bytes".to_string()))
}

fn extension_type(path: &Path, supported: &dyn Fn(&str) -> bool) -> Option<String> {
    let mime = detect_from_path(path)?;
    if mime == OCTET_STREAM_MIME_TYPE || !supported(&mime) {
        tracing::debug!(path = %path.display(), mime_type = %mime, "extension type has no backend, sniffing content");
        return None;
    }
    Some(mime)
}

fn declared_type(declared: Option<&str>) -> Option<String> {
    declared
        .map(normalize_mime_type)
        .filter(|mime| !mime.is_empty() && mime != OCTET_STREAM_MIME_TYPE)
}

fn sniff(head: &[u8], zip_kind: impl FnOnce() -> Option<&'static str>) -> Option<String> {
    if let Some(kind) = infer::get(head) {
        let mime = kind.mime_type();
        if mime == ZIP_MIME_TYPE {
            return zip_kind().or(Some(ZIP_MIME_TYPE)).map(str::to_string);
        }
        return Some(normalize_mime_type(mime));
    }

    if looks_like_text(head) {
        return Some(PLAIN_TEXT_MIME_TYPE.to_string());
    }

    None
}

/// Identify OOXML word-processing packages by their parts.
#[cfg(feature = "office")]
fn inspect_zip<R: Read + Seek>(reader: R) -> Option<&'static str> {
    let archive = zip::ZipArchive::new(reader).ok()?;
    let has_part = |name: &str| archive.file_names().any(|n| n == name);

    if !has_part("word/document.xml") {
        return None;
    }
    let macro_enabled = has_part("word/vbaProject.bin");
    Some(if macro_enabled { DOCM_MIME_TYPE } else { DOCX_MIME_TYPE })
}

#[cfg(not(feature = "office"))]
fn inspect_zip<R: Read + Seek>(_reader: R) -> Option<&'static str> {
    None
}

/// BOM-marked, or free of NUL bytes with mostly printable characters.
pub fn looks_like_text(head: &[u8]) -> bool {
    if head.is_empty() {
        return true;
    }
    if encoding_rs::Encoding::for_bom(head).is_some() {
        return true;
    }
    if memchr::memchr(0, head).is_some() {
        return false;
    }

    match std::str::from_utf8(head) {
        Ok(_) => true,
        // A multi-byte sequence may be cut off at the sniffing boundary.
        Err(e) if e.error_len().is_none() => true,
        Err(_) => {
            let control = head
                .iter()
                .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0c))
                .count();
            control * 20 < head.len()
        }
    }
}
