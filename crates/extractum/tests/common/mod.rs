//! Shared fixtures for integration tests.
//!
//! Documents are built in code so the tests carry no binary files.

#![allow(dead_code)]

use extractum::plugins::{OcrBackend, Plugin};
use extractum::{FetchedDocument, OcrConfig, Result, UrlFetcher};
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Route extractor logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// OCR backend returning a fixed text and counting invocations.
pub struct MockOcr {
    text: String,
    calls: AtomicUsize,
    languages: Mutex<Vec<String>>,
}

impl MockOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

impl Plugin for MockOcr {
    fn name(&self) -> &str {
        "mock-ocr"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }
}

impl OcrBackend for MockOcr {
    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, image: &[u8], config: &OcrConfig) -> Result<String> {
        assert!(!image.is_empty(), "OCR received an empty image");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(config.language().to_string());
        Ok(self.text.clone())
    }
}

/// OCR backend that reports itself available but fails every recognition.
pub struct BrokenOcr;

impl Plugin for BrokenOcr {
    fn name(&self) -> &str {
        "broken-ocr"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }
}

impl OcrBackend for BrokenOcr {
    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, _image: &[u8], _config: &OcrConfig) -> Result<String> {
        Err(extractum::ExtractumError::ocr("engine crashed"))
    }
}

/// URL fetcher serving one canned response and recording requested URLs.
pub struct MockFetcher {
    body: Vec<u8>,
    content_type: Option<String>,
    final_url: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new(body: &[u8], content_type: Option<&str>) -> Self {
        Self {
            body: body.to_vec(),
            content_type: content_type.map(str::to_string),
            final_url: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Pretend the request was redirected to `url`.
    pub fn redirect_to(mut self, url: &str) -> Self {
        self.final_url = Some(url.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl UrlFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(FetchedDocument {
            bytes: self.body.clone(),
            content_type: self.content_type.clone(),
            final_url: self.final_url.clone().unwrap_or_else(|| url.to_string()),
        })
    }
}

/// Fetcher that always fails like an unreachable host.
pub struct UnreachableFetcher;

impl UrlFetcher for UnreachableFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        Err(extractum::ExtractumError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            format!("connection refused: {}", url),
        )))
    }
}

/// A scanned document: one page whose only content is a grayscale image.
#[cfg(feature = "pdf")]
pub fn scanned_pdf() -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let pixels: Vec<u8> = (0..16u8).map(|i| if i % 3 == 0 { 0 } else { 255 }).collect();
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 4,
            "Height" => 4,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        pixels,
    ));
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![400.into(), 0.into(), 0.into(), 400.into(), 100.into(), 300.into()]),
            Operation::new("Do", vec!["Scan0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "XObject" => dictionary! { "Scan0" => image_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Scanned Letter"),
        "Producer" => Object::string_literal("Scanner 3000"),
    });
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A WordprocessingML package with the given body paragraphs and core title.
/// Paragraph text is inserted as-is and must already be XML-escaped.
#[cfg(feature = "office")]
pub fn docx(paragraphs: &[&str], title: &str) -> Vec<u8> {
    use zip::CompressionMethod;
    use zip::write::{FileOptions, ZipWriter};

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    let core = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>Ada Lovelace</dc:creator></cp:coreProperties>"#,
        title
    );

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
        for (name, content) in [("word/document.xml", document.as_str()), ("docProps/core.xml", core.as_str())] {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

/// Drain a stream with reads of varying sizes.
pub fn read_in_chunks(stream: &mut extractum::ContentStream) -> Vec<u8> {
    let sizes = [1usize, 7, 64, 3, 4096];
    let mut out = Vec::new();
    let mut buf = vec![0u8; 4096];
    let mut i = 0;
    loop {
        let size = sizes[i % sizes.len()];
        i += 1;
        let n = if i % 2 == 0 {
            stream.read_full(&mut buf[..size]).unwrap()
        } else {
            stream.read(&mut buf[..size]).unwrap()
        };
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    out
}
