//! End-to-end behavior of the extractor entry points on plain text sources.

mod common;

use common::read_in_chunks;
use extractum::{Charset, ErrorKind, Extractor, OutputFormat, StreamState, TRUNCATED_METADATA_KEY};
use std::fs;
use tempfile::tempdir;

/// Default extractor on a plain text file returns the source decoded as UTF-8.
#[test]
fn test_plain_text_to_string() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("poem.txt");
    let source = "Tyger Tyger, burning bright,\nIn the forests of the night;\nÜber alles.\n";
    fs::write(&path, source).unwrap();

    let (content, metadata) = Extractor::new().extract_file_to_string(&path).unwrap();

    assert_eq!(content, source);
    assert!(!metadata.is_empty());
    for i in 0..metadata.len() {
        let (key, value) = metadata.get(i).unwrap();
        assert!(!key.is_empty());
        assert_eq!(metadata.key(i), Some(key));
        assert_eq!(metadata.value(i), Some(value));
    }
    assert_eq!(metadata.get_value("Content-Encoding"), Some("UTF-8"));
}

/// An extension that only names a generic type does not block sniffing.
#[test]
fn test_generic_extension_is_sniffed() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("notes.bin");
    let txt = dir.path().join("notes.txt");
    fs::write(&bin, "plain readable text").unwrap();
    fs::write(&txt, "plain readable text").unwrap();

    let extractor = Extractor::new();
    let (from_bin, metadata) = extractor.extract_file_to_string(&bin).unwrap();
    let (from_txt, _) = extractor.extract_file_to_string(&txt).unwrap();
    assert_eq!(from_bin, "plain readable text");
    assert_eq!(from_bin, from_txt);
    assert_eq!(metadata.get_value("Content-Type"), Some("text/plain; charset=UTF-8"));
}

/// A max length of 10 on 1000 characters yields exactly 10, as a success.
#[test]
fn test_max_length_ten_of_thousand() {
    let source: String = "0123456789".repeat(100);
    assert_eq!(source.chars().count(), 1000);
    let extractor = Extractor::new().set_extract_string_max_length(10);

    let (content, metadata) = extractor.extract_bytes_to_string(source.as_bytes()).unwrap();
    assert_eq!(content.chars().count(), 10);
    assert_eq!(content, "0123456789");
    assert_eq!(metadata.get_value(TRUNCATED_METADATA_KEY), Some("true"));

    let (mut stream, _) = extractor.extract_bytes(source.as_bytes()).unwrap();
    assert_eq!(stream.read_all().unwrap(), b"0123456789");
    assert!(stream.is_truncated());
    assert_eq!(stream.state(), StreamState::Exhausted);
}

/// Output of exactly max length characters is not reported as truncated.
#[test]
fn test_exact_length_is_not_truncation() {
    let extractor = Extractor::new().set_extract_string_max_length(10);
    let (content, metadata) = extractor.extract_bytes_to_string(b"0123456789").unwrap();
    assert_eq!(content, "0123456789");
    assert_eq!(metadata.get_value(TRUNCATED_METADATA_KEY), None);
}

/// Concatenated stream chunks equal the to-string result for every output configuration.
#[test]
fn test_streaming_matches_to_string() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    let source = "# Heading\n\nSome *markdown* with <angle> & ampersand. Ça va? 日本語\n".repeat(200);
    fs::write(&path, &source).unwrap();

    let configurations = [
        (OutputFormat::PlainText, Charset::Utf8, usize::MAX),
        (OutputFormat::PlainText, Charset::UsAscii, 5000),
        (OutputFormat::PlainText, Charset::Utf16Be, 777),
        (OutputFormat::Markup, Charset::Utf8, usize::MAX),
        (OutputFormat::Markup, Charset::Utf16Be, 1234),
    ];

    for (format, charset, max_length) in configurations {
        let extractor = Extractor::new()
            .set_output_format(format)
            .set_encoding(charset)
            .set_extract_string_max_length(max_length);

        let (content, string_metadata) = extractor.extract_file_to_string(&path).unwrap();
        let (mut stream, stream_metadata) = extractor.extract_file(&path).unwrap();
        let streamed = read_in_chunks(&mut stream);

        let mut expected = Vec::new();
        match charset {
            Charset::Utf16Be => content.encode_utf16().for_each(|u| expected.extend_from_slice(&u.to_be_bytes())),
            _ => expected.extend_from_slice(content.as_bytes()),
        }
        assert_eq!(streamed, expected, "mismatch for {:?}/{:?}/{}", format, charset, max_length);
        assert_eq!(
            stream_metadata.get_value("Content-Type"),
            string_metadata.get_value("Content-Type")
        );
    }
}

/// Reads after exhaustion keep returning zero bytes.
#[test]
fn test_idempotent_end_of_stream() {
    let (mut stream, _) = Extractor::new().extract_bytes(b"short").unwrap();
    assert_eq!(stream.read_all().unwrap(), b"short");

    let mut buf = [0u8; 32];
    for _ in 0..5 {
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
        assert_eq!(stream.read_full(&mut buf).unwrap(), 0);
    }
    assert!(stream.read_all().unwrap().is_empty());
}

/// Large input is streamed without materializing it.
#[test]
fn test_large_file_streams() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("big.txt");
    let line = "The quick brown fox jumps over the lazy dog.\n";
    fs::write(&path, line.repeat(50_000)).unwrap();

    let (mut stream, _) = Extractor::new().extract_file(&path).unwrap();
    let mut buf = [0u8; extractum::DEFAULT_BUFFER_SIZE];
    let mut total = 0;
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        assert!(n <= buf.len());
        total += n;
    }
    assert_eq!(total, line.len() * 50_000);
}

#[test]
fn test_markup_output_for_text() {
    let (content, _) = Extractor::new()
        .set_xml_output(true)
        .extract_bytes_to_string(b"a < b & c")
        .unwrap();
    assert!(content.starts_with("<html xmlns=\"http://www.w3.org/1999/xhtml\"><head>"));
    assert!(content.contains("a &lt; b &amp; c"));
    assert!(content.ends_with("</body></html>"));
}

#[test]
fn test_us_ascii_replaces_non_ascii() {
    let (content, _) = Extractor::new()
        .set_encoding(Charset::UsAscii)
        .extract_bytes_to_string("naïve café".as_bytes())
        .unwrap();
    assert_eq!(content, "na?ve caf?");
}

#[test]
fn test_legacy_encoded_file_is_decoded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    fs::write(&path, b"Une cr\xe8me br\xfbl\xe9e, s'il vous pla\xeet.").unwrap();

    let (content, _) = Extractor::new().extract_file_to_string(&path).unwrap();
    assert_eq!(content, "Une crème brûlée, s'il vous plaît.");
}

#[test]
fn test_error_kinds() {
    let extractor = Extractor::new();
    let dir = tempdir().unwrap();

    assert_eq!(
        extractor.extract_file_to_string("").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        extractor.extract_bytes_to_string(&[]).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        extractor.extract_file_to_string(dir.path().join("absent.txt")).unwrap_err().kind(),
        ErrorKind::Io
    );
    assert_eq!(extractor.extract_file(dir.path()).unwrap_err().kind(), ErrorKind::Io);

    let binary = dir.path().join("blob");
    fs::write(&binary, [0x00, 0x13, 0x37, 0x00, 0x42, 0x00, 0x99, 0x00]).unwrap();
    assert_eq!(
        extractor.extract_file_to_string(&binary).unwrap_err().kind(),
        ErrorKind::UnsupportedFormat
    );
}

#[test]
fn test_error_messages_cover_every_kind() {
    for kind in ErrorKind::ALL {
        assert!(!extractum::error_message(kind).is_empty());
        assert!(!extractum::error_category(kind).is_empty());
    }
}

#[test]
fn test_extraction_does_not_change_extractor() {
    let extractor = Extractor::new().set_extract_string_max_length(3);
    let before = extractor.config();
    let _ = extractor.extract_bytes_to_string(b"abcdef").unwrap();
    let _ = extractor.extract_bytes_to_string(b"").unwrap_err();
    assert_eq!(extractor.config(), before);
}

#[test]
fn test_parallel_extractions_share_one_extractor() {
    let extractor = Extractor::new().set_extract_string_max_length(20);
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let extractor = extractor.clone();
            std::thread::spawn(move || {
                let source = format!("thread {} says hello to everyone", i);
                extractor.extract_bytes_to_string(source.as_bytes()).unwrap().0
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let content = handle.join().unwrap();
        let expected: String = format!("thread {} says hello to everyone", i).chars().take(20).collect();
        assert_eq!(content, expected);
    }
}
