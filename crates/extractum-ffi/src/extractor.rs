//! Extractor handles and the six extraction entry points.
//!
//! Setters follow the same consume-and-return protocol as the configuration
//! handles. Attaching a configuration consumes both the extractor handle and
//! the configuration handle; both are checked before either is consumed.
//!
//! Extraction calls return an `ERR_*` code and write their results through
//! out-pointers. On success both outputs are set; on failure the content
//! output is NULL (or `0` for a stream) and the metadata output is `0`.
//!
//! # Example (C)
//!
//! ```c
//! ExtractumHandle extractor = extractum_extractor_new();
//! extractor = extractum_extractor_set_extract_string_max_length(extractor, 1000);
//!
//! char *content = NULL;
//! ExtractumHandle metadata = 0;
//! int rc = extractum_extractor_extract_file_to_string(extractor, "report.pdf", &content, &metadata);
//! if (rc == ERR_OK) {
//!     puts(content);
//!     extractum_string_free(content);
//!     extractum_metadata_free(metadata);
//! } else {
//!     fprintf(stderr, "%s: %s\n", extractum_error_message(rc), extractum_last_error());
//! }
//! extractum_extractor_free(extractor);
//! ```

use crate::config::{OCR_CONFIGS, OFFICE_CONFIGS, PDF_CONFIGS};
use crate::error::{ERR_INVALID_CONFIG, ERR_INVALID_ENUM, ERR_INVALID_STRING, FfiError, handle_or_zero, status};
use crate::handles::{ExtractumHandle, HandleTable, INVALID_HANDLE};
use crate::metadata::METADATA;
use crate::stream::STREAMS;
use crate::{into_c_string, str_arg};
use extractum::{Charset, ContentStream, Extractor, ExtractorConfig, Metadata, OutputFormat};
use once_cell::sync::Lazy;
use std::ffi::{CString, c_char};
use std::ptr;

pub(crate) static EXTRACTORS: Lazy<HandleTable<Extractor>> = Lazy::new(|| HandleTable::new("Extractor"));

pub const CHARSET_UTF_8: i32 = 0;
pub const CHARSET_US_ASCII: i32 = 1;
pub const CHARSET_UTF_16BE: i32 = 2;

pub const OUTPUT_FORMAT_PLAIN_TEXT: i32 = 0;
pub const OUTPUT_FORMAT_MARKUP: i32 = 1;

/// Snapshot of the extractor behind `handle`. Extractors are cheap to clone,
/// so the handle is unlocked while the extraction runs.
fn extractor_for(handle: ExtractumHandle) -> Result<Extractor, FfiError> {
    Ok(EXTRACTORS.get(handle)?.lock().clone())
}

fn update(handle: ExtractumHandle, apply: impl FnOnce(Extractor) -> Result<Extractor, FfiError>) -> ExtractumHandle {
    crate::config::rebuild(&EXTRACTORS, handle, apply)
}

fn attach<C: Clone>(
    handle: ExtractumHandle,
    configs: &HandleTable<C>,
    config: ExtractumHandle,
    apply: impl FnOnce(Extractor, C) -> Extractor,
) -> ExtractumHandle {
    handle_or_zero(|| {
        EXTRACTORS.get(handle)?;
        configs.get(config)?;
        let extractor = EXTRACTORS.take(handle)?;
        let config = configs.take(config)?;
        Ok(EXTRACTORS.insert(apply(extractor, config)))
    })
}

/// Create an extractor with default settings.
///
/// Release with `extractum_extractor_free`.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_new() -> ExtractumHandle {
    EXTRACTORS.insert(Extractor::new())
}

/// Create an extractor from a JSON document with the shape of `ExtractorConfig`:
///
/// ```json
/// {"max_length": 1000, "encoding": "utf-8", "output_format": "markup",
///  "pdf": {"ocr_strategy": "auto"}, "ocr": {"language": "deu"}}
/// ```
///
/// Returns `0` with `ERR_INVALID_CONFIG` for malformed JSON or invalid values.
///
/// # Safety
///
/// - `json` must be NULL or a valid null-terminated C string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_from_json(json: *const c_char) -> ExtractumHandle {
    handle_or_zero(|| {
        // SAFETY: caller guarantees `json` is NULL or a valid C string
        let json = unsafe { str_arg(json, "json") }?;
        let config = ExtractorConfig::from_json_str(json)?;
        Ok(EXTRACTORS.insert(Extractor::from_config(&config)?))
    })
}

/// Serialize the extractor's settings as JSON into `*out_json`.
///
/// The string must be released with `extractum_string_free`.
///
/// # Safety
///
/// - `out_json` must be a valid pointer to writable `char*` storage
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_config_json(handle: ExtractumHandle, out_json: *mut *mut c_char) -> i32 {
    status(|| {
        if out_json.is_null() {
            return Err(FfiError::null_pointer("out_json"));
        }
        // SAFETY: checked non-null above
        unsafe { *out_json = ptr::null_mut() };
        let config = extractor_for(handle)?.config();
        let json = serde_json::to_string(&config)
            .map_err(|e| FfiError::new(ERR_INVALID_CONFIG, format!("Failed to serialize configuration: {}", e)))?;
        // SAFETY: checked non-null above
        unsafe { *out_json = into_c_string(json)? };
        Ok(())
    })
}

/// Release an extractor handle (live or consumed).
///
/// Streams and metadata produced by the extractor stay valid.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_free(handle: ExtractumHandle) -> i32 {
    status(|| EXTRACTORS.release(handle))
}

/// Maximum output length in characters. Longer output is clipped, which is not an error.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_set_extract_string_max_length(
    handle: ExtractumHandle,
    max_length: usize,
) -> ExtractumHandle {
    update(handle, |extractor| Ok(extractor.set_extract_string_max_length(max_length)))
}

/// Output charset (`CHARSET_*`). Values outside the set fail with `ERR_INVALID_ENUM`.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_set_encoding(handle: ExtractumHandle, charset: i32) -> ExtractumHandle {
    update(handle, |extractor| {
        let charset = Charset::try_from(charset).map_err(|e| FfiError::new(ERR_INVALID_ENUM, e.to_string()))?;
        Ok(extractor.set_encoding(charset))
    })
}

/// Output shape (`OUTPUT_FORMAT_*`). Values outside the set fail with `ERR_INVALID_ENUM`.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_set_output_format(handle: ExtractumHandle, format: i32) -> ExtractumHandle {
    update(handle, |extractor| {
        let format = OutputFormat::try_from(format).map_err(|e| FfiError::new(ERR_INVALID_ENUM, e.to_string()))?;
        Ok(extractor.set_output_format(format))
    })
}

/// Shorthand for markup (`true`) or plain text (`false`) output.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_set_xml_output(handle: ExtractumHandle, xml_output: bool) -> ExtractumHandle {
    update(handle, |extractor| Ok(extractor.set_xml_output(xml_output)))
}

/// Attach a PDF configuration, replacing any previous one. Consumes both handles.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_set_pdf_config(handle: ExtractumHandle, config: ExtractumHandle) -> ExtractumHandle {
    attach(handle, &PDF_CONFIGS, config, Extractor::set_pdf_config)
}

/// Attach an Office configuration, replacing any previous one. Consumes both handles.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_set_office_config(
    handle: ExtractumHandle,
    config: ExtractumHandle,
) -> ExtractumHandle {
    attach(handle, &OFFICE_CONFIGS, config, Extractor::set_office_config)
}

/// Attach an OCR configuration, replacing any previous one. Consumes both handles.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_extractor_set_ocr_config(handle: ExtractumHandle, config: ExtractumHandle) -> ExtractumHandle {
    attach(handle, &OCR_CONFIGS, config, Extractor::set_ocr_config)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Validate and reset the two out-pointers of an extraction call.
///
/// # Safety
///
/// Non-null pointers must be valid for writes.
unsafe fn prepare_outputs<T>(out_content: *mut T, empty: T, out_metadata: *mut ExtractumHandle) -> Result<(), FfiError> {
    if out_content.is_null() {
        return Err(FfiError::null_pointer("content output"));
    }
    if out_metadata.is_null() {
        return Err(FfiError::null_pointer("out_metadata"));
    }
    // SAFETY: both checked non-null, validity is the caller's contract
    unsafe {
        *out_content = empty;
        *out_metadata = INVALID_HANDLE;
    }
    Ok(())
}

/// # Safety
///
/// Both pointers were checked by [`prepare_outputs`].
unsafe fn deliver_string(
    result: extractum::Result<(String, Metadata)>,
    out_content: *mut *mut c_char,
    out_metadata: *mut ExtractumHandle,
) -> Result<(), FfiError> {
    let (content, metadata) = result?;
    let content = CString::new(content).map_err(|e| {
        FfiError::new(
            ERR_INVALID_STRING,
            format!("Extracted text contains a NUL byte at offset {}", e.nul_position()),
        )
    })?;
    // SAFETY: see function contract
    unsafe {
        *out_content = content.into_raw();
        *out_metadata = METADATA.insert(metadata);
    }
    Ok(())
}

/// # Safety
///
/// Both pointers were checked by [`prepare_outputs`].
unsafe fn deliver_stream(
    result: extractum::Result<(ContentStream, Metadata)>,
    out_stream: *mut ExtractumHandle,
    out_metadata: *mut ExtractumHandle,
) -> Result<(), FfiError> {
    let (stream, metadata) = result?;
    // SAFETY: see function contract
    unsafe {
        *out_stream = STREAMS.insert(stream);
        *out_metadata = METADATA.insert(metadata);
    }
    Ok(())
}

/// # Safety
///
/// `data` must be NULL or valid for reads of `len` bytes.
unsafe fn bytes_arg<'a>(data: *const u8, len: usize) -> Result<&'a [u8], FfiError> {
    if data.is_null() {
        return Err(FfiError::null_pointer("data"));
    }
    // SAFETY: non-null, length is the caller's contract
    Ok(unsafe { std::slice::from_raw_parts(data, len) })
}

/// Extract a file's text into a newly allocated string.
///
/// # Safety
///
/// - `path` must be NULL or a valid null-terminated C string
/// - `out_content` and `out_metadata` must be valid for writes
/// - on success `*out_content` must be released with `extractum_string_free`
///   and `*out_metadata` with `extractum_metadata_free`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_extract_file_to_string(
    handle: ExtractumHandle,
    path: *const c_char,
    out_content: *mut *mut c_char,
    out_metadata: *mut ExtractumHandle,
) -> i32 {
    status(|| {
        // SAFETY: forwarded caller contract
        unsafe { prepare_outputs(out_content, ptr::null_mut(), out_metadata) }?;
        let extractor = extractor_for(handle)?;
        let path = unsafe { str_arg(path, "path") }?;
        unsafe { deliver_string(extractor.extract_file_to_string(path), out_content, out_metadata) }
    })
}

/// Extract a file's text as a stream handle.
///
/// # Safety
///
/// - `path` must be NULL or a valid null-terminated C string
/// - `out_stream` and `out_metadata` must be valid for writes
/// - on success release `*out_stream` with `extractum_stream_free` and
///   `*out_metadata` with `extractum_metadata_free`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_extract_file(
    handle: ExtractumHandle,
    path: *const c_char,
    out_stream: *mut ExtractumHandle,
    out_metadata: *mut ExtractumHandle,
) -> i32 {
    status(|| {
        // SAFETY: forwarded caller contract
        unsafe { prepare_outputs(out_stream, INVALID_HANDLE, out_metadata) }?;
        let extractor = extractor_for(handle)?;
        let path = unsafe { str_arg(path, "path") }?;
        unsafe { deliver_stream(extractor.extract_file(path), out_stream, out_metadata) }
    })
}

/// Extract text from an in-memory document into a newly allocated string.
///
/// # Safety
///
/// - `data` must be NULL or valid for reads of `len` bytes
/// - `out_content` and `out_metadata` must be valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_extract_bytes_to_string(
    handle: ExtractumHandle,
    data: *const u8,
    len: usize,
    out_content: *mut *mut c_char,
    out_metadata: *mut ExtractumHandle,
) -> i32 {
    status(|| {
        // SAFETY: forwarded caller contract
        unsafe { prepare_outputs(out_content, ptr::null_mut(), out_metadata) }?;
        let extractor = extractor_for(handle)?;
        let data = unsafe { bytes_arg(data, len) }?;
        unsafe { deliver_string(extractor.extract_bytes_to_string(data), out_content, out_metadata) }
    })
}

/// Extract text from an in-memory document as a stream handle.
///
/// The document is copied, so `data` may be released as soon as the call returns.
///
/// # Safety
///
/// - `data` must be NULL or valid for reads of `len` bytes
/// - `out_stream` and `out_metadata` must be valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_extract_bytes(
    handle: ExtractumHandle,
    data: *const u8,
    len: usize,
    out_stream: *mut ExtractumHandle,
    out_metadata: *mut ExtractumHandle,
) -> i32 {
    status(|| {
        // SAFETY: forwarded caller contract
        unsafe { prepare_outputs(out_stream, INVALID_HANDLE, out_metadata) }?;
        let extractor = extractor_for(handle)?;
        let data = unsafe { bytes_arg(data, len) }?;
        unsafe { deliver_stream(extractor.extract_bytes(data), out_stream, out_metadata) }
    })
}

/// Fetch a URL and extract its text into a newly allocated string.
///
/// # Safety
///
/// - `url` must be NULL or a valid null-terminated C string
/// - `out_content` and `out_metadata` must be valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_extract_url_to_string(
    handle: ExtractumHandle,
    url: *const c_char,
    out_content: *mut *mut c_char,
    out_metadata: *mut ExtractumHandle,
) -> i32 {
    status(|| {
        // SAFETY: forwarded caller contract
        unsafe { prepare_outputs(out_content, ptr::null_mut(), out_metadata) }?;
        let extractor = extractor_for(handle)?;
        let url = unsafe { str_arg(url, "url") }?;
        unsafe { deliver_string(extractor.extract_url_to_string(url), out_content, out_metadata) }
    })
}

/// Fetch a URL and extract its text as a stream handle.
///
/// # Safety
///
/// - `url` must be NULL or a valid null-terminated C string
/// - `out_stream` and `out_metadata` must be valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_extractor_extract_url(
    handle: ExtractumHandle,
    url: *const c_char,
    out_stream: *mut ExtractumHandle,
    out_metadata: *mut ExtractumHandle,
) -> i32 {
    status(|| {
        // SAFETY: forwarded caller contract
        unsafe { prepare_outputs(out_stream, INVALID_HANDLE, out_metadata) }?;
        let extractor = extractor_for(handle)?;
        let url = unsafe { str_arg(url, "url") }?;
        unsafe { deliver_stream(extractor.extract_url(url), out_stream, out_metadata) }
    })
}
