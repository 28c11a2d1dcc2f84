//! C bindings for the extractum document extraction library.
//!
//! Objects never cross the boundary as pointers. Configurations, extractors,
//! content streams and metadata are owned by the library and named by
//! `ExtractumHandle` tokens (see [`handles`]). Fallible calls return an
//! `ERR_*` code, or a `0` handle for constructors and setters, and record a
//! detailed message readable with `extractum_last_error()`.
//!
//! Only strings are handed out as raw memory. Every `char*` returned by the
//! library is released with [`extractum_string_free`].
//!
//! # Example (C)
//!
//! ```c
//! ExtractumHandle ocr = extractum_ocr_config_set_language(extractum_ocr_config_new(), "deu");
//! ExtractumHandle pdf = extractum_pdf_config_set_ocr_strategy(extractum_pdf_config_new(),
//!                                                             PDF_OCR_STRATEGY_AUTO);
//! ExtractumHandle extractor = extractum_extractor_new();
//! extractor = extractum_extractor_set_ocr_config(extractor, ocr);
//! extractor = extractum_extractor_set_pdf_config(extractor, pdf);
//!
//! ExtractumHandle stream = 0, metadata = 0;
//! if (extractum_extractor_extract_file(extractor, "scan.pdf", &stream, &metadata) == ERR_OK) {
//!     uint8_t buf[4096];
//!     size_t n;
//!     while (extractum_stream_read(stream, buf, sizeof buf, &n) == ERR_OK && n > 0) {
//!         fwrite(buf, 1, n, stdout);
//!     }
//!     extractum_stream_free(stream);
//!     extractum_metadata_free(metadata);
//! }
//! extractum_extractor_free(extractor);
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod handles;
pub mod metadata;
pub mod stream;

pub use config::*;
pub use error::*;
pub use extractor::*;
pub use handles::{ExtractumHandle, INVALID_HANDLE};
pub use metadata::*;
pub use stream::*;

use crate::error::FfiError;
use std::ffi::{CStr, CString, c_char};

/// Borrow a C string argument as `&str`.
///
/// # Safety
///
/// `ptr` must be NULL or point to a valid null-terminated string that
/// outlives the returned reference.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, FfiError> {
    if ptr.is_null() {
        return Err(FfiError::null_pointer(what));
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|e| FfiError::new(ERR_INVALID_UTF8, format!("Invalid UTF-8 in {}: {}", what, e)))
}

/// Hand a string to C. Released with [`extractum_string_free`].
pub(crate) fn into_c_string(text: String) -> Result<*mut c_char, FfiError> {
    CString::new(text)
        .map(CString::into_raw)
        .map_err(|e| FfiError::new(ERR_INVALID_STRING, format!("String contains a NUL byte: {}", e)))
}

/// Free a string returned by this library.
///
/// # Safety
///
/// - `s` must be a string previously returned by an extractum function
/// - `s` can be NULL (no-op)
/// - `s` must not be used after this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_string_free(s: *mut c_char) {
    if !s.is_null() {
        // SAFETY: caller must ensure s was returned by an extractum function
        unsafe { drop(CString::from_raw(s)) };
    }
}

/// Version of the bindings. Static, must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
