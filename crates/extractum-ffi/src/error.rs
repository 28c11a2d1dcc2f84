//! Integer error codes and the thread-local last error.
//!
//! Every fallible function returns one of the `ERR_*` codes (or a `0` handle)
//! and records a detailed message retrievable with [`extractum_last_error`]
//! on the same thread. Codes are negative so that non-negative values stay
//! available for counts.
//!
//! | Code | Constant | Category |
//! |------|----------|----------|
//! | 0 | `ERR_OK` | success |
//! | -1 | `ERR_NULL_POINTER` | argument |
//! | -2 | `ERR_INVALID_UTF8` | argument |
//! | -3 | `ERR_INVALID_STRING` | argument |
//! | -4 | `ERR_EXTRACTION_FAILED` | extraction |
//! | -5 | `ERR_IO_ERROR` | io |
//! | -6 | `ERR_INVALID_CONFIG` | configuration |
//! | -7 | `ERR_INVALID_ENUM` | argument |
//! | -8 | `ERR_UNSUPPORTED_FORMAT` | format |
//! | -9 | `ERR_OUT_OF_MEMORY` | resource |
//! | -10 | `ERR_OCR_FAILED` | extraction |
//! | -11 | `ERR_INVALID_ARGUMENT` | argument |

use extractum::{ErrorKind, ExtractumError};
use std::cell::RefCell;
use std::ffi::{CString, c_char};
use std::ptr;

pub const ERR_OK: i32 = 0;
/// Null pointer argument, or a handle that was never issued, already released or consumed.
pub const ERR_NULL_POINTER: i32 = -1;
pub const ERR_INVALID_UTF8: i32 = -2;
/// Output text could not be represented as a C string (interior NUL).
pub const ERR_INVALID_STRING: i32 = -3;
pub const ERR_EXTRACTION_FAILED: i32 = -4;
pub const ERR_IO_ERROR: i32 = -5;
pub const ERR_INVALID_CONFIG: i32 = -6;
/// Integer outside the declared set of an enum (charset, OCR strategy, output format).
pub const ERR_INVALID_ENUM: i32 = -7;
pub const ERR_UNSUPPORTED_FORMAT: i32 = -8;
pub const ERR_OUT_OF_MEMORY: i32 = -9;
pub const ERR_OCR_FAILED: i32 = -10;
/// Empty path, URL or buffer, or an index out of range.
pub const ERR_INVALID_ARGUMENT: i32 = -11;

/// Every code this library can return, success included.
pub const ALL_ERROR_CODES: [i32; 12] = [
    ERR_OK,
    ERR_NULL_POINTER,
    ERR_INVALID_UTF8,
    ERR_INVALID_STRING,
    ERR_EXTRACTION_FAILED,
    ERR_IO_ERROR,
    ERR_INVALID_CONFIG,
    ERR_INVALID_ENUM,
    ERR_UNSUPPORTED_FORMAT,
    ERR_OUT_OF_MEMORY,
    ERR_OCR_FAILED,
    ERR_INVALID_ARGUMENT,
];

/// Failure of one FFI call: the code returned to C plus the detail kept as last error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FfiError {
    pub(crate) code: i32,
    pub(crate) message: String,
}

impl FfiError {
    pub(crate) fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn null_pointer(what: &str) -> Self {
        Self::new(ERR_NULL_POINTER, format!("{} cannot be NULL", what))
    }
}

/// Code for an error kind of the core library.
pub(crate) fn code_for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidArgument => ERR_INVALID_ARGUMENT,
        ErrorKind::ExtractionFailed => ERR_EXTRACTION_FAILED,
        ErrorKind::Io => ERR_IO_ERROR,
        ErrorKind::InvalidConfiguration => ERR_INVALID_CONFIG,
        ErrorKind::UnsupportedFormat => ERR_UNSUPPORTED_FORMAT,
        ErrorKind::OutOfMemory => ERR_OUT_OF_MEMORY,
        ErrorKind::OcrFailed => ERR_OCR_FAILED,
    }
}

impl From<ExtractumError> for FfiError {
    fn from(err: ExtractumError) -> Self {
        Self::new(code_for_kind(err.kind()), err.to_string())
    }
}

/// Static, NUL-terminated description of `code`.
fn message_for_code(code: i32) -> &'static str {
    match code {
        ERR_OK => "No error\0",
        ERR_NULL_POINTER => "Null pointer or invalid handle provided\0",
        ERR_INVALID_UTF8 => "Invalid UTF-8 string\0",
        ERR_INVALID_STRING => "String conversion failed\0",
        ERR_EXTRACTION_FAILED => "Document extraction failed\0",
        ERR_IO_ERROR => "File system or network I/O error\0",
        ERR_INVALID_CONFIG => "Invalid configuration value\0",
        ERR_INVALID_ENUM => "Invalid enum value\0",
        ERR_UNSUPPORTED_FORMAT => "Unsupported file format\0",
        ERR_OUT_OF_MEMORY => "Memory allocation failed\0",
        ERR_OCR_FAILED => "OCR operation failed\0",
        ERR_INVALID_ARGUMENT => "Invalid argument provided\0",
        _ => "Unknown error\0",
    }
}

fn category_for_code(code: i32) -> &'static str {
    match code {
        ERR_OK => "success\0",
        ERR_NULL_POINTER | ERR_INVALID_UTF8 | ERR_INVALID_STRING | ERR_INVALID_ENUM | ERR_INVALID_ARGUMENT => {
            "argument\0"
        }
        ERR_INVALID_CONFIG => "configuration\0",
        ERR_IO_ERROR => "io\0",
        ERR_UNSUPPORTED_FORMAT => "format\0",
        ERR_EXTRACTION_FAILED | ERR_OCR_FAILED => "extraction\0",
        ERR_OUT_OF_MEMORY => "resource\0",
        _ => "unknown\0",
    }
}

/// Describe an error code.
///
/// Returns a static string that must not be freed. Unknown codes yield
/// `"Unknown error"`, so the result is never NULL or empty.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_error_message(code: i32) -> *const c_char {
    message_for_code(code).as_ptr() as *const c_char
}

/// Coarse category of an error code: `"success"`, `"argument"`, `"configuration"`,
/// `"io"`, `"format"`, `"extraction"`, `"resource"` or `"unknown"`.
///
/// Returns a static string that must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_error_category(code: i32) -> *const c_char {
    category_for_code(code).as_ptr() as *const c_char
}

struct LastError {
    code: i32,
    message: CString,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

pub(crate) fn set_last_error(err: FfiError) {
    tracing::debug!(code = err.code, message = %err.message, "FFI call failed");
    let message = CString::new(err.message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|last| {
        *last.borrow_mut() = Some(LastError {
            code: err.code,
            message,
        })
    });
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|last| *last.borrow_mut() = None);
}

/// Detailed message of the last failed call on this thread.
///
/// Returns NULL when the last call succeeded. The string is owned by the
/// library and stays valid until the next call into the library on the same
/// thread; copy it if you need it longer.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_last_error() -> *const c_char {
    LAST_ERROR.with(|last| match &*last.borrow() {
        Some(err) => err.message.as_ptr(),
        None => ptr::null(),
    })
}

/// Code of the last failed call on this thread, `ERR_OK` when it succeeded.
///
/// Useful after functions that return a handle, where failure is only
/// signalled by a `0` handle.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_last_error_code() -> i32 {
    LAST_ERROR.with(|last| last.borrow().as_ref().map_or(ERR_OK, |err| err.code))
}

/// Forget the last error of this thread.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_clear_last_error() {
    clear_last_error();
}

/// Run a status-returning call: clears the last error, records it on failure.
pub(crate) fn status(call: impl FnOnce() -> Result<(), FfiError>) -> i32 {
    clear_last_error();
    match call() {
        Ok(()) => ERR_OK,
        Err(err) => {
            let code = err.code;
            set_last_error(err);
            code
        }
    }
}

/// Run a handle-returning call: `0` on failure with the last error recorded.
pub(crate) fn handle_or_zero(call: impl FnOnce() -> Result<u64, FfiError>) -> u64 {
    clear_last_error();
    match call() {
        Ok(handle) => handle,
        Err(err) => {
            set_last_error(err);
            crate::handles::INVALID_HANDLE
        }
    }
}
