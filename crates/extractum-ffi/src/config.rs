//! PDF, Office and OCR configuration handles.
//!
//! Every setter consumes its input handle and returns a fresh one carrying
//! the updated value. On failure it returns `0`. Once the input handle has
//! been recognised it is consumed even if the call fails (an out-of-range
//! enum or malformed text), so the caller never observes a half-applied or
//! clamped value. An unknown or already consumed input handle fails with
//! `ERR_NULL_POINTER` and changes nothing.
//!
//! # Example (C)
//!
//! ```c
//! ExtractumHandle pdf = extractum_pdf_config_new();
//! pdf = extractum_pdf_config_set_ocr_strategy(pdf, PDF_OCR_STRATEGY_AUTO);
//! pdf = extractum_pdf_config_set_extract_annotation_text(pdf, true);
//! if (pdf == 0) {
//!     fprintf(stderr, "%s\n", extractum_last_error());
//! }
//! ```

use crate::error::{ERR_INVALID_ENUM, FfiError, handle_or_zero, status};
use crate::handles::{ExtractumHandle, HandleTable};
use crate::str_arg;
use extractum::{OcrConfig, OfficeConfig, PdfConfig, PdfOcrStrategy};
use once_cell::sync::Lazy;
use std::ffi::c_char;

pub(crate) static PDF_CONFIGS: Lazy<HandleTable<PdfConfig>> = Lazy::new(|| HandleTable::new("PdfConfig"));
pub(crate) static OFFICE_CONFIGS: Lazy<HandleTable<OfficeConfig>> = Lazy::new(|| HandleTable::new("OfficeConfig"));
pub(crate) static OCR_CONFIGS: Lazy<HandleTable<OcrConfig>> = Lazy::new(|| HandleTable::new("OcrConfig"));

pub const PDF_OCR_STRATEGY_NO_OCR: i32 = 0;
pub const PDF_OCR_STRATEGY_OCR_ONLY: i32 = 1;
pub const PDF_OCR_STRATEGY_OCR_AND_TEXT_EXTRACTION: i32 = 2;
pub const PDF_OCR_STRATEGY_AUTO: i32 = 3;

/// Consume `handle`, apply `update` and register the result under a new handle.
pub(crate) fn rebuild<T: Clone>(
    table: &HandleTable<T>,
    handle: ExtractumHandle,
    update: impl FnOnce(T) -> Result<T, FfiError>,
) -> ExtractumHandle {
    handle_or_zero(|| {
        let value = table.take(handle)?;
        Ok(table.insert(update(value)?))
    })
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

/// Create a PDF configuration with default values.
///
/// Release with `extractum_pdf_config_free` unless it is attached to an extractor.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_pdf_config_new() -> ExtractumHandle {
    PDF_CONFIGS.insert(PdfConfig::new())
}

/// Release a PDF configuration handle (live or consumed).
#[unsafe(no_mangle)]
pub extern "C" fn extractum_pdf_config_free(handle: ExtractumHandle) -> i32 {
    status(|| PDF_CONFIGS.release(handle))
}

/// Set the OCR strategy (`PDF_OCR_STRATEGY_*`). Values outside the set fail
/// with `ERR_INVALID_ENUM`.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_pdf_config_set_ocr_strategy(handle: ExtractumHandle, strategy: i32) -> ExtractumHandle {
    rebuild(&PDF_CONFIGS, handle, |config| {
        let strategy =
            PdfOcrStrategy::try_from(strategy).map_err(|e| FfiError::new(ERR_INVALID_ENUM, e.to_string()))?;
        Ok(config.set_ocr_strategy(strategy))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_pdf_config_set_extract_inline_images(handle: ExtractumHandle, value: bool) -> ExtractumHandle {
    rebuild(&PDF_CONFIGS, handle, |config| Ok(config.set_extract_inline_images(value)))
}

/// Only meaningful together with inline image extraction.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_pdf_config_set_extract_unique_inline_images_only(
    handle: ExtractumHandle,
    value: bool,
) -> ExtractumHandle {
    rebuild(&PDF_CONFIGS, handle, |config| {
        Ok(config.set_extract_unique_inline_images_only(value))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_pdf_config_set_extract_marked_content(handle: ExtractumHandle, value: bool) -> ExtractumHandle {
    rebuild(&PDF_CONFIGS, handle, |config| Ok(config.set_extract_marked_content(value)))
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_pdf_config_set_extract_annotation_text(
    handle: ExtractumHandle,
    value: bool,
) -> ExtractumHandle {
    rebuild(&PDF_CONFIGS, handle, |config| Ok(config.set_extract_annotation_text(value)))
}

// ---------------------------------------------------------------------------
// Office
// ---------------------------------------------------------------------------

/// Create an Office configuration with default values.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_office_config_new() -> ExtractumHandle {
    OFFICE_CONFIGS.insert(OfficeConfig::new())
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_office_config_free(handle: ExtractumHandle) -> i32 {
    status(|| OFFICE_CONFIGS.release(handle))
}

/// List macro projects of macro-enabled documents. Off by default.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_office_config_set_extract_macros(handle: ExtractumHandle, value: bool) -> ExtractumHandle {
    rebuild(&OFFICE_CONFIGS, handle, |config| Ok(config.set_extract_macros(value)))
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_office_config_set_include_deleted_content(
    handle: ExtractumHandle,
    value: bool,
) -> ExtractumHandle {
    rebuild(&OFFICE_CONFIGS, handle, |config| Ok(config.set_include_deleted_content(value)))
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_office_config_set_include_move_from_content(
    handle: ExtractumHandle,
    value: bool,
) -> ExtractumHandle {
    rebuild(&OFFICE_CONFIGS, handle, |config| {
        Ok(config.set_include_move_from_content(value))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_office_config_set_include_shape_based_content(
    handle: ExtractumHandle,
    value: bool,
) -> ExtractumHandle {
    rebuild(&OFFICE_CONFIGS, handle, |config| {
        Ok(config.set_include_shape_based_content(value))
    })
}

// ---------------------------------------------------------------------------
// OCR
// ---------------------------------------------------------------------------

/// Create an OCR configuration with default values (`eng`, 300 DPI, depth 32).
#[unsafe(no_mangle)]
pub extern "C" fn extractum_ocr_config_new() -> ExtractumHandle {
    OCR_CONFIGS.insert(OcrConfig::new())
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_ocr_config_free(handle: ExtractumHandle) -> i32 {
    status(|| OCR_CONFIGS.release(handle))
}

/// Set the recognition language, `+`-joined for several (`"eng+deu"`).
///
/// # Safety
///
/// - `language` must be NULL or a valid null-terminated C string
/// - NULL fails with `ERR_NULL_POINTER`, invalid UTF-8 with `ERR_INVALID_UTF8`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_ocr_config_set_language(
    handle: ExtractumHandle,
    language: *const c_char,
) -> ExtractumHandle {
    rebuild(&OCR_CONFIGS, handle, |config| {
        // SAFETY: caller guarantees `language` is NULL or a valid C string
        let language = unsafe { str_arg(language, "language") }?;
        Ok(config.set_language(language))
    })
}

/// Rendering density in DPI. `0` is rejected when an extraction validates the config.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_ocr_config_set_density(handle: ExtractumHandle, dpi: u32) -> ExtractumHandle {
    rebuild(&OCR_CONFIGS, handle, |config| Ok(config.set_density(dpi)))
}

/// Color depth in bits: 1, 8, 24 or 32.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_ocr_config_set_depth(handle: ExtractumHandle, bits: u32) -> ExtractumHandle {
    rebuild(&OCR_CONFIGS, handle, |config| Ok(config.set_depth(bits)))
}

#[unsafe(no_mangle)]
pub extern "C" fn extractum_ocr_config_set_enable_image_preprocessing(
    handle: ExtractumHandle,
    value: bool,
) -> ExtractumHandle {
    rebuild(&OCR_CONFIGS, handle, |config| {
        Ok(config.set_enable_image_preprocessing(value))
    })
}

/// Per-invocation OCR timeout; `0` means unbounded.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_ocr_config_set_timeout_seconds(handle: ExtractumHandle, seconds: u64) -> ExtractumHandle {
    rebuild(&OCR_CONFIGS, handle, |config| Ok(config.set_timeout_seconds(seconds)))
}

/// Check an OCR configuration without running an extraction.
///
/// Returns `ERR_INVALID_CONFIG` for an empty or malformed language list,
/// density 0 or an unsupported depth.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_ocr_config_validate(handle: ExtractumHandle) -> i32 {
    status(|| {
        let config = OCR_CONFIGS.get(handle)?;
        let result = config.lock().validate();
        result.map_err(FfiError::from)
    })
}
