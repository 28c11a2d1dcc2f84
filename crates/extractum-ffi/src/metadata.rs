//! Metadata handles.
//!
//! Entries are addressed by index in document order. Keys are unique; a key
//! with several values has them joined with `,`.

use crate::error::{ERR_INVALID_ARGUMENT, FfiError, status};
use crate::handles::{ExtractumHandle, HandleTable};
use crate::into_c_string;
use extractum::Metadata;
use once_cell::sync::Lazy;
use std::ffi::c_char;
use std::ptr;

pub(crate) static METADATA: Lazy<HandleTable<Metadata>> = Lazy::new(|| HandleTable::new("Metadata"));

/// Copy the entry selected by `pick` into a new C string.
///
/// # Safety
///
/// `out` must be NULL or valid for writes.
unsafe fn copy_entry(
    handle: ExtractumHandle,
    index: usize,
    out: *mut *mut c_char,
    pick: impl FnOnce(&Metadata, usize) -> Option<&str>,
) -> Result<(), FfiError> {
    if out.is_null() {
        return Err(FfiError::null_pointer("output"));
    }
    // SAFETY: checked non-null above
    unsafe { *out = ptr::null_mut() };
    let metadata = METADATA.get(handle)?;
    let text = {
        let metadata = metadata.lock();
        let len = metadata.len();
        pick(&metadata, index)
            .map(|text| text.replace('\0', ""))
            .ok_or_else(|| {
                FfiError::new(
                    ERR_INVALID_ARGUMENT,
                    format!("Metadata index {} out of range (len {})", index, len),
                )
            })?
    };
    // SAFETY: checked non-null above
    unsafe { *out = into_c_string(text)? };
    Ok(())
}

/// Number of entries.
///
/// # Safety
///
/// - `out_len` must be a valid pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_metadata_len(handle: ExtractumHandle, out_len: *mut usize) -> i32 {
    status(|| {
        if out_len.is_null() {
            return Err(FfiError::null_pointer("out_len"));
        }
        let len = METADATA.get(handle)?.lock().len();
        // SAFETY: checked non-null above
        unsafe { *out_len = len };
        Ok(())
    })
}

/// Key of entry `index`, copied into a string released with `extractum_string_free`.
///
/// # Safety
///
/// - `out_key` must be a valid pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_metadata_key(handle: ExtractumHandle, index: usize, out_key: *mut *mut c_char) -> i32 {
    // SAFETY: forwarded caller contract
    status(|| unsafe { copy_entry(handle, index, out_key, Metadata::key) })
}

/// Value of entry `index`, copied into a string released with `extractum_string_free`.
///
/// # Safety
///
/// - `out_value` must be a valid pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_metadata_value(
    handle: ExtractumHandle,
    index: usize,
    out_value: *mut *mut c_char,
) -> i32 {
    // SAFETY: forwarded caller contract
    status(|| unsafe { copy_entry(handle, index, out_value, Metadata::value) })
}

/// All entries as a JSON object in document order.
///
/// # Safety
///
/// - `out_json` must be a valid pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_metadata_to_json(handle: ExtractumHandle, out_json: *mut *mut c_char) -> i32 {
    status(|| {
        if out_json.is_null() {
            return Err(FfiError::null_pointer("out_json"));
        }
        // SAFETY: checked non-null above
        unsafe { *out_json = ptr::null_mut() };
        let json = METADATA.get(handle)?.lock().to_json();
        // SAFETY: checked non-null above
        unsafe { *out_json = into_c_string(json)? };
        Ok(())
    })
}

/// Release a metadata handle.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_metadata_free(handle: ExtractumHandle) -> i32 {
    status(|| METADATA.release(handle))
}
