//! Content stream handles.
//!
//! Reading at the end of a stream returns `ERR_OK` with `*bytes_read == 0`,
//! as often as it is called. After a failed read every later read fails with
//! `ERR_IO_ERROR`, and so does the read that hit the failure. Argument checks
//! run before the stream is touched, so a NULL buffer never changes its state.

use crate::error::{FfiError, status};
use crate::handles::{ExtractumHandle, HandleTable};
use extractum::ContentStream;
use once_cell::sync::Lazy;
use std::ptr;

pub(crate) static STREAMS: Lazy<HandleTable<ContentStream>> = Lazy::new(|| HandleTable::new("ContentStream"));

/// Check the read arguments and build the destination slice.
///
/// # Safety
///
/// `buffer` must be NULL or valid for writes of `size` bytes; `bytes_read`
/// must be NULL or valid for writes. A NULL buffer is rejected whatever the size.
unsafe fn read_with(
    handle: ExtractumHandle,
    buffer: *mut u8,
    size: usize,
    bytes_read: *mut usize,
    read: impl FnOnce(&mut ContentStream, &mut [u8]) -> extractum::Result<usize>,
) -> Result<(), FfiError> {
    if bytes_read.is_null() {
        return Err(FfiError::null_pointer("bytes_read"));
    }
    // SAFETY: checked non-null above
    unsafe { *bytes_read = 0 };
    if buffer.is_null() {
        return Err(FfiError::null_pointer("buffer"));
    }
    let stream = STREAMS.get(handle)?;
    // SAFETY: non-null, writable for `size` bytes per the caller's contract
    let buf = unsafe { std::slice::from_raw_parts_mut(buffer, size) };
    let n = read(&mut stream.lock(), buf)?;
    // SAFETY: checked non-null above
    unsafe { *bytes_read = n };
    Ok(())
}

/// Read up to `size` bytes. Short reads are legal; `*bytes_read == 0` means
/// the stream is exhausted (or `size` was 0).
///
/// # Safety
///
/// - `buffer` must be valid for writes of `size` bytes
/// - `bytes_read` must be a valid pointer
///
/// # Example (C)
///
/// ```c
/// uint8_t buf[4096];
/// size_t n = 0;
/// while (extractum_stream_read(stream, buf, sizeof buf, &n) == ERR_OK && n > 0) {
///     fwrite(buf, 1, n, stdout);
/// }
/// extractum_stream_free(stream);
/// ```
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_stream_read(
    handle: ExtractumHandle,
    buffer: *mut u8,
    size: usize,
    bytes_read: *mut usize,
) -> i32 {
    // SAFETY: forwarded caller contract
    status(|| unsafe { read_with(handle, buffer, size, bytes_read, |stream, buf| stream.read(buf)) })
}

/// Read until `size` bytes are filled or the stream ends.
///
/// A count below `size` is still `ERR_OK`: it means the stream ended during
/// this call. Only a count of 0 says the stream was already exhausted.
///
/// # Safety
///
/// - `buffer` must be valid for writes of `size` bytes
/// - `bytes_read` must be a valid pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_stream_read_exact(
    handle: ExtractumHandle,
    buffer: *mut u8,
    size: usize,
    bytes_read: *mut usize,
) -> i32 {
    // SAFETY: forwarded caller contract
    status(|| unsafe { read_with(handle, buffer, size, bytes_read, |stream, buf| stream.read_full(buf)) })
}

/// Drain the rest of the stream into one library-owned buffer.
///
/// On success `*out_data` holds `*out_len` bytes, released with
/// [`extractum_buffer_free`] and that same length. An exhausted stream yields
/// `*out_data == NULL` and `*out_len == 0`. The whole remainder is held in
/// memory, so prefer [`extractum_stream_read`] for large documents.
///
/// # Safety
///
/// - `out_data` and `out_len` must be valid pointers
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_stream_read_all(
    handle: ExtractumHandle,
    out_data: *mut *mut u8,
    out_len: *mut usize,
) -> i32 {
    status(|| {
        if out_data.is_null() {
            return Err(FfiError::null_pointer("out_data"));
        }
        if out_len.is_null() {
            return Err(FfiError::null_pointer("out_len"));
        }
        // SAFETY: both checked non-null above
        unsafe {
            *out_data = ptr::null_mut();
            *out_len = 0;
        }

        let bytes = STREAMS.get(handle)?.lock().read_all()?;
        if bytes.is_empty() {
            return Ok(());
        }
        let len = bytes.len();
        let data = Box::into_raw(bytes.into_boxed_slice()) as *mut u8;
        // SAFETY: both checked non-null above
        unsafe {
            *out_data = data;
            *out_len = len;
        }
        Ok(())
    })
}

/// Free a buffer returned by [`extractum_stream_read_all`].
///
/// # Safety
///
/// - `data` must be NULL or a buffer from `extractum_stream_read_all`
/// - `len` must be the length reported alongside it
/// - `data` must not be used after this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_buffer_free(data: *mut u8, len: usize) {
    if !data.is_null() {
        // SAFETY: `data`/`len` came from a boxed slice per the caller's contract
        unsafe { drop(Box::from_raw(ptr::slice_from_raw_parts_mut(data, len))) };
    }
}

/// Whether the output was clipped at the extractor's maximum length.
/// Final once the stream is exhausted.
///
/// # Safety
///
/// - `out_truncated` must be a valid pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn extractum_stream_is_truncated(handle: ExtractumHandle, out_truncated: *mut bool) -> i32 {
    status(|| {
        if out_truncated.is_null() {
            return Err(FfiError::null_pointer("out_truncated"));
        }
        let truncated = STREAMS.get(handle)?.lock().is_truncated();
        // SAFETY: checked non-null above
        unsafe { *out_truncated = truncated };
        Ok(())
    })
}

/// Release a stream. Backend resources (decoders, temporary OCR files) are
/// dropped immediately; this is how an extraction is cancelled.
#[unsafe(no_mangle)]
pub extern "C" fn extractum_stream_free(handle: ExtractumHandle) -> i32 {
    status(|| STREAMS.release(handle))
}
