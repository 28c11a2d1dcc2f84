//! File I/O utilities.

use crate::{ExtractumError, Result};
use std::io::Read;
use std::path::Path;

/// Validate that `path` names an existing regular file.
///
/// # Errors
///
/// Returns `ExtractumError::Io` with kind `NotFound` when nothing exists at the
/// path, and `InvalidInput` when it is a directory.
pub fn validate_file_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).map_err(|e| {
        ExtractumError::Io(std::io::Error::new(
            e.kind(),
            format!("File does not exist: {} ({})", path.display(), e),
        ))
    })?;
    if metadata.is_dir() {
        return Err(ExtractumError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Path is a directory: {}", path.display()),
        )));
    }
    Ok(())
}

/// Read a file synchronously.
pub fn read_file_sync(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    std::fs::read(path.as_ref()).map_err(ExtractumError::Io)
}

/// Read up to `limit` bytes from the start of a reader.
pub fn read_prefix(reader: &mut impl Read, limit: usize) -> Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(limit.min(64 * 1024));
    reader.take(limit as u64).read_to_end(&mut prefix)?;
    Ok(prefix)
}
