//! OCR backend contract.

use crate::Result;
use crate::core::config::OcrConfig;
use crate::plugins::Plugin;

/// Trait for OCR engines.
///
/// `recognize` receives an encoded image (PNG, JPEG, TIFF, ...) and returns the
/// recognized text. A missing engine is reported by [`OcrBackend::is_available`]
/// and, when OCR is attempted anyway, by an [`ErrorKind::OcrFailed`](crate::ErrorKind::OcrFailed)
/// error, never by a configuration error.
pub trait OcrBackend: Plugin {
    /// Whether the engine can run on this machine.
    fn is_available(&self) -> bool;

    fn recognize(&self, image: &[u8], config: &OcrConfig) -> Result<String>;

    fn supports_language(&self, _language: &str) -> bool {
        true
    }
}

/// Backend used when OCR support is compiled out. Always unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcrBackend;

impl Plugin for NoOcrBackend {
    fn name(&self) -> &str {
        "none"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

impl OcrBackend for NoOcrBackend {
    fn is_available(&self) -> bool {
        false
    }

    fn recognize(&self, _image: &[u8], _config: &OcrConfig) -> Result<String> {
        Err(crate::ExtractumError::ocr("OCR support is not compiled in"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ocr_backend_fails_with_ocr_kind() {
        let backend = NoOcrBackend;
        assert!(!backend.is_available());
        let err = backend.recognize(&[], &OcrConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OcrFailed);
    }
}
