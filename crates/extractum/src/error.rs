//! Error types for extractum.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! [`ExtractumError`]. Each variant maps onto exactly one [`ErrorKind`], a flat,
//! `Copy` classification that survives an API boundary (the FFI crate turns it
//! into an integer code).
//!
//! **System errors bubble up unchanged:** `std::io::Error` converts into
//! [`ExtractumError::Io`] through `?` and keeps its original kind and message.
//!
//! **Application errors carry context:** parse failures, OCR failures and
//! configuration problems hold a message plus an optional `#[source]` chain.
//!
//! # Example
//!
//! ```rust
//! use extractum::{ErrorKind, ExtractumError, Result};
//!
//! fn read_config(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!     if content.trim().is_empty() {
//!         return Err(ExtractumError::invalid_configuration(format!(
//!             "Configuration file is empty: {}",
//!             path
//!         )));
//!     }
//!     Ok(content)
//! }
//!
//! let err = read_config("/definitely/not/here.toml").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Io);
//! ```
use thiserror::Error;

/// Result type alias using `ExtractumError`.
pub type Result<T> = std::result::Result<T, ExtractumError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all extractum operations.
#[derive(Debug, Error)]
pub enum ExtractumError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Extraction failed: {message}")]
    ExtractionFailed {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Out of memory: {0}")]
    OutOfMemory(String),
}

/// Flat classification of an [`ExtractumError`].
///
/// Kinds are stable: adding a variant is a breaking change for bindings that
/// map kinds to integer codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Null, empty or out-of-range input, including invalid enum values and malformed text.
    InvalidArgument,
    /// A backend failed to parse the document.
    ExtractionFailed,
    /// The source could not be read, or a stream read failed.
    Io,
    /// A configuration value is semantically inconsistent.
    InvalidConfiguration,
    /// No backend recognizes the input.
    UnsupportedFormat,
    /// Allocation failed while materializing output.
    OutOfMemory,
    /// The OCR engine is missing, failed, or timed out.
    OcrFailed,
}

impl ErrorKind {
    /// All kinds, in declaration order.
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::InvalidArgument,
        ErrorKind::ExtractionFailed,
        ErrorKind::Io,
        ErrorKind::InvalidConfiguration,
        ErrorKind::UnsupportedFormat,
        ErrorKind::OutOfMemory,
        ErrorKind::OcrFailed,
    ];

    /// Human-readable description of the kind.
    #[inline]
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "Invalid argument provided",
            ErrorKind::ExtractionFailed => "Document extraction failed",
            ErrorKind::Io => "File system or network I/O error",
            ErrorKind::InvalidConfiguration => "Invalid configuration value",
            ErrorKind::UnsupportedFormat => "Unsupported file format",
            ErrorKind::OutOfMemory => "Memory allocation failed",
            ErrorKind::OcrFailed => "OCR operation failed",
        }
    }

    /// Coarse category of the kind.
    #[inline]
    pub fn category(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "argument",
            ErrorKind::InvalidConfiguration => "configuration",
            ErrorKind::Io => "io",
            ErrorKind::UnsupportedFormat => "format",
            ErrorKind::ExtractionFailed | ErrorKind::OcrFailed => "extraction",
            ErrorKind::OutOfMemory => "resource",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Human-readable description of an error kind.
pub fn error_message(kind: ErrorKind) -> &'static str {
    kind.message()
}

/// Coarse category ("argument", "configuration", "io", "format", "extraction", "resource").
pub fn error_category(kind: ErrorKind) -> &'static str {
    kind.category()
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for ExtractumError {
    fn from(err: lopdf::Error) -> Self {
        ExtractumError::ExtractionFailed {
            message: format!("PDF parsing failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "office")]
impl From<zip::result::ZipError> for ExtractumError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => ExtractumError::Io(io),
            other => ExtractumError::ExtractionFailed {
                message: format!("Invalid ZIP container: {}", other),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(feature = "office")]
impl From<roxmltree::Error> for ExtractumError {
    fn from(err: roxmltree::Error) -> Self {
        ExtractumError::ExtractionFailed {
            message: format!("Malformed XML: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "url")]
impl From<reqwest::Error> for ExtractumError {
    fn from(err: reqwest::Error) -> Self {
        ExtractumError::Io(std::io::Error::other(err))
    }
}

impl From<serde_json::Error> for ExtractumError {
    fn from(err: serde_json::Error) -> Self {
        ExtractumError::InvalidConfiguration {
            message: format!("Invalid JSON: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $with_source:ident, $variant:ident) => {
        #[doc = concat!("Create a `", stringify!($variant), "` error")]
        pub fn $name<S: Into<String>>(message: S) -> Self {
            Self::$variant {
                message: message.into(),
                source: None,
            }
        }

        #[doc = concat!("Create a `", stringify!($variant), "` error with source")]
        pub fn $with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
            message: S,
            source: E,
        ) -> Self {
            Self::$variant {
                message: message.into(),
                source: Some(Box::new(source)),
            }
        }
    };
}

impl ExtractumError {
    error_constructor!(
        invalid_configuration,
        invalid_configuration_with_source,
        InvalidConfiguration
    );
    error_constructor!(extraction_failed, extraction_failed_with_source, ExtractionFailed);
    error_constructor!(ocr, ocr_with_source, Ocr);

    /// Create an `InvalidArgument` error.
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an `Io` error that does not originate from the operating system.
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(std::io::Error::other(message.into()))
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractumError::Io(_) => ErrorKind::Io,
            ExtractumError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ExtractumError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            ExtractumError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            ExtractumError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ExtractumError::Ocr { .. } => ErrorKind::OcrFailed,
            ExtractumError::OutOfMemory(_) => ErrorKind::OutOfMemory,
        }
    }
}
