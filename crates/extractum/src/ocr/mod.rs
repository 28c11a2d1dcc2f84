//! OCR (Optical Character Recognition) subsystem.
//!
//! [`TesseractBackend`] drives the `tesseract` executable. Images are
//! normalized with the `image` crate before recognition: converted to the
//! configured bit depth and, when preprocessing is enabled, turned to grayscale
//! and contrast-stretched.
//!
//! # Example
//!
//! ```rust,no_run
//! use extractum::OcrConfig;
//! use extractum::ocr::TesseractBackend;
//! use extractum::plugins::OcrBackend;
//!
//! # fn example() -> extractum::Result<()> {
//! let backend = TesseractBackend::new();
//! if backend.is_available() {
//!     let image_bytes = std::fs::read("scanned.png")?;
//!     let text = backend.recognize(&image_bytes, &OcrConfig::default().set_language("eng+deu"))?;
//!     println!("{}", text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod preprocess;
pub mod tesseract;

pub use preprocess::prepare_image;
pub use tesseract::TesseractBackend;
