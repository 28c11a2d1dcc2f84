//! Format parsing building blocks.
//!
//! Stateless helpers used by the backends in [`crate::extractors`]: walking
//! WordprocessingML parts, reading OOXML document properties and reading image
//! headers. They work on already-opened containers and return plain values, so
//! they can be used without going through an [`Extractor`](crate::Extractor).

#[cfg(feature = "office")]
pub mod docx;

#[cfg(feature = "image")]
pub mod image;

#[cfg(feature = "office")]
pub mod office_metadata;

#[cfg(feature = "image")]
pub use image::{ImageMetadata, extract_image_metadata};

#[cfg(feature = "office")]
pub use office_metadata::{AppProperties, CoreProperties, extract_app_properties, extract_core_properties};
