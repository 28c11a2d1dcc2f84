//! Configuration values and configuration file loading.
//!
//! [`PdfConfig`], [`OfficeConfig`] and [`OcrConfig`] are immutable values with
//! consuming setters: every `set_*` call takes the config by value and returns
//! the updated config, so a stale copy can never be observed half-updated.
//!
//! [`ExtractorConfig`] is the serializable form of a whole
//! [`Extractor`](crate::Extractor) setup and can be loaded from TOML, YAML or
//! JSON files, or discovered as `extractum.toml` in the directory hierarchy.

use crate::{ExtractumError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum output length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 100 * 1024 * 1024;

/// Name of the configuration file looked up by [`ExtractorConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "extractum.toml";

/// Color depths accepted by [`OcrConfig::set_depth`].
pub const SUPPORTED_OCR_DEPTHS: [u32; 4] = [1, 8, 24, 32];

/// How a PDF backend combines its text layer with OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum PdfOcrStrategy {
    /// Text layer only.
    #[default]
    NoOcr = 0,
    /// OCR every page, ignore the text layer.
    OcrOnly = 1,
    /// Text layer followed by OCR of page images.
    OcrAndText = 2,
    /// OCR only pages whose text layer is blank.
    Auto = 3,
}

impl TryFrom<i32> for PdfOcrStrategy {
    type Error = ExtractumError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::NoOcr),
            1 => Ok(Self::OcrOnly),
            2 => Ok(Self::OcrAndText),
            3 => Ok(Self::Auto),
            other => Err(ExtractumError::invalid_argument(format!(
                "Invalid PDF OCR strategy: {}",
                other
            ))),
        }
    }
}

/// Character encoding of extracted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum Charset {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8 = 0,
    #[serde(rename = "us-ascii", alias = "ascii")]
    UsAscii = 1,
    #[serde(rename = "utf-16be")]
    Utf16Be = 2,
}

impl Charset {
    /// IANA name of the charset.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::UsAscii => "US-ASCII",
            Charset::Utf16Be => "UTF-16BE",
        }
    }
}

impl TryFrom<i32> for Charset {
    type Error = ExtractumError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Utf8),
            1 => Ok(Self::UsAscii),
            2 => Ok(Self::Utf16Be),
            other => Err(ExtractumError::invalid_argument(format!("Invalid charset: {}", other))),
        }
    }
}

/// Shape of extracted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum OutputFormat {
    #[default]
    PlainText = 0,
    /// Well-formed XHTML with metadata in `<head>`.
    Markup = 1,
}

impl TryFrom<i32> for OutputFormat {
    type Error = ExtractumError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::PlainText),
            1 => Ok(Self::Markup),
            other => Err(ExtractumError::invalid_argument(format!("Invalid output format: {}", other))),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_density() -> u32 {
    300
}
fn default_depth() -> u32 {
    32
}
fn default_timeout() -> u64 {
    300
}
fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

/// PDF backend behavior.
///
/// ```rust
/// use extractum::{PdfConfig, PdfOcrStrategy};
///
/// let config = PdfConfig::new()
///     .set_ocr_strategy(PdfOcrStrategy::Auto)
///     .set_extract_annotation_text(true);
/// assert_eq!(config.ocr_strategy(), PdfOcrStrategy::Auto);
/// assert!(!config.extract_inline_images());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default)]
    ocr_strategy: PdfOcrStrategy,
    #[serde(default)]
    extract_inline_images: bool,
    #[serde(default = "default_true")]
    extract_unique_inline_images_only: bool,
    #[serde(default)]
    extract_marked_content: bool,
    #[serde(default)]
    extract_annotation_text: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            ocr_strategy: PdfOcrStrategy::NoOcr,
            extract_inline_images: false,
            extract_unique_inline_images_only: true,
            extract_marked_content: false,
            extract_annotation_text: false,
        }
    }
}

impl PdfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ocr_strategy(&self) -> PdfOcrStrategy {
        self.ocr_strategy
    }
    pub fn extract_inline_images(&self) -> bool {
        self.extract_inline_images
    }
    pub fn extract_unique_inline_images_only(&self) -> bool {
        self.extract_unique_inline_images_only
    }
    pub fn extract_marked_content(&self) -> bool {
        self.extract_marked_content
    }
    pub fn extract_annotation_text(&self) -> bool {
        self.extract_annotation_text
    }

    pub fn set_ocr_strategy(mut self, strategy: PdfOcrStrategy) -> Self {
        self.ocr_strategy = strategy;
        self
    }
    pub fn set_extract_inline_images(mut self, value: bool) -> Self {
        self.extract_inline_images = value;
        self
    }
    /// Deduplicate inline images by content digest. Only meaningful together
    /// with [`PdfConfig::set_extract_inline_images`].
    pub fn set_extract_unique_inline_images_only(mut self, value: bool) -> Self {
        self.extract_unique_inline_images_only = value;
        self
    }
    pub fn set_extract_marked_content(mut self, value: bool) -> Self {
        self.extract_marked_content = value;
        self
    }
    pub fn set_extract_annotation_text(mut self, value: bool) -> Self {
        self.extract_annotation_text = value;
        self
    }
}

/// Office (WordprocessingML) backend behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeConfig {
    #[serde(default)]
    extract_macros: bool,
    #[serde(default)]
    include_deleted_content: bool,
    #[serde(default)]
    include_move_from_content: bool,
    #[serde(default = "default_true")]
    include_shape_based_content: bool,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            extract_macros: false,
            include_deleted_content: false,
            include_move_from_content: false,
            include_shape_based_content: true,
        }
    }
}

impl OfficeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract_macros(&self) -> bool {
        self.extract_macros
    }
    pub fn include_deleted_content(&self) -> bool {
        self.include_deleted_content
    }
    pub fn include_move_from_content(&self) -> bool {
        self.include_move_from_content
    }
    pub fn include_shape_based_content(&self) -> bool {
        self.include_shape_based_content
    }

    /// Macros may carry executable content; keep this off for untrusted input.
    pub fn set_extract_macros(mut self, value: bool) -> Self {
        self.extract_macros = value;
        self
    }
    pub fn set_include_deleted_content(mut self, value: bool) -> Self {
        self.include_deleted_content = value;
        self
    }
    pub fn set_include_move_from_content(mut self, value: bool) -> Self {
        self.include_move_from_content = value;
        self
    }
    pub fn set_include_shape_based_content(mut self, value: bool) -> Self {
        self.include_shape_based_content = value;
        self
    }
}

/// OCR engine settings.
///
/// Setters never fail; semantically invalid values are reported by
/// [`OcrConfig::validate`], which every extraction runs before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_eng")]
    language: String,
    #[serde(default = "default_density")]
    density: u32,
    #[serde(default = "default_depth")]
    depth: u32,
    #[serde(default = "default_true")]
    enable_image_preprocessing: bool,
    #[serde(default = "default_timeout")]
    timeout_seconds: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_eng(),
            density: default_density(),
            depth: default_depth(),
            enable_image_preprocessing: true,
            timeout_seconds: default_timeout(),
        }
    }
}

impl OcrConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language(&self) -> &str {
        &self.language
    }
    /// Individual language codes of a `+`-joined language setting.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.language.split('+')
    }
    pub fn density(&self) -> u32 {
        self.density
    }
    pub fn depth(&self) -> u32 {
        self.depth
    }
    pub fn enable_image_preprocessing(&self) -> bool {
        self.enable_image_preprocessing
    }
    /// Seconds, `0` meaning unbounded.
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Language code, `+`-joined for multiple languages (e.g. `"eng+fra"`).
    pub fn set_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
    pub fn set_density(mut self, dpi: u32) -> Self {
        self.density = dpi;
        self
    }
    pub fn set_depth(mut self, bits: u32) -> Self {
        self.depth = bits;
        self
    }
    pub fn set_enable_image_preprocessing(mut self, value: bool) -> Self {
        self.enable_image_preprocessing = value;
        self
    }
    pub fn set_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.language.is_empty() {
            return Err(ExtractumError::invalid_configuration("OCR language must not be empty"));
        }
        for code in self.languages() {
            let well_formed = !code.is_empty()
                && code.len() <= 32
                && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !well_formed {
                return Err(ExtractumError::invalid_configuration(format!(
                    "Invalid OCR language code '{}' in '{}'",
                    code, self.language
                )));
            }
        }
        if self.density == 0 {
            return Err(ExtractumError::invalid_configuration("OCR density must be greater than 0"));
        }
        if !SUPPORTED_OCR_DEPTHS.contains(&self.depth) {
            return Err(ExtractumError::invalid_configuration(format!(
                "Unsupported OCR color depth {} (expected one of {:?})",
                self.depth, SUPPORTED_OCR_DEPTHS
            )));
        }
        Ok(())
    }
}

/// Serializable description of an [`Extractor`](crate::Extractor).
///
/// # Example
///
/// ```rust
/// use extractum::ExtractorConfig;
///
/// let config = ExtractorConfig::default();
/// assert!(config.pdf.is_none());
///
/// // Load from TOML file
/// // let config = ExtractorConfig::from_toml_file("extractum.toml")?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum output length in characters
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default)]
    pub encoding: Charset,

    #[serde(default)]
    pub output_format: OutputFormat,

    /// PDF options (None = backend defaults)
    #[serde(default)]
    pub pdf: Option<PdfConfig>,

    /// Office options (None = backend defaults)
    #[serde(default)]
    pub office: Option<OfficeConfig>,

    /// OCR options (None = OCR only where a backend opts in with defaults)
    #[serde(default)]
    pub ocr: Option<OcrConfig>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            encoding: Charset::default(),
            output_format: OutputFormat::default(),
            pdf: None,
            office: None,
            ocr: None,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(ocr) = &self.ocr {
            ocr.validate()?;
        }
        Ok(())
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config_file(path.as_ref())?;
        toml::from_str(&content).map_err(|e| {
            ExtractumError::invalid_configuration(format!("Invalid TOML in {}: {}", path.as_ref().display(), e))
        })
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config_file(path.as_ref())?;
        serde_yaml_ng::from_str(&content).map_err(|e| {
            ExtractumError::invalid_configuration(format!("Invalid YAML in {}: {}", path.as_ref().display(), e))
        })
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config_file(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| {
            ExtractumError::invalid_configuration(format!("Invalid JSON in {}: {}", path.as_ref().display(), e))
        })
    }

    /// Load configuration by file extension (`.toml`, `.yaml`/`.yml`, `.json`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ExtractumError::invalid_configuration(format!(
                "Unsupported config file format: {}",
                path.display()
            ))),
        }
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Walk from the current directory up to the filesystem root looking for
    /// `extractum.toml`.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(ExtractumError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "discovered configuration file");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ExtractumError::invalid_configuration_with_source(
            format!("Failed to read config file {}: {}", path.display(), e),
            e,
        )
    })
}
