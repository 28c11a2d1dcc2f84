//! Tesseract OCR backend.
//!
//! Runs the `tesseract` command-line tool on a temporary PNG. Output goes to
//! files in the same temporary directory, which is removed when recognition
//! returns or fails.

use super::preprocess::prepare_image;
use crate::core::config::OcrConfig;
use crate::plugins::{OcrBackend, Plugin};
use crate::{ExtractumError, Result};
use once_cell::sync::OnceCell;
use std::fs::File;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn strip_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}') || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// OCR backend driving the `tesseract` executable.
pub struct TesseractBackend {
    binary: PathBuf,
    available: OnceCell<bool>,
}

impl TesseractBackend {
    /// Backend using `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary("tesseract")
    }

    /// Backend using a specific executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            available: OnceCell::new(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn is_installed(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, image_path: &Path, output_base: &Path, stderr_path: &Path, config: &OcrConfig) -> Result<()> {
        let stderr = File::create(stderr_path)
            .map_err(|e| ExtractumError::ocr_with_source("Failed to create tesseract log file", e))?;
        let child = Command::new(&self.binary)
            .arg(image_path)
            .arg(output_base)
            .args(["-l", config.language()])
            .args(["--dpi", &config.density().to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| match e.kind() {
                IoErrorKind::NotFound => ExtractumError::ocr_with_source(
                    format!("tesseract executable not found ({})", self.binary.display()),
                    e,
                ),
                _ => ExtractumError::ocr_with_source("Failed to start tesseract", e),
            })?;

        let status = wait_with_timeout(child, config.timeout_seconds())?;
        if status.success() {
            return Ok(());
        }
        let stderr = std::fs::read_to_string(stderr_path).unwrap_or_default();
        Err(ExtractumError::ocr(format!(
            "tesseract failed with {}: {}",
            status,
            stderr.trim()
        )))
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the prepared image into the OCR workspace.
fn stage_input(workdir: &Path, prepared: &[u8]) -> Result<PathBuf> {
    let image_path = workdir.join("input.png");
    std::fs::write(&image_path, prepared).map_err(|e| {
        ExtractumError::ocr_with_source(format!("Failed to write OCR input {}", image_path.display()), e)
    })?;
    Ok(image_path)
}

/// Wait for the child, killing it once `timeout_seconds` elapse (0 waits forever).
fn wait_with_timeout(mut child: Child, timeout_seconds: u64) -> Result<ExitStatus> {
    if timeout_seconds == 0 {
        return child
            .wait()
            .map_err(|e| ExtractumError::ocr_with_source("Failed to wait for tesseract", e));
    }

    let deadline = Instant::now() + Duration::from_secs(timeout_seconds);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExtractumError::ocr(format!(
                    "OCR timed out after {} seconds",
                    timeout_seconds
                )));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(ExtractumError::ocr_with_source("Failed to wait for tesseract", e));
            }
        }
    }
}

impl Plugin for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn description(&self) -> &str {
        "OCR through the tesseract command-line tool"
    }
}

impl OcrBackend for TesseractBackend {
    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let available = self.is_installed();
            tracing::debug!(binary = %self.binary.display(), available, "checked for tesseract");
            available
        })
    }

    #[tracing::instrument(skip(self, image, config), fields(image.size_bytes = image.len(), ocr.language = config.language()))]
    fn recognize(&self, image: &[u8], config: &OcrConfig) -> Result<String> {
        let prepared = prepare_image(image, config)?;

        let workdir = TempDir::new().map_err(|e| ExtractumError::ocr_with_source("Failed to create OCR workspace", e))?;
        let image_path = stage_input(workdir.path(), &prepared)?;
        let output_base = workdir.path().join("output");
        let stderr_path = workdir.path().join("stderr.log");

        let started = Instant::now();
        self.run(&image_path, &output_base, &stderr_path, config)?;

        let text = std::fs::read_to_string(output_base.with_extension("txt"))
            .map_err(|e| ExtractumError::ocr_with_source("tesseract produced no output", e))?;
        tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, chars = text.len(), "OCR finished");
        Ok(strip_control_characters(text.trim_end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn sample_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[cfg(unix)]
    fn fake_tesseract(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("tesseract");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 'tesseract 5.3.0'; exit 0; fi\n{}\n",
            body
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_strip_control_characters() {
        assert_eq!(strip_control_characters("a\u{0007}b\tc\nd\u{000C}"), "ab\tc\nd");
    }

    #[test]
    fn test_unwritable_workspace_is_ocr_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("removed");
        let err = stage_input(&missing, &sample_png()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OcrFailed);
        assert!(err.to_string().contains("Failed to write OCR input"));

        let staged = stage_input(dir.path(), b"png").unwrap();
        assert_eq!(std::fs::read(staged).unwrap(), b"png");
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let backend = TesseractBackend::with_binary("/nonexistent/tesseract-binary");
        assert!(!backend.is_available());

        let err = backend.recognize(&sample_png(), &OcrConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OcrFailed);
    }

    #[cfg(unix)]
    #[test]
    fn test_recognize_passes_language_and_density() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_tesseract(dir.path(), "echo \"$4 $6\" > \"$2.txt\"");
        let backend = TesseractBackend::with_binary(binary);
        assert!(backend.is_available());

        let config = OcrConfig::new().set_language("eng+deu").set_density(150);
        let text = backend.recognize(&sample_png(), &config).unwrap();
        assert_eq!(text, "eng+deu 150");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_engine_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_tesseract(dir.path(), "echo 'Failed loading language xyz' >&2\nexit 1");
        let backend = TesseractBackend::with_binary(binary);

        let err = backend.recognize(&sample_png(), &OcrConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OcrFailed);
        assert!(err.to_string().contains("Failed loading language xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_engine() {
        let dir = tempfile::tempdir().unwrap();
        let binary = fake_tesseract(dir.path(), "sleep 30");
        let backend = TesseractBackend::with_binary(binary);

        let started = Instant::now();
        let err = backend
            .recognize(&sample_png(), &OcrConfig::new().set_timeout_seconds(1))
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::OcrFailed);
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(20));
    }
}
