//! Image text extraction via OCR

use crate::{
    config::ExtractorConfig,
    document::ImageKind,
    error::{ExtractError, Result},
};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Something that can read text out of an encoded raster image
///
/// The whole image is recognized as-is; no cropping or preprocessing.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8], kind: ImageKind) -> Result<String>;
}

/// OCR through the `tesseract` command line tool
///
/// The image is written to a call-unique scratch file which is removed when
/// the call returns, whether recognition succeeded or not.
pub struct TesseractOcr {
    command: String,
    language: String,
    scratch_dir: Option<PathBuf>,
}

impl TesseractOcr {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            command: config.tesseract_command.clone(),
            language: config.ocr_language.clone(),
            scratch_dir: None,
        }
    }

    /// Place scratch files in `dir` instead of the system temp directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8], kind: ImageKind) -> Result<String> {
        let suffix = format!(".{}", kind.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("docsort-ocr-").suffix(&suffix);
        let mut scratch = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        scratch.write_all(image)?;
        scratch.flush()?;

        debug!(command = %self.command, path = ?scratch.path(), "Running OCR");

        let output = Command::new(&self.command)
            .arg(scratch.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| ExtractError::Ocr(format!("failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Decodes the image to reject corrupt bytes, then hands it to the OCR engine
pub(crate) fn extract_image(engine: &dyn OcrEngine, bytes: &[u8], kind: ImageKind) -> Result<String> {
    image::load_from_memory(bytes).map_err(|e| ExtractError::corrupt("image", e))?;
    let text = engine.recognize(bytes, kind)?;
    Ok(text.trim().to_string())
}
