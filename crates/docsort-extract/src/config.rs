//! Extractor configuration

use serde::{Deserialize, Serialize};

/// Configuration for text extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Separator placed between the text of consecutive PDF pages
    pub page_separator: String,

    /// Tesseract executable, either a bare name resolved via `PATH` or a full path
    pub tesseract_command: String,

    /// Tesseract language pack passed with `-l`
    pub ocr_language: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            page_separator: "\n".to_string(),
            tesseract_command: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Use a custom page separator
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }

    /// Use a custom tesseract executable
    pub fn with_tesseract_command(mut self, command: impl Into<String>) -> Self {
        self.tesseract_command = command.into();
        self
    }

    /// Use a different OCR language pack
    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.ocr_language = language.into();
        self
    }
}
