//! Format dispatch

use crate::{
    config::ExtractorConfig,
    document::{Document, DocumentFormat},
    error::{ExtractError, Result},
};
use tracing::debug;

#[cfg(feature = "ocr")]
use crate::ocr::{OcrEngine, TesseractOcr};
#[cfg(feature = "ocr")]
use std::sync::Arc;
#[cfg(feature = "pdf")]
use crate::pdf::PdfExtractor;

/// Turns a [`Document`] into plain text, picking the parser from its extension
///
/// Purely a transform over bytes already in memory. Well-formed documents
/// without any text yield an empty string; unreadable bytes yield
/// [`ExtractError::Corrupt`].
pub struct TextExtractor {
    #[cfg(feature = "pdf")]
    pdf: PdfExtractor,
    #[cfg(feature = "ocr")]
    ocr: Arc<dyn OcrEngine>,
    config: ExtractorConfig,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl TextExtractor {
    /// Create an extractor using tesseract for OCR
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            #[cfg(feature = "pdf")]
            pdf: PdfExtractor::new(&config),
            #[cfg(feature = "ocr")]
            ocr: Arc::new(TesseractOcr::new(&config)),
            config,
        }
    }

    /// Replace the OCR engine
    #[cfg(feature = "ocr")]
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = engine;
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Whether a file with this name would be dispatched to a parser
    pub fn supports(&self, filename: &str) -> bool {
        match DocumentFormat::from_filename(filename) {
            Ok(format) => format_enabled(format),
            Err(_) => false,
        }
    }

    /// Extract plain text from a document
    pub fn extract(&self, document: &Document) -> Result<String> {
        let format = document.format()?;
        debug!(filename = %document.filename(), %format, "Extracting text");
        self.extract_as(format, document.content())
    }

    /// Extract plain text from bytes of a known format
    pub fn extract_as(&self, format: DocumentFormat, bytes: &[u8]) -> Result<String> {
        match format {
            #[cfg(feature = "pdf")]
            DocumentFormat::Pdf => self.pdf.extract_from_bytes(bytes),
            #[cfg(feature = "ocr")]
            DocumentFormat::Image(kind) => crate::ocr::extract_image(self.ocr.as_ref(), bytes, kind),
            #[cfg(feature = "office")]
            DocumentFormat::Docx => crate::office::extract_docx(bytes),
            #[cfg(feature = "office")]
            DocumentFormat::Xlsx => crate::office::extract_xlsx(bytes),
            #[allow(unreachable_patterns)]
            other => Err(ExtractError::UnsupportedFormat(format!(
                "{} (built without {} support)",
                other,
                feature_for(other)
            ))),
        }
    }
}

fn feature_for(format: DocumentFormat) -> &'static str {
    match format {
        DocumentFormat::Pdf => "pdf",
        DocumentFormat::Image(_) => "ocr",
        DocumentFormat::Docx | DocumentFormat::Xlsx => "office",
    }
}

fn format_enabled(format: DocumentFormat) -> bool {
    match feature_for(format) {
        "pdf" => cfg!(feature = "pdf"),
        "ocr" => cfg!(feature = "ocr"),
        _ => cfg!(feature = "office"),
    }
}
