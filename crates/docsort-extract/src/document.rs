//! Incoming documents and the format tag derived from their filename

use crate::error::{ExtractError, Result};
use std::fmt;
use std::path::Path;

/// Raster formats handed to OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Tiff,
    Bmp,
}

impl ImageKind {
    /// Extension used for scratch files, so the OCR engine can sniff the type
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Tiff => "tiff",
            ImageKind::Bmp => "bmp",
        }
    }
}

/// Format tag derived from a filename extension
///
/// Dispatch is by declared extension only. The bytes are never sniffed to
/// pick a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Image(ImageKind),
    Docx,
    Xlsx,
}

impl DocumentFormat {
    /// Derive the format from a filename
    ///
    /// Fails with [`ExtractError::UnsupportedFormat`] for unknown or missing
    /// extensions.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        Self::from_extension(&ext).ok_or(ExtractError::UnsupportedFormat(ext))
    }

    /// Map a lowercase extension (without the dot) to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(DocumentFormat::Pdf),
            "jpg" | "jpeg" => Some(DocumentFormat::Image(ImageKind::Jpeg)),
            "png" => Some(DocumentFormat::Image(ImageKind::Png)),
            "tif" | "tiff" => Some(DocumentFormat::Image(ImageKind::Tiff)),
            "bmp" => Some(DocumentFormat::Image(ImageKind::Bmp)),
            "docx" => Some(DocumentFormat::Docx),
            "xlsx" | "xlsm" => Some(DocumentFormat::Xlsx),
            _ => None,
        }
    }

    /// Short name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Image(_) => "image",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A received document: raw bytes plus the declared filename
///
/// Owned by the call that received it and dropped once classification is done.
#[derive(Clone)]
pub struct Document {
    filename: String,
    content: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Format tag derived from the filename extension
    pub fn format(&self) -> Result<DocumentFormat> {
        DocumentFormat::from_filename(&self.filename)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename)
            .field("len", &self.content.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("invoice_2024.PDF").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_filename("scan.jpeg").unwrap(),
            DocumentFormat::Image(ImageKind::Jpeg)
        );
        assert_eq!(
            DocumentFormat::from_filename("report.final.xlsx").unwrap(),
            DocumentFormat::Xlsx
        );
        assert_eq!(
            DocumentFormat::from_filename("letter.docx").unwrap(),
            DocumentFormat::Docx
        );
    }

    #[test]
    fn test_unsupported_extensions() {
        for name in ["notes.txt", "archive.tar.gz", "README", ""] {
            let err = DocumentFormat::from_filename(name).unwrap_err();
            assert!(err.is_unsupported(), "{name} should be unsupported");
        }

        match DocumentFormat::from_filename("notes.TXT") {
            Err(ExtractError::UnsupportedFormat(ext)) => assert_eq!(ext, "txt"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_content() {
        let doc = Document::new("a.pdf", vec![1u8, 2, 3]);
        assert_eq!(format!("{doc:?}"), "Document { filename: \"a.pdf\", len: 3 }");
    }
}
