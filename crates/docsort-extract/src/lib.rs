//! # docsort-extract
//!
//! Plain-text extraction from heterogeneous document formats, feeding the
//! classification strategies in `docsort-core`.
//!
//! ## Formats
//!
//! - **PDF**: per-page text via `lopdf`, falling back to `pdf-extract`
//! - **Images** (jpg, png, tiff, bmp): OCR over the full image
//! - **Word** (docx): non-empty paragraphs, one per line
//! - **Spreadsheets** (xlsx): every sheet and row, cells joined by spaces
//!
//! Anything else fails with [`ExtractError::UnsupportedFormat`] so callers can
//! tell "no text in this file" apart from "cannot read this kind of file".
//!
//! ## Example
//!
//! ```rust,no_run
//! use docsort_extract::{Document, TextExtractor};
//!
//! let bytes = std::fs::read("invoice_2024.pdf").unwrap();
//! let text = TextExtractor::default()
//!     .extract(&Document::new("invoice_2024.pdf", bytes))
//!     .unwrap();
//! println!("{}", text);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────────┐
//! │  Document   │ ──► │ Format tag   │ ──► │ pdf / ocr /     │ ──► text
//! │ (name+bytes)│     │ (extension)  │     │ docx / xlsx     │
//! └─────────────┘     └──────────────┘     └─────────────────┘
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod extractor;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(feature = "ocr")]
pub mod ocr;

#[cfg(feature = "office")]
pub mod office;

pub use config::ExtractorConfig;
pub use document::{Document, DocumentFormat, ImageKind};
pub use error::{ExtractError, Result};
pub use extractor::TextExtractor;

#[cfg(feature = "ocr")]
pub use ocr::{OcrEngine, TesseractOcr};

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;
