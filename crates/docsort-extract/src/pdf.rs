//! PDF text extraction
//!
//! Two parsers run as an ordered chain over the same bytes: `lopdf` page by
//! page first, then `pdf-extract` page by page. The chain moves on when the
//! primary parser cannot load the document or fails on any page.

use crate::{config::ExtractorConfig, error::Result, ExtractError};
use lopdf::Document;
use pdf_extract::PlainTextOutput;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Per-page text from one parser, or a message describing its failure
type PageParser = fn(&[u8]) -> std::result::Result<Vec<String>, String>;

/// PDF document text extractor
pub struct PdfExtractor {
    page_separator: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor with the given configuration
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            page_separator: config.page_separator.clone(),
        }
    }

    /// Extract text from PDF bytes, one cleaned block per non-empty page
    pub fn extract_from_bytes(&self, bytes: &[u8]) -> Result<String> {
        self.extract_with(bytes, primary_pages, fallback_pages)
    }

    fn extract_with(
        &self,
        bytes: &[u8],
        primary: PageParser,
        fallback: PageParser,
    ) -> Result<String> {
        let pages = match primary(bytes) {
            Ok(pages) => pages,
            Err(primary) => {
                warn!(error = %primary, "Primary PDF parser failed, trying fallback");
                fallback(bytes).map_err(|fallback| {
                    ExtractError::corrupt(
                        "pdf",
                        format!("primary: {}; fallback: {}", primary, fallback),
                    )
                })?
            }
        };

        Ok(self.join_pages(&pages))
    }

    fn join_pages(&self, pages: &[String]) -> String {
        pages
            .iter()
            .map(|page| clean_text(page))
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join(&self.page_separator)
    }
}

/// Page-by-page extraction with lopdf
fn primary_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    let doc = Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Loaded PDF");

    let mut texts = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        let text = doc
            .extract_text(&[*page_num])
            .map_err(|e| format!("page {}: {}", page_num, e))?;
        texts.push(text);
    }
    Ok(texts)
}

/// Page-by-page extraction with pdf-extract
///
/// pdf-extract panics on some malformed font dictionaries; a panic on any
/// page counts as a failure of this parser.
fn fallback_pages(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    let doc = pdf_extract::Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let page_nums: Vec<u32> = doc.get_pages().keys().copied().collect();

    let mut texts = Vec::with_capacity(page_nums.len());
    for page_num in page_nums {
        let mut text = String::new();
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(&doc, &mut output, page_num)
        }));
        match rendered {
            Ok(Ok(())) => texts.push(text),
            Ok(Err(e)) => return Err(format!("page {}: {}", page_num, e)),
            Err(payload) => {
                return Err(format!(
                    "page {}: parser panicked: {}",
                    page_num,
                    panic_message(payload.as_ref())
                ))
            }
        }
    }
    Ok(texts)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Collapse runs of spaces within lines and drop blank lines
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Dictionary, Object, Stream};

    /// One page per entry, each drawing its text with font `F1`
    fn pdf_with_font(font: Dictionary, pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(font);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn courier() -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        }
    }

    /// Type0 font missing its required DescendantFonts entry
    fn type0_without_descendants() -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Broken",
            "Encoding" => "Identity-H",
        }
    }

    fn failing_primary(_bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
        Err("page 1: unreadable content stream".to_string())
    }

    #[test]
    fn test_clean_text() {
        let input = "  Hello   World  \n\n  Test  ";
        assert_eq!(clean_text(input), "Hello World\nTest");
    }

    #[test]
    fn test_join_pages_skips_blank_pages() {
        let extractor = PdfExtractor::new(&ExtractorConfig::default().with_page_separator("\n--\n"));
        let pages = vec!["one".to_string(), "   \n ".to_string(), "two".to_string()];
        assert_eq!(extractor.join_pages(&pages), "one\n--\ntwo");
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let extractor = PdfExtractor::new(&ExtractorConfig::default());
        let err = extractor.extract_from_bytes(b"definitely not a pdf").unwrap_err();
        match err {
            ExtractError::Corrupt { format, message } => {
                assert_eq!(format, "pdf");
                assert!(message.contains("primary"));
                assert!(message.contains("fallback"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_pages_joined_when_primary_fails() {
        let extractor = PdfExtractor::new(&ExtractorConfig::default().with_page_separator("\n--\n"));
        let bytes = pdf_with_font(courier(), &["Invoice", "Payslip"]);

        let text = extractor
            .extract_with(&bytes, failing_primary, fallback_pages)
            .unwrap();
        assert_eq!(text, "Invoice\n--\nPayslip");
    }

    #[test]
    fn test_fallback_panic_is_corrupt() {
        let extractor = PdfExtractor::new(&ExtractorConfig::default());
        let bytes = pdf_with_font(type0_without_descendants(), &["Invoice"]);

        let err = extractor
            .extract_with(&bytes, failing_primary, fallback_pages)
            .unwrap_err();
        match err {
            ExtractError::Corrupt { format, message } => {
                assert_eq!(format, "pdf");
                assert!(message.contains("unreadable content stream"), "{message}");
                assert!(message.contains("parser panicked"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_broken_font_never_panics() {
        let extractor = PdfExtractor::new(&ExtractorConfig::default());
        for font in [
            type0_without_descendants(),
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
                "Encoding" => "Bogus",
            },
        ] {
            let bytes = pdf_with_font(font, &["Invoice"]);
            let outcome = panic::catch_unwind(|| extractor.extract_from_bytes(&bytes));
            assert!(outcome.is_ok());
        }
    }
}
