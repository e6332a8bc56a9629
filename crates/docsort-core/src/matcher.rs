//! Keyword-pattern matching over filenames and extracted text
//!
//! All category knowledge comes from registry data. Adding a category with
//! its own patterns extends matching without touching this module.

use crate::registry::Category;
use crate::types::UNKNOWN_LABEL;

/// First category, in registry order, with any pattern fully present in `text`
pub fn match_text<'a>(text: &str, categories: &'a [Category]) -> Option<&'a str> {
    if text.is_empty() {
        return None;
    }
    let haystack = text.to_lowercase();
    categories
        .iter()
        .find(|category| {
            category
                .effective_patterns()
                .iter()
                .any(|pattern| pattern.matches_lowercase(&haystack))
        })
        .map(|category| category.label.as_str())
}

/// Match the filename first, then the content, else `"unknown"`
///
/// `content` is `None` when the caller has not extracted text yet.
pub fn match_document(filename: &str, content: Option<&str>, categories: &[Category]) -> String {
    match_text(filename, categories)
        .or_else(|| content.and_then(|text| match_text(text, categories)))
        .unwrap_or(UNKNOWN_LABEL)
        .to_string()
}
