//! Shared fixtures for classification tests

#![allow(dead_code)]

use docsort_core::{Category, CategoryRegistry, KeywordPattern, TextExtractor};
use docsort_extract::{ExtractorConfig, ImageKind, OcrEngine};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::io::Cursor;
use std::sync::Arc;

/// OCR engine returning fixed text for any image
pub struct CannedOcr(pub String);

impl OcrEngine for CannedOcr {
    fn recognize(&self, _image: &[u8], _kind: ImageKind) -> docsort_extract::Result<String> {
        Ok(self.0.clone())
    }
}

pub fn extractor_with_ocr(text: &str) -> TextExtractor {
    TextExtractor::new(ExtractorConfig::default()).with_ocr(Arc::new(CannedOcr(text.to_string())))
}

pub fn categories() -> Vec<Category> {
    vec![
        Category::from_field_names("invoice", ["Invoice Number", "Total Due"])
            .with_pattern(KeywordPattern::parse("invoice")),
        Category::from_field_names("bank_statement", ["Account Holder", "Account Balance"])
            .with_pattern(KeywordPattern::parse("bank statement")),
        Category::from_field_names("drivers_license", ["Name", "License Number"]),
    ]
}

pub fn registry() -> CategoryRegistry {
    CategoryRegistry::in_memory(categories())
}

/// Single-page PDF drawing `text` with a base font
pub fn pdf(text: &str) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
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

pub fn jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([250, 250, 250]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}
