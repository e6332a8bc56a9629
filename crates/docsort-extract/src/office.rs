//! Word and spreadsheet text extraction

use crate::error::{ExtractError, Result};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use std::io::Cursor;

/// Text of every non-empty paragraph, in document order, one per line
pub fn extract_docx(bytes: &[u8]) -> Result<String> {
    let docx = read_docx(bytes).map_err(|e| ExtractError::corrupt("docx", e))?;

    let mut paragraphs = Vec::new();
    for child in docx.document.children.iter() {
        if let DocumentChild::Paragraph(para) = child {
            let mut text = String::new();
            push_runs(&para.children, &mut text);
            if !text.trim().is_empty() {
                paragraphs.push(text);
            }
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Run text, descending into hyperlinks
fn push_runs(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in run.children.iter() {
                    if let RunChild::Text(t) = run_child {
                        text.push_str(&t.text);
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_runs(&link.children, text),
            _ => {}
        }
    }
}

/// Every sheet, every row: non-empty cells joined by a space, one row per line
pub fn extract_xlsx(bytes: &[u8]) -> Result<String> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| ExtractError::corrupt("xlsx", e))?;

    let mut lines = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| ExtractError::corrupt("xlsx", format!("sheet {}: {}", sheet, e)))?;

        for row in range.rows() {
            let cells: Vec<String> = row
                .iter()
                .filter(|cell| !matches!(cell, Data::Empty))
                .map(|cell| cell.to_string())
                .filter(|value| !value.trim().is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" "));
            }
        }
    }

    Ok(lines.join("\n"))
}
