//! Text Extractor — turns an uploaded PDF, DOCX or TXT file into plain text.
//!
//! Extraction never fails: an unreadable or unsupported file yields an empty
//! string, which callers surface as a warning rather than an error.

use std::path::Path;

use bytes::Bytes;
use docx_rs::{read_docx, DocumentChild};
use serde::Serialize;
use tracing::{debug, warn};

/// File formats the extractor understands, chosen by filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
    Unsupported,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("docx") | Some("doc") => DocumentKind::Docx,
            Some("txt") => DocumentKind::Text,
            _ => DocumentKind::Unsupported,
        }
    }
}

/// Extracts plain text from raw file bytes. Returns an empty string on any failure.
pub fn extract_text(filename: &str, bytes: &[u8]) -> String {
    let kind = DocumentKind::from_filename(filename);
    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes).unwrap_or_else(|e| {
            warn!("PDF extraction failed for '{filename}': {e}");
            String::new()
        }),
        DocumentKind::Docx => extract_docx(bytes).unwrap_or_else(|e| {
            warn!("DOCX extraction failed for '{filename}': {e}");
            String::new()
        }),
        DocumentKind::Text => String::from_utf8_lossy(bytes).into_owned(),
        DocumentKind::Unsupported => {
            warn!("Unsupported file type for '{filename}'");
            String::new()
        }
    };

    debug!("Extracted {} chars from '{filename}' ({kind:?})", text.len());
    text
}

/// Runs `extract_text` on the blocking pool. Parser panics also degrade to empty text.
pub async fn extract_text_blocking(filename: String, bytes: Bytes) -> String {
    let name = filename.clone();
    match tokio::task::spawn_blocking(move || extract_text(&filename, &bytes)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Text extraction for '{name}' aborted: {e}");
            String::new()
        }
    }
}

/// Joins the text of top-level paragraphs with newlines. Tables are skipped.
fn extract_docx(bytes: &[u8]) -> Result<String, docx_rs::ReaderError> {
    let docx = read_docx(bytes)?;
    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(p.raw_text()),
            _ => None,
        })
        .collect();
    Ok(paragraphs.join("\n"))
}
