use serde::{Deserialize, Serialize};

/// An uploaded file reduced to its name and extracted plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub text: String,
}

impl Document {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            text: text.into(),
        }
    }

    /// True when extraction produced nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Inserts `doc` keeping upload order; a repeated filename replaces the earlier
/// text in place.
pub fn upsert_document(docs: &mut Vec<Document>, doc: Document) {
    match docs.iter_mut().find(|d| d.filename == doc.filename) {
        Some(existing) => existing.text = doc.text,
        None => docs.push(doc),
    }
}
