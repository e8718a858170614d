use serde::Serialize;

use crate::utils::hashtags;

/// Unique identifier for a document's postings in the index
pub type DocId = u32;

/// A trigram is a 3-byte sequence stored as u32 (only lower 24 bits used)
pub type Trigram = u32;

/// File extension of documents in the corpus
pub const DOCUMENT_EXTENSION: &str = "md";

/// File extension of templates watched next to the corpus
pub const TEMPLATE_EXTENSION: &str = "html";

/// A page of the corpus as the index sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Slash-separated path relative to the corpus root, without extension
    pub name: String,
    pub title: String,
    pub body: String,
    pub hashtags: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        let name = name.into();
        let body = body.into();
        Self {
            title: title_of(&name, &body),
            hashtags: hashtags(&body),
            name,
            body,
        }
    }
}

/// Derive a page title: a leading `# Heading` line wins, otherwise the name.
pub fn title_of(name: &str, body: &str) -> String {
    let first = body.lines().next().unwrap_or("");
    match first.strip_prefix("# ") {
        Some(heading) if !heading.trim().is_empty() => heading.trim().to_string(),
        _ => name.to_string(),
    }
}

/// Convert 3 bytes to a trigram
#[inline]
pub fn bytes_to_trigram(b0: u8, b1: u8, b2: u8) -> Trigram {
    ((b0 as u32) << 16) | ((b1 as u32) << 8) | (b2 as u32)
}
