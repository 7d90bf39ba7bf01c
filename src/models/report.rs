use serde::{Deserialize, Serialize};

use super::enums::MimeClass;

/// A user-supplied file queued for OCR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Position within its report's batch, starting at 0.
    pub ordinal: usize,
    pub name: String,
    pub mime_class: MimeClass,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(ordinal: usize, name: &str, mime_class: MimeClass, bytes: Vec<u8>) -> Self {
        Self {
            ordinal,
            name: name.to_string(),
            mime_class,
            bytes,
        }
    }
}

/// One entry of a report's intake batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportInput {
    Text { content: String },
    File(SourceFile),
}

impl ReportInput {
    pub fn text(content: &str) -> Self {
        Self::Text {
            content: content.to_string(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

/// Whitespace-separated token count, used for report summaries.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
