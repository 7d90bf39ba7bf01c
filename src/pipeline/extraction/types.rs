use serde::{Deserialize, Serialize};

use crate::config;
use crate::models::{word_count, ReportType};

/// Text recovered from one page of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionUnit {
    pub source_ordinal: usize,
    pub source_name: String,
    /// "File {n}" for multi-file batches, "Page {n}" otherwise.
    pub label: String,
    pub text: String,
    pub processing_time_ms: f64,
    pub engine_id: String,
}

/// Per-report intake output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedText {
    pub full_text: String,
    pub unit_count: usize,
    pub file_count: usize,
    pub word_count: usize,
    pub total_processing_time_ms: f64,
    pub engine_id: String,
}

impl CombinedText {
    /// Pasted text: one unit, no OCR time.
    pub fn direct(text: &str) -> Self {
        Self {
            full_text: text.to_string(),
            unit_count: 1,
            file_count: 0,
            word_count: word_count(text),
            total_processing_time_ms: 0.0,
            engine_id: config::DIRECT_TEXT_ENGINE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }
}

/// Per-run OCR options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub engine: String,
    pub use_gpu: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            engine: config::DEFAULT_OCR_ENGINE.to_string(),
            use_gpu: true,
        }
    }
}

/// Progress of a report's OCR batch.
///
/// `current` is the 1-based file about to be sent; the idle value is
/// `{0, 0, None}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeProgress {
    pub current: usize,
    pub total: usize,
    pub report_type: Option<ReportType>,
}

impl IntakeProgress {
    pub fn idle() -> Self {
        Self {
            current: 0,
            total: 0,
            report_type: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.total == 0
    }

    /// Status line for the progress indicator.
    pub fn message(&self) -> String {
        match self.report_type {
            Some(rt) if self.total > 1 => {
                format!("Processing {} {}/{}...", rt.tag(), self.current, self.total)
            }
            _ => "Processing...".to_string(),
        }
    }
}

// ──────────────────────────────────────────────
// OCR service wire types
// ──────────────────────────────────────────────

/// One page of OCR output as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub engine_used: Option<String>,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

/// Body of `POST /ocr/file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub documents: Vec<OcrPage>,
    #[serde(default)]
    pub total_processing_time: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful OCR of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrFileResult {
    pub pages: Vec<OcrPage>,
    pub total_processing_time_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_text_is_single_unit_without_ocr_time() {
        let combined = CombinedText::direct("Appendectomy performed");
        assert_eq!(combined.unit_count, 1);
        assert_eq!(combined.word_count, 2);
        assert_eq!(combined.total_processing_time_ms, 0.0);
        assert_eq!(combined.engine_id, "direct-text");
    }

    #[test]
    fn progress_message_names_report_for_multi_file_batches() {
        let progress = IntakeProgress {
            current: 2,
            total: 3,
            report_type: Some(ReportType::Op),
        };
        assert_eq!(progress.message(), "Processing OP 2/3...");
        assert_eq!(IntakeProgress::idle().message(), "Processing...");
        assert!(IntakeProgress::idle().is_idle());
    }

    #[test]
    fn ocr_response_tolerates_missing_fields() {
        let resp: OcrResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.documents.is_empty());
        assert!(resp.error.is_none());
    }

    #[test]
    fn ocr_response_parses_pages() {
        let json = r#"{
            "success": true,
            "documents": [{"full_text": "Page one", "engine_used": "paddle", "processing_time": 120.5}],
            "total_processing_time": 130.0
        }"#;
        let resp: OcrResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.documents[0].engine_used.as_deref(), Some("paddle"));
        assert_eq!(resp.total_processing_time, Some(130.0));
    }
}
