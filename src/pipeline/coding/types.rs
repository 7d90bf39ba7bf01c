use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::models::{AiSummary, CodeSet, ContentClass, ReportType, SourceFile};

// ──────────────────────────────────────────────
// Extraction request
// ──────────────────────────────────────────────

/// A source document forwarded to the extraction service for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Base64 file content, or the raw text for pasted reports.
    pub raw: String,
    #[serde(rename = "type")]
    pub content_class: ContentClass,
    pub filename: String,
}

impl UploadedFile {
    pub fn from_source(file: &SourceFile) -> Self {
        Self {
            raw: BASE64.encode(&file.bytes),
            content_class: file.mime_class.content_class(),
            filename: file.name.clone(),
        }
    }

    /// Pasted report text, uploaded as `hp_text.txt` / `op_text.txt`.
    pub fn pasted_text(report_type: ReportType, text: &str) -> Self {
        Self {
            raw: text.to_string(),
            content_class: ContentClass::Text,
            filename: format!("{}_text.txt", report_type.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub hp_text: String,
    pub op_text: String,
    pub upload_documents: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp_files: Option<Vec<UploadedFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_files: Option<Vec<UploadedFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_type: Option<String>,
}

impl ExtractionRequest {
    pub fn new(hp_text: &str, op_text: &str, upload_documents: bool) -> Self {
        Self {
            hp_text: hp_text.to_string(),
            op_text: op_text.to_string(),
            upload_documents,
            ..Default::default()
        }
    }

    /// Attach a report's source documents when uploads are enabled.
    ///
    /// Files win over text; a batch of more than one file is typed
    /// `multi-image`. Without files, non-empty text goes up as a text file.
    pub fn attach(mut self, report_type: ReportType, files: &[SourceFile], text: &str) -> Self {
        if !self.upload_documents {
            return self;
        }

        let (uploads, kind) = if !files.is_empty() {
            let kind = if files.len() == 1 {
                files[0].mime_class.content_class().as_str().to_string()
            } else {
                "multi-image".to_string()
            };
            (files.iter().map(UploadedFile::from_source).collect(), kind)
        } else if !text.is_empty() {
            (
                vec![UploadedFile::pasted_text(report_type, text)],
                ContentClass::Text.as_str().to_string(),
            )
        } else {
            return self;
        };

        match report_type {
            ReportType::Hp => {
                self.hp_files = Some(uploads);
                self.hp_type = Some(kind);
            }
            ReportType::Op => {
                self.op_files = Some(uploads);
                self.op_type = Some(kind);
            }
        }
        self
    }

    pub fn has_text(&self) -> bool {
        !self.hp_text.is_empty() || !self.op_text.is_empty()
    }
}

// ──────────────────────────────────────────────
// Extraction response
// ──────────────────────────────────────────────

/// Codes proposed by the extraction service, with their correlation keys.
///
/// Storage fields the service adds (document URLs, object keys, file counts)
/// are kept verbatim in `extras`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedCodes {
    #[serde(default)]
    pub document_key: Option<String>,
    #[serde(default)]
    pub chart_number: Option<String>,
    #[serde(default)]
    pub admit_dx: Option<String>,
    #[serde(default)]
    pub pdx: Option<String>,
    #[serde(default)]
    pub sdx: Option<Vec<String>>,
    #[serde(default)]
    pub cpt: Option<Vec<String>>,
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(flatten)]
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl ExtractedCodes {
    /// Code set as returned; missing values become empty.
    pub fn code_set(&self) -> CodeSet {
        CodeSet {
            admit_dx: self.admit_dx.clone().unwrap_or_default(),
            pdx: self.pdx.clone().unwrap_or_default(),
            sdx: self.sdx.clone().unwrap_or_default(),
            cpt: self.cpt.clone().unwrap_or_default(),
            modifier: self.modifier.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub extracted: Option<ExtractedCodes>,
    #[serde(default)]
    pub ai_summary: Option<AiSummary>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A successful extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub codes: ExtractedCodes,
    pub ai_summary: AiSummary,
}

// ──────────────────────────────────────────────
// Submission response
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldAccuracy {
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub additions: Vec<String>,
    #[serde(default)]
    pub removals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyDetails {
    #[serde(default)]
    pub sdx: FieldAccuracy,
    #[serde(default)]
    pub cpt: FieldAccuracy,
}

/// Score computed by the submission service. Display only; never recomputed
/// locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub details: AccuracyDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyBand {
    Excellent,
    Good,
    Significant,
}

impl AccuracyBand {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent match!",
            Self::Good => "Good match with some corrections",
            Self::Significant => "Significant corrections made",
        }
    }
}

impl AccuracySummary {
    pub fn matched_total(&self) -> usize {
        self.details.sdx.matches.len() + self.details.cpt.matches.len()
    }

    pub fn added_total(&self) -> usize {
        self.details.sdx.additions.len() + self.details.cpt.additions.len()
    }

    pub fn removed_total(&self) -> usize {
        self.details.sdx.removals.len() + self.details.cpt.removals.len()
    }

    pub fn band(&self) -> AccuracyBand {
        if self.percentage >= 90.0 {
            AccuracyBand::Excellent
        } else if self.percentage >= 70.0 {
            AccuracyBand::Good
        } else {
            AccuracyBand::Significant
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub accuracy: Option<AccuracySummary>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MimeClass;

    fn image(ordinal: usize, name: &str) -> SourceFile {
        SourceFile::new(ordinal, name, MimeClass::Image, b"img".to_vec())
    }

    #[test]
    fn request_without_uploads_carries_only_text() {
        let request = ExtractionRequest::new("history", "", false)
            .attach(ReportType::Hp, &[image(0, "a.png")], "history");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["hp_text"], "history");
        assert_eq!(json["upload_documents"], false);
        assert!(json.get("hp_files").is_none());
        assert!(json.get("hp_type").is_none());
    }

    #[test]
    fn several_files_upload_as_multi_image() {
        let request = ExtractionRequest::new("ocr text", "", true)
            .attach(ReportType::Hp, &[image(0, "a.png"), image(1, "b.png")], "ocr text");
        let files = request.hp_files.as_ref().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].raw, "aW1n");
        assert_eq!(files[1].filename, "b.png");
        assert_eq!(request.hp_type.as_deref(), Some("multi-image"));
    }

    #[test]
    fn single_pdf_uploads_with_its_class() {
        let pdf = SourceFile::new(0, "op.pdf", MimeClass::Pdf, vec![1]);
        let request = ExtractionRequest::new("", "op", true).attach(ReportType::Op, &[pdf], "op");
        assert_eq!(request.op_type.as_deref(), Some("pdf"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["op_files"][0]["type"], "pdf");
    }

    #[test]
    fn pasted_text_uploads_as_text_file() {
        let request = ExtractionRequest::new("", "Op note", true).attach(ReportType::Op, &[], "Op note");
        let files = request.op_files.unwrap();
        assert_eq!(files[0].filename, "op_text.txt");
        assert_eq!(files[0].raw, "Op note");
        assert_eq!(files[0].content_class, ContentClass::Text);
        assert_eq!(request.op_type.as_deref(), Some("text"));
    }

    #[test]
    fn empty_report_attaches_nothing() {
        let request = ExtractionRequest::new("", "", true).attach(ReportType::Hp, &[], "");
        assert!(request.hp_files.is_none());
        assert!(!request.has_text());
    }

    #[test]
    fn extraction_response_keeps_storage_fields() {
        let body = r#"{
            "success": true,
            "extracted": {
                "document_key": "doc-7f3",
                "chart_number": "CH-1029",
                "admit_dx": "r07.9",
                "pdx": null,
                "sdx": ["E11.9", "I10"],
                "hp_s3_urls": ["https://bucket/hp-1.png"],
                "op_file_count": 2
            },
            "ai_summary": {"hp": {"assessment": "NSTEMI"}, "op": null}
        }"#;
        let response: ExtractionResponse = serde_json::from_str(body).unwrap();
        let extracted = response.extracted.unwrap();
        assert_eq!(extracted.document_key.as_deref(), Some("doc-7f3"));
        assert_eq!(extracted.extras["op_file_count"], 2);
        assert!(extracted.extras.contains_key("hp_s3_urls"));
        assert!(!extracted.extras.contains_key("sdx"));

        let codes = extracted.code_set();
        assert_eq!(codes.admit_dx, "r07.9");
        assert_eq!(codes.pdx, "");
        assert_eq!(codes.sdx.len(), 2);
        assert!(codes.cpt.is_empty());
    }

    #[test]
    fn accuracy_totals_and_bands() {
        let body = r#"{
            "percentage": 83.3,
            "details": {
                "sdx": {"matches": ["I10"], "additions": ["E78.5"], "removals": []},
                "cpt": {"matches": ["93458", "93000"], "removals": ["36415"]}
            }
        }"#;
        let accuracy: AccuracySummary = serde_json::from_str(body).unwrap();
        assert_eq!(accuracy.matched_total(), 3);
        assert_eq!(accuracy.added_total(), 1);
        assert_eq!(accuracy.removed_total(), 1);
        assert_eq!(accuracy.band(), AccuracyBand::Good);

        let perfect = AccuracySummary { percentage: 90.0, ..Default::default() };
        assert_eq!(perfect.band(), AccuracyBand::Excellent);
        let poor = AccuracySummary { percentage: 69.9, ..Default::default() };
        assert_eq!(poor.band().message(), "Significant corrections made");
    }
}
